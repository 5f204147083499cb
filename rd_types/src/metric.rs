//! Metric configuration as handed to the compute engine, and its UI-decorated form.

use serde::{Deserialize, Serialize};
use std::fmt;

make_enum! {
    /// Repertoire distance computed between every pair of samples.
    name: DistanceType,
    variants: [
        (F1, "F1"),
        (F2, "F2"),
        (D, "D"),
        (SharedClonotypes, "sharedClonotypes"),
        (Correlation, "correlation"),
        (Jaccard, "jaccard"),
    ],
    const_var_name: DISTANCE_TYPES,
}

impl DistanceType {
    /// Human readable name shown in metric pickers and legends.
    pub fn label(&self) -> &'static str {
        match self {
            DistanceType::F1 => "F1 metric",
            DistanceType::F2 => "F2 metric",
            DistanceType::D => "D metric",
            DistanceType::SharedClonotypes => "Shared Clonotypes",
            DistanceType::Correlation => "Correlation",
            DistanceType::Jaccard => "Jaccard",
        }
    }
}

make_enum! {
    /// Definition of clonotype identity used when intersecting two repertoires.
    name: IntersectionType,
    variants: [
        (CDR3ntVJ, "CDR3ntVJ"),
        (CDR3aaVJ, "CDR3aaVJ"),
        (CDR3nt, "CDR3nt"),
        (CDR3aa, "CDR3aa"),
    ],
    const_var_name: INTERSECTION_TYPES,
}

make_enum! {
    /// Normalization applied to each sample before distances are computed.
    name: DownsamplingType,
    variants: [
        (None, "none"),
        (Top, "top"),
        (CumTop, "cumtop"),
        (Hypergeometric, "hypergeometric"),
    ],
    const_var_name: DOWNSAMPLING_TYPES,
}

make_enum! {
    /// How the downsampling depth is picked.
    name: ValueChooser,
    variants: [
        (Min, "min"),
        (Fixed, "fixed"),
        (Max, "max"),
        (Auto, "auto"),
    ],
    const_var_name: VALUE_CHOOSERS,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Downsampling {
    #[serde(rename = "type")]
    pub kind: DownsamplingType,
    #[serde(rename = "valueChooser")]
    pub value_chooser: ValueChooser,
    /// Fixed depth in clonotypes. Stored depths are whole numbers; older
    /// payloads holding fractions are rounded when they are upgraded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u64>,
}

impl Downsampling {
    pub const fn new(kind: DownsamplingType, value_chooser: ValueChooser) -> Self {
        Downsampling {
            kind,
            value_chooser,
            n: None,
        }
    }

    /// Hypergeometric resampling to an automatically chosen depth.
    pub const fn hypergeometric_auto() -> Self {
        Downsampling::new(DownsamplingType::Hypergeometric, ValueChooser::Auto)
    }

    /// No downsampling. Used for freshly added metrics.
    pub const fn none_auto() -> Self {
        Downsampling::new(DownsamplingType::None, ValueChooser::Auto)
    }
}

/// One metric as consumed by the compute engine.
///
/// `kind` and `intersection` may be unset; such entries are passed through
/// untouched and it is up to the engine to reject them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DistanceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intersection: Option<IntersectionType>,
    pub downsampling: Downsampling,
}

impl Metric {
    pub fn new(
        kind: Option<DistanceType>,
        intersection: Option<IntersectionType>,
        downsampling: Downsampling,
    ) -> Self {
        Metric {
            kind,
            intersection,
            downsampling,
        }
    }

    /// A fully specified metric on the `CDR3ntVJ` intersection with
    /// hypergeometric/auto downsampling.
    pub fn builtin(kind: DistanceType) -> Self {
        Metric::new(
            Some(kind),
            Some(IntersectionType::CDR3ntVJ),
            Downsampling::hypergeometric_auto(),
        )
    }

    /// Name of the engine result column holding this metric, if both the
    /// distance and the intersection are set.
    pub fn column_name(&self) -> Option<String> {
        Some(format!("{}_{}", self.kind?, self.intersection?))
    }
}

/// Stable identifier of a metric in the editable list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(String);

impl MetricId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.0.as_str())
    }
}

impl From<String> for MetricId {
    fn from(v: String) -> Self {
        MetricId(v)
    }
}

impl From<&str> for MetricId {
    fn from(v: &str) -> Self {
        MetricId(v.to_string())
    }
}

impl From<MetricId> for String {
    fn from(v: MetricId) -> Self {
        v.0
    }
}

/// A metric as edited in the UI. This list is the source of truth; the
/// argument list is derived from it by dropping `id` and `is_expanded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricUi {
    pub id: MetricId,
    #[serde(flatten)]
    pub metric: Metric,
    #[serde(rename = "isExpanded", default)]
    pub is_expanded: bool,
}

impl MetricUi {
    pub fn new(id: MetricId, metric: Metric, is_expanded: bool) -> Self {
        MetricUi {
            id,
            metric,
            is_expanded,
        }
    }
}
