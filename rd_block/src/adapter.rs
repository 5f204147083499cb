//! Mapping between the UI metric list and the argument list.

use crate::ids::{next_unique, IdSource};
use rd_types::{Metric, MetricUi};

/// Drop the UI-only fields, keeping order and length.
pub fn to_args(metrics: &[MetricUi]) -> Vec<Metric> {
    metrics.iter().map(|m| m.metric.clone()).collect()
}

/// Decorate an argument list that has no UI identifiers. Every entry gets a
/// fresh id and starts collapsed; whatever UI state existed before is lost.
pub fn to_ui(metrics: &[Metric], ids: &dyn IdSource) -> Vec<MetricUi> {
    let mut decorated = Vec::with_capacity(metrics.len());
    for metric in metrics {
        let id = next_unique(ids, &decorated);
        decorated.push(MetricUi::new(id, metric.clone(), false));
    }
    decorated
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ids::{MetricIdGenerator, SequentialIds};
    use proptest::prelude::*;
    use rd_types::{
        DistanceType, Downsampling, DownsamplingType, IntersectionType, ValueChooser,
    };
    use std::collections::HashSet;

    pub(crate) fn arb_metric() -> impl Strategy<Value = Metric> {
        (
            proptest::option::of(proptest::sample::select(DistanceType::all().to_vec())),
            proptest::option::of(proptest::sample::select(IntersectionType::all().to_vec())),
            proptest::sample::select(DownsamplingType::all().to_vec()),
            proptest::sample::select(ValueChooser::all().to_vec()),
            proptest::option::of(0..10_000_000u64),
        )
            .prop_map(|(kind, intersection, ds_kind, chooser, n)| {
                Metric::new(
                    kind,
                    intersection,
                    Downsampling {
                        kind: ds_kind,
                        value_chooser: chooser,
                        n,
                    },
                )
            })
    }

    #[test]
    fn test_to_ui_defaults() {
        let metrics = vec![
            Metric::builtin(DistanceType::D),
            Metric::new(None, None, Downsampling::none_auto()),
        ];
        let ui = to_ui(&metrics, &SequentialIds::default());
        assert_eq!(ui.len(), 2);
        assert_eq!(ui[0].id.as_str(), "metric-1");
        assert_eq!(ui[1].id.as_str(), "metric-2");
        assert!(ui.iter().all(|m| !m.is_expanded));
    }

    proptest! {
        #[test]
        fn test_args_ui_roundtrip(metrics in proptest::collection::vec(arb_metric(), 0..20)) {
            let ui = to_ui(&metrics, &MetricIdGenerator::default());
            prop_assert_eq!(to_args(&ui), metrics);
        }

        #[test]
        fn test_to_ui_ids_unique(metrics in proptest::collection::vec(arb_metric(), 0..20)) {
            let ui = to_ui(&metrics, &MetricIdGenerator::default());
            let ids: HashSet<_> = ui.iter().map(|m| &m.id).collect();
            prop_assert_eq!(ids.len(), metrics.len());
        }
    }
}
