//! Specs of the data columns exchanged with the result pool and the compute engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const IS_ABUNDANCE: &str = "pl7.app/isAbundance";
pub const ABUNDANCE_NORMALIZED: &str = "pl7.app/abundance/normalized";
pub const ABUNDANCE_IS_PRIMARY: &str = "pl7.app/abundance/isPrimary";
pub const LABEL: &str = "pl7.app/label";

make_enum! {
    name: ValueType,
    variants: [
        (Int, "Int"),
        (Long, "Long"),
        (Float, "Float"),
        (Double, "Double"),
        (String, "String"),
        (Bytes, "Bytes"),
    ],
    const_var_name: VALUE_TYPES,
}

impl ValueType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueType::Int | ValueType::Long | ValueType::Float | ValueType::Double
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PColumnSpec {
    pub name: String,
    #[serde(rename = "valueType")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PColumnSpec {
    pub fn new(name: impl ToString, value_type: ValueType) -> Self {
        PColumnSpec {
            name: name.to_string(),
            value_type,
            annotations: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    pub fn with_annotation(mut self, key: impl ToString, value: impl ToString) -> Self {
        self.annotations.insert(key.to_string(), value.to_string());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// The `pl7.app/label` annotation, or the column name when absent.
    pub fn label(&self) -> &str {
        self.annotation(LABEL).unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PColumnId(pub String);

impl fmt::Display for PColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.0.as_str())
    }
}

/// A column produced by the compute engine. Data stays on the engine side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PColumn {
    pub id: PColumnId,
    pub spec: PColumnSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PColumnIdAndSpec {
    #[serde(rename = "columnId")]
    pub column_id: PColumnId,
    pub spec: PColumnSpec,
}

impl From<&PColumn> for PColumnIdAndSpec {
    fn from(col: &PColumn) -> Self {
        PColumnIdAndSpec {
            column_id: col.id.clone(),
            spec: col.spec.clone(),
        }
    }
}
