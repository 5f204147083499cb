//! Tolerant deserializers for payloads written by older versions of the block.

use log::warn;
use serde::de::Visitor;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum NumberOrStr {
    Number(u64),
    Str(String),
}

impl Display for NumberOrStr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberOrStr::Number(n) => write!(f, "{n}"),
            NumberOrStr::Str(s) => f.write_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for NumberOrStr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NumberOrStrVisitor;
        impl<'de> Visitor<'de> for NumberOrStrVisitor {
            type Value = NumberOrStr;
            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str("A number or string")
            }

            fn visit_u64<E>(self, id: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(NumberOrStr::Number(id))
            }

            fn visit_i64<E>(self, id: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(id)
                    .map(NumberOrStr::Number)
                    .map_err(|_| E::custom(format!("negative number {id}")))
            }

            fn visit_f64<E>(self, id: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                // Javascript clients write every number as a double.
                if id >= 0.0 && id.fract() == 0.0 && id <= u64::MAX as f64 {
                    Ok(NumberOrStr::Number(id as u64))
                } else {
                    Err(E::custom(format!("expected a whole number, found {id}")))
                }
            }

            fn visit_str<E>(self, id: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(NumberOrStr::Str(id.into()))
            }
        }
        deserializer.deserialize_any(NumberOrStrVisitor)
    }
}

/// Deserialize an optional field without ever failing: anything that is not
/// accepted by `T` is logged and read as `None`.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(err) => {
                warn!("ignoring unreadable value {value}: {err}");
                None
            }
        },
    })
}

/// Like [`lenient`], for enums parsed from their string literal.
pub fn lenient_variant<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match s.parse() {
            Ok(v) => Some(v),
            Err(err) => {
                warn!("{err}; treating as unset");
                None
            }
        },
        Some(other) => {
            warn!("expected a string, found {other}; treating as unset");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{DistanceType, ValueChooser};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_variant")]
        kind: Option<DistanceType>,
        #[serde(default, deserialize_with = "lenient")]
        id: Option<NumberOrStr>,
        #[serde(default, deserialize_with = "lenient_variant")]
        chooser: Option<ValueChooser>,
    }

    #[test]
    fn test_lenient_fields() {
        let probe: Probe =
            serde_json::from_str(r#"{"kind": "F9", "id": 3.0, "chooser": 7}"#).unwrap();
        assert_eq!(probe.kind, None);
        assert_eq!(probe.id, Some(NumberOrStr::Number(3)));
        assert_eq!(probe.chooser, None);

        let probe: Probe = serde_json::from_str(r#"{"kind": "jaccard", "id": 2.5}"#).unwrap();
        assert_eq!(probe.kind, Some(DistanceType::Jaccard));
        assert_eq!(probe.id, None);

        let probe: Probe = serde_json::from_str(r#"{"id": "metric-17"}"#).unwrap();
        assert_eq!(probe.kind, None);
        assert_eq!(probe.id, Some(NumberOrStr::Str("metric-17".into())));
    }
}
