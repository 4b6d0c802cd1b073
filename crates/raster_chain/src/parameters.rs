use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr, VariantNames};
use tracing::debug;

use crate::error::{ChainError, Result};

#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParameterDataType {
    /// Upstream raster, opaque to the receiving function
    Raster,
    String,
    Numeric,
    Boolean,
}

/// Reference to a raster input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RasterRef {
    /// Output of the previous step (or the chain source for the first step)
    Upstream,
}

/// A resolved parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ParameterValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Raster(RasterRef),
}

impl ParameterValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raster(RasterRef::Upstream) => write!(f, "<upstream>"),
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Declared input of a raster function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterInfo {
    pub name: String,
    pub data_type: ParameterDataType,
    pub required: bool,
    pub default: Option<ParameterValue>,
    pub display_name: String,
    pub description: String,
}

impl ParameterInfo {
    pub fn raster(name: &str, display_name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: ParameterDataType::Raster,
            required: true,
            default: None,
            display_name: display_name.to_string(),
            description: description.to_string(),
        }
    }

    pub fn optional_string(name: &str, default: &str, display_name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: ParameterDataType::String,
            required: false,
            default: Some(ParameterValue::String(default.to_string())),
            display_name: display_name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Parameter values keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ParameterValues(BTreeMap<String, ParameterValue>);

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<ParameterValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ParameterValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.0.get(name)
    }

    /// Textual form of a value, whatever its type
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(ToString::to_string)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.0.iter()
    }

    /// Resolve supplied values against a declaration.
    ///
    /// Declared defaults fill in whatever was not supplied and keys the
    /// declaration does not know are dropped. Raster inputs that were not
    /// supplied are bound to the upstream raster.
    pub fn resolve(function: &str, declared: &[ParameterInfo], supplied: &ParameterValues) -> Result<Self> {
        for name in supplied.0.keys() {
            if !declared.iter().any(|p| &p.name == name) {
                debug!(function, parameter = %name, "ignoring undeclared parameter");
            }
        }

        let mut resolved = ParameterValues::new();
        for info in declared {
            let value = supplied
                .get(&info.name)
                .cloned()
                .or_else(|| info.default.clone())
                .or_else(|| {
                    (info.data_type == ParameterDataType::Raster)
                        .then_some(ParameterValue::Raster(RasterRef::Upstream))
                });

            match value {
                Some(value) => {
                    resolved.0.insert(info.name.clone(), value);
                }
                None if info.required => {
                    return Err(ChainError::MissingParameter {
                        function: function.to_string(),
                        parameter: info.name.clone(),
                    });
                }
                None => {}
            }
        }
        Ok(resolved)
    }
}

impl FromIterator<(String, ParameterValue)> for ParameterValues {
    fn from_iter<I: IntoIterator<Item = (String, ParameterValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration() -> Vec<ParameterInfo> {
        vec![
            ParameterInfo::raster("raster", "Raster", "Input raster"),
            ParameterInfo::optional_string("value", "True", "Value", "Override value"),
            ParameterInfo {
                name: "threshold".to_string(),
                data_type: ParameterDataType::Numeric,
                required: true,
                default: None,
                display_name: "Threshold".to_string(),
                description: String::new(),
            },
        ]
    }

    #[test]
    fn test_resolve_fills_defaults_and_drops_unknown() {
        let supplied = ParameterValues::new()
            .with("threshold", ParameterValue::Number(2.0))
            .with("colour", "blue");

        let resolved = ParameterValues::resolve("test", &declaration(), &supplied)
            .expect("Should resolve");

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved.get("raster"), Some(&ParameterValue::Raster(RasterRef::Upstream)));
        assert_eq!(resolved.text("value").as_deref(), Some("True"));
        assert_eq!(resolved.get("threshold"), Some(&ParameterValue::Number(2.0)));
        assert!(resolved.get("colour").is_none());
    }

    #[test]
    fn test_resolve_missing_required() {
        let err = ParameterValues::resolve("test", &declaration(), &ParameterValues::new())
            .expect_err("Threshold has no default");
        assert!(matches!(err, ChainError::MissingParameter { ref parameter, .. } if parameter == "threshold"));
    }

    #[test]
    fn test_untagged_values_from_json() {
        let values: ParameterValues = serde_json::from_str(r#"{"a": "x", "b": 1.5, "c": true}"#)
            .expect("Should parse");
        assert_eq!(values.get("a").and_then(ParameterValue::as_str), Some("x"));
        assert_eq!(values.text("b").as_deref(), Some("1.5"));
        assert_eq!(values.text("c").as_deref(), Some("true"));
    }
}
