pub mod key_metadata;

pub use key_metadata::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::{error::{ChainError, Result}, traits::RasterFunction};

/// Raster functions that can be named in a chain definition
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FunctionKind {
    /// Override whole-raster key properties and band names
    KeyMetadataOverride,
}

impl FunctionKind {
    /// Get a list of all available function names
    pub fn function_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Look up a function by name
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| ChainError::UnknownFunction(name.to_string()))
    }

    /// Create a fresh, unconfigured instance
    pub fn instantiate(self) -> Box<dyn RasterFunction> {
        match self {
            Self::KeyMetadataOverride => Box::new(KeyMetadataOverride::new()),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::KeyMetadataOverride => "Override a whole-raster key property and band display names",
        }
    }
}
