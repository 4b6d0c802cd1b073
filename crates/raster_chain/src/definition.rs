use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ChainError, Result},
    functions::FunctionKind,
    parameters::ParameterValues,
    pipeline::FunctionChain,
    types::RasterSource,
};

/// One step of a chain definition
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StepDefinition {
    /// Registered function name, e.g. `key_metadata_override`
    pub function: String,
    pub description: Option<String>,
    /// Arguments by parameter name; undeclared names are ignored
    #[serde(default)]
    pub args: ParameterValues,
}

/// Serialisable description of a raster function chain
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ChainDefinition {
    pub name: Option<String>,
    #[serde(default)]
    pub source: RasterSource,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

impl ChainDefinition {
    /// Get the JSON schema for chain definitions
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ChainDefinition)
    }

    /// Instantiate and configure every step
    pub fn build(&self) -> Result<FunctionChain> {
        let mut chain = FunctionChain::new(self.source.clone());
        for step in &self.steps {
            let kind = FunctionKind::from_name(&step.function)?;
            chain.push(kind.instantiate(), &step.args)?;
        }
        Ok(chain)
    }

    /// Load a chain definition from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a chain definition from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a chain definition from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load a chain definition from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ChainError::UnsupportedFileFormat),
        }
    }

    /// Convert to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Save to a file, format chosen by extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(ChainError::UnsupportedFileFormat),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }
}
