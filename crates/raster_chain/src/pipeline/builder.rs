use crate::{
    error::Result,
    functions::{FunctionKind, KeyMetadataOverride},
    parameters::ParameterValues,
    pipeline::FunctionChain,
    traits::RasterFunction,
    types::RasterSource,
};

/// Builder for creating function chains with a fluent API
pub struct ChainBuilder {
    source: RasterSource,
    steps: Vec<(Box<dyn RasterFunction>, ParameterValues)>,
}

impl ChainBuilder {
    /// Create a new chain builder
    pub fn new() -> Self {
        Self {
            source: RasterSource::default(),
            steps: Vec::new(),
        }
    }

    /// Set the raster the chain reads from
    pub fn source(mut self, source: RasterSource) -> Self {
        self.source = source;
        self
    }

    /// Add a function step with its arguments
    pub fn add_function<F>(mut self, function: F, args: ParameterValues) -> Self
    where
        F: RasterFunction + 'static,
    {
        self.steps.push((Box::new(function), args));
        self
    }

    /// Add a registered function by kind
    pub fn add_kind(mut self, kind: FunctionKind, args: ParameterValues) -> Self {
        self.steps.push((kind.instantiate(), args));
        self
    }

    /// Add a key metadata override as the next step
    pub fn with_key_metadata_override(self, property: &str, value: &str, bands: &str) -> Self {
        let args = ParameterValues::new()
            .with("property", property)
            .with("value", value)
            .with("bands", bands);
        self.add_function(KeyMetadataOverride::new(), args)
    }

    /// Build the chain, configuring every step in order
    pub fn build(self) -> Result<FunctionChain> {
        let mut chain = FunctionChain::new(self.source);
        for (function, args) in self.steps {
            chain.push(function, &args)?;
        }
        Ok(chain)
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RasterInfo;
    use serde_json::json;

    #[test]
    fn test_builder_configures_steps() {
        let mut chain = FunctionChain::builder()
            .source(RasterSource::new(RasterInfo { band_count: 2, width: 16, height: 16 }))
            .with_key_metadata_override("Category", "Urban", "North,South")
            .build()
            .expect("Should build");

        assert_eq!(chain.len(), 1);
        assert_eq!(chain.raster_info().band_count, 2);
        assert_eq!(chain.key_metadata(-1).get("Category"), Some(&json!("Urban")));
        assert_eq!(chain.key_metadata(1).get("bandname"), Some(&json!("South")));
    }

    #[test]
    fn test_builder_by_kind_uses_defaults() {
        let mut chain = ChainBuilder::new()
            .add_kind(FunctionKind::KeyMetadataOverride, ParameterValues::new().with("property", "IsWeightedOverlay"))
            .build()
            .expect("Should build");

        assert_eq!(chain.steps()[0].args().text("value").as_deref(), Some("True"));
        assert_eq!(chain.key_metadata(-1).get("IsWeightedOverlay"), Some(&json!("True")));
    }
}
