pub mod builder;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    error::{ChainError, Result},
    parameters::ParameterValues,
    traits::RasterFunction,
    types::{KeyMetadata, MetadataScope, PixelBlock, RasterInfo, RasterSource},
};

/// One configured function in a chain, with its own key metadata cache
pub struct ChainStep {
    function: Box<dyn RasterFunction>,
    args: ParameterValues,
    info: RasterInfo,
    key_metadata: HashMap<MetadataScope, KeyMetadata>,
}

impl ChainStep {
    pub fn function(&self) -> &dyn RasterFunction {
        self.function.as_ref()
    }

    /// Resolved arguments the step was last configured with
    pub fn args(&self) -> &ParameterValues {
        &self.args
    }

    /// Raster info this step produces
    pub fn info(&self) -> RasterInfo {
        self.info
    }

    pub fn cached_scopes(&self) -> usize {
        self.key_metadata.len()
    }
}

/// A lazily evaluated chain of raster functions over a source raster.
///
/// Each chain owns its function instances. Steps later in the chain are the
/// parents of earlier ones.
pub struct FunctionChain {
    source: RasterSource,
    steps: Vec<ChainStep>,
}

impl FunctionChain {
    /// Create a new chain builder
    pub fn builder() -> builder::ChainBuilder {
        builder::ChainBuilder::new()
    }

    pub fn new(source: RasterSource) -> Self {
        Self {
            source,
            steps: Vec::new(),
        }
    }

    pub fn source(&self) -> &RasterSource {
        &self.source
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append a function and configure it against the current chain output
    pub fn push(&mut self, mut function: Box<dyn RasterFunction>, args: &ParameterValues) -> Result<()> {
        let args = ParameterValues::resolve(function.name(), &function.parameters(), args)?;
        let info = function.update_raster_info(&args, self.raster_info())?;
        debug!(function = function.name(), step = self.steps.len(), "added chain step");

        self.steps.push(ChainStep {
            function,
            args,
            info,
            key_metadata: HashMap::new(),
        });
        Ok(())
    }

    /// Raster info at the end of the chain
    pub fn raster_info(&self) -> RasterInfo {
        self.steps.last().map(|s| s.info).unwrap_or(self.source.info)
    }

    /// Reconfigure a step with new arguments.
    ///
    /// The step's own cache is always dropped. Parents drop theirs when the
    /// step declares that it invalidates key properties. If the step or any
    /// parent rejects the new shape the chain keeps its previous state.
    pub fn reconfigure(&mut self, index: usize, args: &ParameterValues) -> Result<()> {
        let len = self.steps.len();
        if index >= len {
            return Err(ChainError::StepOutOfRange { index, len });
        }

        let input = self.input_info(index);
        let step = &self.steps[index];
        let resolved = ParameterValues::resolve(step.function.name(), &step.function.parameters(), args)?;

        let infos = match self.propagate(index, &resolved, input) {
            Ok(infos) => infos,
            Err(err) => {
                self.restore(index, input);
                return Err(err);
            }
        };

        let invalidate_parents = self.steps[index].function.configuration().invalidates_key_properties();
        for (offset, (step, info)) in self.steps[index..].iter_mut().zip(infos).enumerate() {
            step.info = info;
            if offset == 0 || invalidate_parents {
                step.key_metadata.clear();
            }
        }
        self.steps[index].args = resolved;

        debug!(step = index, invalidate_parents, "reconfigured chain step");
        Ok(())
    }

    /// Raster info a step receives
    fn input_info(&self, index: usize) -> RasterInfo {
        match index.checked_sub(1) {
            Some(previous) => self.steps[previous].info,
            None => self.source.info,
        }
    }

    /// New raster info of the step at `index` and every parent, not stored
    fn propagate(&mut self, index: usize, args: &ParameterValues, input: RasterInfo) -> Result<Vec<RasterInfo>> {
        let mut info = self.steps[index].function.update_raster_info(args, input)?;
        let mut infos = vec![info];
        for parent in &mut self.steps[index + 1..] {
            info = parent.function.update_raster_info(&parent.args, info)?;
            infos.push(info);
        }
        Ok(infos)
    }

    /// Reconfigure functions from their stored arguments after a failed
    /// propagation
    fn restore(&mut self, index: usize, input: RasterInfo) {
        let mut info = input;
        for step in &mut self.steps[index..] {
            if let Err(err) = step.function.update_raster_info(&step.args, info) {
                warn!(function = step.function.name(), %err, "failed to restore chain step");
            }
            info = step.info;
        }
    }

    /// Key metadata for a host band index (`-1` is the whole raster).
    ///
    /// Indices that name no scope resolve to empty metadata.
    pub fn key_metadata(&mut self, band_index: i64) -> KeyMetadata {
        match MetadataScope::from_index(band_index) {
            Some(scope) => self.scoped_key_metadata(scope),
            None => KeyMetadata::new(),
        }
    }

    /// Fold source metadata through every step, reusing cached results
    pub fn scoped_key_metadata(&mut self, scope: MetadataScope) -> KeyMetadata {
        let mut metadata = self.source.key_metadata(scope);
        for step in &mut self.steps {
            metadata = match step.key_metadata.get(&scope) {
                Some(cached) => cached.clone(),
                None => {
                    let resolved = step.function.update_key_metadata(scope, metadata);
                    step.key_metadata.insert(scope, resolved.clone());
                    resolved
                }
            };
        }
        metadata
    }

    /// Whole-raster metadata followed by every band's metadata
    pub fn all_key_metadata(&mut self) -> (KeyMetadata, Vec<KeyMetadata>) {
        let raster = self.scoped_key_metadata(MetadataScope::Raster);
        let bands = (0..self.raster_info().band_count)
            .map(|i| self.scoped_key_metadata(MetadataScope::Band(i)))
            .collect();
        (raster, bands)
    }

    /// Run a block of pixels through every step
    pub fn read_pixels(&self, block: PixelBlock) -> Result<PixelBlock> {
        let expected = self.source.info.band_count;
        if block.band_count() != expected {
            return Err(ChainError::BandCountMismatch {
                expected,
                actual: block.band_count(),
            });
        }

        let mut block = block;
        for step in &self.steps {
            block = step.function.update_pixels(block)?;
        }
        Ok(block)
    }

    /// Get information about the chain configuration
    pub fn info(&self) -> String {
        let names: Vec<&str> = self.steps.iter().map(|s| s.function.name()).collect();
        format!(
            "Chain: {} bands, {} steps [{}]",
            self.source.info.band_count,
            self.steps.len(),
            names.join(" -> ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{FunctionConfiguration, InvalidateFlags},
        functions::KeyMetadataOverride,
        parameters::ParameterInfo,
    };
    use serde_json::{Value, json};

    /// Appends its `suffix` to whatever band name it receives
    #[derive(Default)]
    struct SuffixBandName {
        suffix: String,
        invalidate: bool,
    }

    impl RasterFunction for SuffixBandName {
        fn name(&self) -> &'static str {
            "suffix_band_name"
        }

        fn parameters(&self) -> Vec<ParameterInfo> {
            vec![
                ParameterInfo::raster("raster", "Raster", ""),
                ParameterInfo::optional_string("suffix", "", "Suffix", ""),
            ]
        }

        fn configuration(&self) -> FunctionConfiguration {
            if self.invalidate {
                FunctionConfiguration::invalidating(InvalidateFlags::KEY_PROPERTIES)
            } else {
                FunctionConfiguration::default()
            }
        }

        fn update_raster_info(&mut self, args: &ParameterValues, info: RasterInfo) -> Result<RasterInfo> {
            self.suffix = args.text("suffix").unwrap_or_default();
            Ok(info)
        }

        fn update_key_metadata(&self, scope: MetadataScope, mut metadata: KeyMetadata) -> KeyMetadata {
            if let MetadataScope::Band(_) = scope {
                let name = metadata.get("bandname").and_then(Value::as_str).unwrap_or("").to_string();
                metadata.insert("bandname".to_string(), Value::String(name + &self.suffix));
            }
            metadata
        }
    }

    fn source() -> RasterSource {
        let band = |name: &str| json!({"bandname": name}).as_object().cloned().expect("object");
        RasterSource::new(RasterInfo { band_count: 2, width: 4, height: 4 })
            .with_band_metadata(vec![band("B1"), band("B2")])
    }

    fn band_name(chain: &mut FunctionChain, index: i64) -> Option<String> {
        chain.key_metadata(index).get("bandname").and_then(Value::as_str).map(str::to_string)
    }

    #[test]
    fn test_override_ends_chain() {
        let mut chain = FunctionChain::new(source());
        chain.push(Box::new(SuffixBandName::default()), &ParameterValues::new().with("suffix", "_x"))
            .expect("Should push");
        chain.push(Box::new(KeyMetadataOverride::new()), &ParameterValues::new().with("bands", "Red"))
            .expect("Should push");

        assert_eq!(band_name(&mut chain, 0).as_deref(), Some("Red"));
        assert_eq!(band_name(&mut chain, 1).as_deref(), Some("B2_x"));
        assert_eq!(chain.info(), "Chain: 2 bands, 2 steps [suffix_band_name -> key_metadata_override]");
    }

    #[test]
    fn test_override_invalidates_parent_cache() {
        let mut chain = FunctionChain::new(source());
        chain.push(Box::new(KeyMetadataOverride::new()), &ParameterValues::new().with("bands", "Red,Green"))
            .expect("Should push");
        chain.push(Box::new(SuffixBandName::default()), &ParameterValues::new().with("suffix", "!"))
            .expect("Should push");

        assert_eq!(band_name(&mut chain, 0).as_deref(), Some("Red!"));
        assert_eq!(chain.steps()[1].cached_scopes(), 1);

        chain.reconfigure(0, &ParameterValues::new().with("bands", "Nir"))
            .expect("Should reconfigure");
        assert_eq!(chain.steps()[1].cached_scopes(), 0);
        assert_eq!(band_name(&mut chain, 0).as_deref(), Some("Nir!"));
        assert_eq!(band_name(&mut chain, 1).as_deref(), Some("B2!"));
    }

    #[test]
    fn test_parents_keep_cache_without_flag() {
        let mut chain = FunctionChain::new(source());
        chain.push(Box::new(SuffixBandName::default()), &ParameterValues::new().with("suffix", "_a"))
            .expect("Should push");
        chain.push(Box::new(KeyMetadataOverride::new()), &ParameterValues::new())
            .expect("Should push");

        assert_eq!(band_name(&mut chain, 0).as_deref(), Some("B1_a"));

        chain.reconfigure(0, &ParameterValues::new().with("suffix", "_b"))
            .expect("Should reconfigure");

        // The parent never learned that key properties changed
        assert_eq!(band_name(&mut chain, 0).as_deref(), Some("B1_a"));
        assert_eq!(band_name(&mut chain, 1).as_deref(), Some("B2_b"));
    }

    /// Outputs the band count given by its `bands` argument and reports it
    /// in every scope
    #[derive(Default)]
    struct SetBandCount {
        bands: usize,
    }

    impl RasterFunction for SetBandCount {
        fn name(&self) -> &'static str {
            "set_band_count"
        }

        fn parameters(&self) -> Vec<ParameterInfo> {
            vec![
                ParameterInfo::raster("raster", "Raster", ""),
                ParameterInfo::optional_string("bands", "1", "Bands", ""),
            ]
        }

        fn update_raster_info(&mut self, args: &ParameterValues, info: RasterInfo) -> Result<RasterInfo> {
            self.bands = args.text("bands").and_then(|b| b.parse().ok()).unwrap_or(1);
            Ok(RasterInfo { band_count: self.bands, ..info })
        }

        fn update_key_metadata(&self, _scope: MetadataScope, mut metadata: KeyMetadata) -> KeyMetadata {
            metadata.insert("BandCount".to_string(), json!(self.bands));
            metadata
        }
    }

    /// Rejects inputs with more than three bands
    struct AtMostThreeBands;

    impl RasterFunction for AtMostThreeBands {
        fn name(&self) -> &'static str {
            "at_most_three_bands"
        }

        fn parameters(&self) -> Vec<ParameterInfo> {
            vec![ParameterInfo::raster("raster", "Raster", "")]
        }

        fn update_raster_info(&mut self, _args: &ParameterValues, info: RasterInfo) -> Result<RasterInfo> {
            if info.band_count > 3 {
                return Err(ChainError::BandCountMismatch {
                    expected: 3,
                    actual: info.band_count,
                });
            }
            Ok(info)
        }
    }

    #[test]
    fn test_failed_reconfigure_keeps_chain() {
        let mut chain = FunctionChain::new(source());
        chain.push(Box::new(SetBandCount::default()), &ParameterValues::new().with("bands", "2"))
            .expect("Should push");
        chain.push(Box::new(AtMostThreeBands), &ParameterValues::new())
            .expect("Should push");
        assert_eq!(chain.key_metadata(-1).get("BandCount"), Some(&json!(2)));

        let err = chain.reconfigure(0, &ParameterValues::new().with("bands", "5"))
            .expect_err("Parent should reject five bands");
        assert!(matches!(err, ChainError::BandCountMismatch { expected: 3, actual: 5 }));

        assert_eq!(chain.raster_info().band_count, 2);
        assert_eq!(chain.steps()[0].args().text("bands").as_deref(), Some("2"));
        assert_eq!(chain.steps()[0].cached_scopes(), 1);

        // The function itself was put back, so an uncached scope agrees
        assert_eq!(chain.key_metadata(0).get("BandCount"), Some(&json!(2)));

        chain.reconfigure(0, &ParameterValues::new().with("bands", "3"))
            .expect("Three bands are accepted");
        assert_eq!(chain.raster_info().band_count, 3);
        assert_eq!(chain.steps()[0].info().band_count, 3);
    }

    #[test]
    fn test_reconfigure_out_of_range() {
        let mut chain = FunctionChain::new(source());
        let err = chain.reconfigure(0, &ParameterValues::new()).expect_err("Empty chain");
        assert!(matches!(err, ChainError::StepOutOfRange { index: 0, len: 0 }));
    }

    #[test]
    fn test_unscoped_index_is_empty() {
        let mut chain = FunctionChain::new(source());
        chain.push(Box::new(KeyMetadataOverride::new()), &ParameterValues::new().with("property", "A"))
            .expect("Should push");
        assert!(chain.key_metadata(-2).is_empty());
        assert_eq!(chain.key_metadata(-1).get("A"), Some(&json!("True")));
    }

    #[test]
    fn test_read_pixels_checks_band_count() {
        let mut chain = FunctionChain::new(source());
        chain.push(Box::new(KeyMetadataOverride::new()), &ParameterValues::new())
            .expect("Should push");

        let block = PixelBlock::filled(2, 4, 4, 3.0);
        assert_eq!(chain.read_pixels(block.clone()).expect("Should read"), block);

        let err = chain.read_pixels(PixelBlock::filled(3, 4, 4, 0.0)).expect_err("Wrong band count");
        assert!(matches!(err, ChainError::BandCountMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_all_key_metadata() {
        let mut chain = FunctionChain::new(source());
        chain.push(
            Box::new(KeyMetadataOverride::new()),
            &ParameterValues::new().with("property", "Category").with("value", "Urban").with("bands", "North"),
        )
        .expect("Should push");

        let (raster, bands) = chain.all_key_metadata();
        assert_eq!(raster.get("Category"), Some(&json!("Urban")));
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].get("bandname"), Some(&json!("North")));
        assert_eq!(bands[1].get("bandname"), Some(&json!("B2")));
    }
}
