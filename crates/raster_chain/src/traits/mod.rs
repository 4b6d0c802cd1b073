use crate::{
    config::FunctionConfiguration,
    error::Result,
    parameters::{ParameterInfo, ParameterValues},
    types::{KeyMetadata, MetadataScope, PixelBlock, RasterInfo},
};

/// A step in a raster processing chain.
///
/// The chain calls `update_raster_info` whenever the step is (re)configured,
/// then `update_key_metadata` and `update_pixels` lazily as the raster is
/// queried.
pub trait RasterFunction: Send + Sync {
    /// Stable identifier of the function
    fn name(&self) -> &'static str;

    /// Declared inputs, in order
    fn parameters(&self) -> Vec<ParameterInfo>;

    /// What the chain must invalidate when this step is reconfigured
    fn configuration(&self) -> FunctionConfiguration {
        FunctionConfiguration::default()
    }

    /// Receive resolved parameter values and describe the output raster
    fn update_raster_info(&mut self, args: &ParameterValues, info: RasterInfo) -> Result<RasterInfo>;

    /// Transform key metadata for a scope
    fn update_key_metadata(&self, _scope: MetadataScope, metadata: KeyMetadata) -> KeyMetadata {
        metadata
    }

    /// Transform a block of pixels
    fn update_pixels(&self, block: PixelBlock) -> Result<PixelBlock> {
        Ok(block)
    }
}
