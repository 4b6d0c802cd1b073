//! # Raster Function Chains
//!
//! Lazily evaluated chains of raster functions, and the key metadata
//! override step that usually ends them.
//!
//! A chain starts from a [`RasterSource`] and threads raster info, key
//! metadata and pixel blocks through each [`RasterFunction`] in order. The
//! [`KeyMetadataOverride`] function leaves pixels alone and only patches
//! metadata: one whole-raster property and the display name of each band.
//!
//! ## Quick Start
//!
//! ```rust
//! use raster_chain::{FunctionChain, RasterInfo, RasterSource};
//!
//! let mut chain = FunctionChain::builder()
//!     .source(RasterSource::new(RasterInfo { band_count: 2, width: 256, height: 256 }))
//!     .with_key_metadata_override("Category", "Urban", "North,South")
//!     .build()?;
//!
//! assert_eq!(chain.key_metadata(-1)["Category"], "Urban");
//! assert_eq!(chain.key_metadata(1)["bandname"], "South");
//! # Ok::<(), raster_chain::ChainError>(())
//! ```
//!
//! ## Chain Definitions
//!
//! ```rust,no_run
//! use raster_chain::ChainDefinition;
//!
//! let definition = ChainDefinition::from_file("chain.toml")?;
//! let mut chain = definition.build()?;
//! let band_zero = chain.key_metadata(0);
//! # Ok::<(), raster_chain::ChainError>(())
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod parameters;
pub mod traits;
pub mod functions;
pub mod pipeline;
pub mod definition;

pub use error::{ChainError, Result};
pub use types::*;
pub use config::{FunctionConfiguration, InvalidateFlags};
pub use parameters::{ParameterDataType, ParameterInfo, ParameterValue, ParameterValues, RasterRef};
pub use traits::*;
pub use functions::*;
pub use pipeline::{FunctionChain, ChainStep, builder::ChainBuilder};
pub use definition::{ChainDefinition, StepDefinition};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_band_names_from_source_survive_partial_override() {
        let band = |name: &str| json!({"bandname": name}).as_object().cloned().expect("object");
        let source = RasterSource::new(RasterInfo { band_count: 3, width: 10, height: 10 })
            .with_metadata(json!({"x": 1}).as_object().cloned().expect("object"))
            .with_band_metadata(vec![band("B1"), band("B2"), band("B3")]);

        let mut chain = FunctionChain::builder()
            .source(source)
            .with_key_metadata_override("Category", "Urban", "North,South")
            .build()
            .expect("Should build");

        let (raster, bands) = chain.all_key_metadata();
        assert_eq!(serde_json::Value::Object(raster), json!({"x": 1, "Category": "Urban"}));
        let names: Vec<&str> = bands.iter().filter_map(|b| b["bandname"].as_str()).collect();
        assert_eq!(names, ["North", "South", "B3"]);
    }

    #[test]
    fn test_chains_do_not_share_functions() {
        let build = |bands: &str| {
            FunctionChain::builder()
                .source(RasterSource::new(RasterInfo::default()))
                .with_key_metadata_override("", "", bands)
                .build()
                .expect("Should build")
        };
        let mut first = build("A");
        let mut second = build("B");

        second.reconfigure(0, &ParameterValues::new().with("bands", "C")).expect("Should reconfigure");

        assert_eq!(first.key_metadata(0)["bandname"], "A");
        assert_eq!(second.key_metadata(0)["bandname"], "C");
    }
}
