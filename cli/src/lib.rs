use raster_chain::{FunctionChain, FunctionKind, KeyMetadata, ParameterInfo};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, `RUST_LOG` overriding the `info` default
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();
}

/// Key metadata of a chain, as printed by `chain_tool metadata`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetadataReport {
    pub raster: KeyMetadata,
    pub bands: Vec<KeyMetadata>,
}

impl MetadataReport {
    pub fn collect(chain: &mut FunctionChain) -> Self {
        let (raster, bands) = chain.all_key_metadata();
        Self { raster, bands }
    }
}

/// Declaration of a function, as printed by `chain_tool parameters`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FunctionReport {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterInfo>,
    /// Invalidation bitmask in the host's encoding
    pub invalidate: u32,
}

impl FunctionReport {
    pub fn new(kind: FunctionKind) -> Self {
        let function = kind.instantiate();
        Self {
            name: kind.to_string(),
            description: kind.description().to_string(),
            parameters: function.parameters(),
            invalidate: function.configuration().invalidate.bits(),
        }
    }
}
