use image::{ImageBuffer, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Key metadata for a whole raster or a single band.
///
/// Values are untyped scalars; producers decide what they store.
pub type KeyMetadata = serde_json::Map<String, serde_json::Value>;

/// Key under which a band's display name is published.
pub const BAND_NAME_KEY: &str = "bandname";

/// Single band of pixel data
pub type Band = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Which metadata a key-metadata query is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetadataScope {
    /// Whole-raster metadata
    Raster,
    /// Metadata of the band at this zero-based index
    Band(usize),
}

impl MetadataScope {
    /// Convert the host encoding, where `-1` means the whole raster and
    /// `0..N-1` a band. Any other negative index has no scope.
    pub fn from_index(band_index: i64) -> Option<Self> {
        match band_index {
            -1 => Some(Self::Raster),
            i if i >= 0 => usize::try_from(i).ok().map(Self::Band),
            _ => None,
        }
    }
}

/// Shape of a raster flowing through a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RasterInfo {
    pub band_count: usize,
    pub width: u32,
    pub height: u32,
}

impl Default for RasterInfo {
    fn default() -> Self {
        Self {
            band_count: 1,
            width: 0,
            height: 0,
        }
    }
}

/// A block of pixels, one buffer per band
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBlock {
    pub bands: Vec<Band>,
}

impl PixelBlock {
    pub fn new(bands: Vec<Band>) -> Self {
        Self { bands }
    }

    /// A block of `band_count` bands filled with `value`
    pub fn filled(band_count: usize, width: u32, height: u32, value: f32) -> Self {
        let bands = (0..band_count)
            .map(|_| ImageBuffer::from_pixel(width, height, Luma([value])))
            .collect();
        Self { bands }
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Dimensions of the first band, or zero for an empty block
    pub fn dimensions(&self) -> (u32, u32) {
        self.bands.first().map(|b| b.dimensions()).unwrap_or((0, 0))
    }
}

/// The raster a chain starts from, with the key metadata it publishes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RasterSource {
    #[serde(default)]
    pub info: RasterInfo,
    /// Whole-raster key metadata
    #[serde(default)]
    #[schemars(with = "std::collections::BTreeMap<String, serde_json::Value>")]
    pub metadata: KeyMetadata,
    /// Per-band key metadata, indexed by band
    #[serde(default)]
    #[schemars(with = "Vec<std::collections::BTreeMap<String, serde_json::Value>>")]
    pub band_metadata: Vec<KeyMetadata>,
}

impl RasterSource {
    pub fn new(info: RasterInfo) -> Self {
        Self {
            info,
            metadata: KeyMetadata::new(),
            band_metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: KeyMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_band_metadata(mut self, band_metadata: Vec<KeyMetadata>) -> Self {
        self.band_metadata = band_metadata;
        self
    }

    /// Source metadata for a scope; bands without entries publish nothing
    pub fn key_metadata(&self, scope: MetadataScope) -> KeyMetadata {
        match scope {
            MetadataScope::Raster => self.metadata.clone(),
            MetadataScope::Band(i) => self.band_metadata.get(i).cloned().unwrap_or_default(),
        }
    }
}
