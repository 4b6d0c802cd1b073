use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    config::{FunctionConfiguration, InvalidateFlags},
    error::Result,
    parameters::{ParameterInfo, ParameterValues},
    traits::RasterFunction,
    types::{BAND_NAME_KEY, KeyMetadata, MetadataScope, RasterInfo},
};

/// Overrides captured when the function is configured
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSettings {
    /// Whole-raster key to override; empty means none
    pub property_name: String,
    pub property_value: String,
    /// Display names applied to bands by index
    pub band_names: Vec<String>,
}

impl OverrideSettings {
    /// Build settings from a comma separated band name list.
    ///
    /// Only the list as a whole is trimmed, names keep their own spacing.
    pub fn new(property_name: &str, property_value: &str, band_names_csv: &str) -> Self {
        let trimmed = band_names_csv.trim();
        let band_names = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split(',').map(str::to_string).collect()
        };

        Self {
            property_name: property_name.to_string(),
            property_value: property_value.to_string(),
            band_names,
        }
    }
}

/// Patches key metadata at the end of a chain without touching pixels.
///
/// Whole-raster queries get `property_name = property_value`, band queries
/// get their `bandname` replaced. Anything not configured passes through.
#[derive(Debug, Clone, Default)]
pub struct KeyMetadataOverride {
    settings: OverrideSettings,
}

impl KeyMetadataOverride {
    pub const NAME: &'static str = "key_metadata_override";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &OverrideSettings {
        &self.settings
    }

    pub fn band_names(&self) -> &[String] {
        &self.settings.band_names
    }

    /// Replace every override; nothing from an earlier call survives
    pub fn configure(&mut self, property_name: &str, property_value: &str, band_names_csv: &str) {
        self.settings = OverrideSettings::new(property_name, property_value, band_names_csv);
        debug!(
            property = %self.settings.property_name,
            bands = self.settings.band_names.len(),
            "configured key metadata override"
        );
    }

    /// Apply the overrides for a host band index (`-1` is the whole raster)
    pub fn resolve_metadata(&self, band_index: i64, metadata: KeyMetadata) -> KeyMetadata {
        match MetadataScope::from_index(band_index) {
            Some(scope) => self.apply(scope, metadata),
            None => metadata,
        }
    }

    fn apply(&self, scope: MetadataScope, mut metadata: KeyMetadata) -> KeyMetadata {
        match scope {
            MetadataScope::Raster if !self.settings.property_name.is_empty() => {
                metadata.insert(
                    self.settings.property_name.clone(),
                    Value::String(self.settings.property_value.clone()),
                );
            }
            MetadataScope::Band(i) => {
                if let Some(name) = self.settings.band_names.get(i) {
                    metadata.insert(BAND_NAME_KEY.to_string(), Value::String(name.clone()));
                }
            }
            MetadataScope::Raster => {}
        }
        metadata
    }
}

impl RasterFunction for KeyMetadataOverride {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        vec![
            ParameterInfo::raster("raster", "Raster", "The primary input raster."),
            ParameterInfo::optional_string(
                "property",
                "",
                "Property Name",
                "Name of the whole-raster key property to override.",
            ),
            ParameterInfo::optional_string(
                "value",
                "True",
                "Property Value",
                "Value assigned to the overridden property.",
            ),
            ParameterInfo::optional_string(
                "bands",
                "",
                "Band Names",
                "Comma separated band names, applied in band order.",
            ),
        ]
    }

    fn configuration(&self) -> FunctionConfiguration {
        FunctionConfiguration::invalidating(InvalidateFlags::KEY_PROPERTIES)
    }

    fn update_raster_info(&mut self, args: &ParameterValues, info: RasterInfo) -> Result<RasterInfo> {
        let property = args.text("property").unwrap_or_default();
        let value = args.text("value").unwrap_or_default();
        let bands = args.text("bands").unwrap_or_default();
        self.configure(&property, &value, &bands);
        Ok(info)
    }

    fn update_key_metadata(&self, scope: MetadataScope, metadata: KeyMetadata) -> KeyMetadata {
        self.apply(scope, metadata)
    }
}
