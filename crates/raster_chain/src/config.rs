use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Cached state a function asks the chain to drop on its parents when
    /// its parameters change.
    ///
    /// Bit values follow the host's legacy encoding, so a function that
    /// only invalidates key properties reports `8`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct InvalidateFlags: u32 {
        /// Geometric transform
        const XFORM = 0x01;
        const STATISTICS = 0x02;
        const HISTOGRAM = 0x04;
        /// Key metadata (raster and band properties)
        const KEY_PROPERTIES = 0x08;
    }
}

impl Default for InvalidateFlags {
    fn default() -> Self {
        InvalidateFlags::empty()
    }
}

/// Static configuration a raster function reports to its chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfiguration {
    /// What parents must recompute after this function is reconfigured
    pub invalidate: InvalidateFlags,
}

impl FunctionConfiguration {
    pub fn invalidating(invalidate: InvalidateFlags) -> Self {
        Self { invalidate }
    }

    pub fn invalidates_key_properties(&self) -> bool {
        self.invalidate.contains(InvalidateFlags::KEY_PROPERTIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_bits() {
        assert_eq!(InvalidateFlags::KEY_PROPERTIES.bits(), 8);
        assert_eq!(InvalidateFlags::from_bits(8), Some(InvalidateFlags::KEY_PROPERTIES));
        assert_eq!(
            (InvalidateFlags::STATISTICS | InvalidateFlags::HISTOGRAM).bits(),
            6
        );
        assert_eq!(InvalidateFlags::from_bits(16), None);
    }

    #[test]
    fn test_key_property_check() {
        let config = FunctionConfiguration::invalidating(InvalidateFlags::KEY_PROPERTIES | InvalidateFlags::XFORM);
        assert!(config.invalidates_key_properties());
        assert!(!FunctionConfiguration::default().invalidates_key_properties());
    }
}
