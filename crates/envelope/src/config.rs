use serde::{Deserialize, Serialize};

use crate::error::{EnvelopeError, EnvelopeResult};

/// Tunables for the transform extensions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// zstd compression level.
    pub compression_level: i32,
    /// Largest decompressed payload accepted, in bytes. Guards against
    /// compressed nodes that declare or expand to absurd sizes.
    pub max_decompressed_len: usize,
    /// Deepest envelope nesting accepted when decoding the wire form.
    pub max_depth: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            compression_level: 3,
            max_decompressed_len: 64 * 1024 * 1024,
            max_depth: 128,
        }
    }
}

impl EnvelopeConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> EnvelopeResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| EnvelopeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EnvelopeResult<()> {
        let levels = zstd::compression_level_range();
        if !levels.contains(&self.compression_level) {
            return Err(EnvelopeError::Config(format!(
                "compression_level {} outside {}..={}",
                self.compression_level,
                levels.start(),
                levels.end()
            )));
        }
        if self.max_decompressed_len == 0 {
            return Err(EnvelopeError::Config(
                "max_decompressed_len must be positive".into(),
            ));
        }
        if self.max_depth == 0 {
            return Err(EnvelopeError::Config("max_depth must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = EnvelopeConfig::default();
        assert_eq!(c.compression_level, 3);
        assert_eq!(c.max_decompressed_len, 64 * 1024 * 1024);
        assert_eq!(c.max_depth, 128);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn toml_overrides_and_defaults() {
        let c = EnvelopeConfig::from_toml_str("compression_level = 19").unwrap();
        assert_eq!(c.compression_level, 19);
        assert_eq!(c.max_decompressed_len, EnvelopeConfig::default().max_decompressed_len);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(EnvelopeConfig::from_toml_str("").unwrap(), EnvelopeConfig::default());
    }

    #[test]
    fn rejects_out_of_range_level() {
        let err = EnvelopeConfig::from_toml_str("compression_level = 1000").unwrap_err();
        assert!(matches!(err, EnvelopeError::Config(_)));
    }

    #[test]
    fn rejects_zero_limit() {
        let err = EnvelopeConfig::from_toml_str("max_decompressed_len = 0").unwrap_err();
        assert!(matches!(err, EnvelopeError::Config(_)));
    }

    #[test]
    fn depth_override_and_zero_rejected() {
        let c = EnvelopeConfig::from_toml_str("max_depth = 16").unwrap();
        assert_eq!(c.max_depth, 16);
        let err = EnvelopeConfig::from_toml_str("max_depth = 0").unwrap_err();
        assert!(matches!(err, EnvelopeError::Config(_)));
    }

    #[test]
    fn rejects_unparseable_toml() {
        assert!(EnvelopeConfig::from_toml_str("compression_level = \"high\"").is_err());
    }
}
