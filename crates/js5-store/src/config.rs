//! Configuration for blob set recognition

use crate::data_file::StoreFormat;
use crate::{DEFAULT_CACHE_NAME, Result, StoreError};
use serde::{Deserialize, Serialize};

/// Naming rules for the blobs of one cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base name shared by every blob of the cache
    pub cache_name: String,

    /// Data blob suffix of the current (`js5`) generation
    pub data_suffix: String,

    /// Data blob suffix of the legacy (`jag`) generation
    pub legacy_data_suffix: String,

    /// Index blob suffix, followed by the channel number
    pub index_suffix: String,

    /// Use this generation instead of detecting it from the blob names
    pub format: Option<StoreFormat>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            data_suffix: ".dat2".to_string(),
            legacy_data_suffix: ".dat".to_string(),
            index_suffix: ".idx".to_string(),
            format: None,
        }
    }
}

impl StoreConfig {
    /// Create a configuration for the given cache base name
    pub fn new(cache_name: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            ..Default::default()
        }
    }

    /// Set the cache base name
    #[must_use]
    pub fn with_cache_name(mut self, cache_name: impl Into<String>) -> Self {
        self.cache_name = cache_name.into();
        self
    }

    /// Set the data blob suffixes for both generations
    #[must_use]
    pub fn with_data_suffixes(
        mut self,
        current: impl Into<String>,
        legacy: impl Into<String>,
    ) -> Self {
        self.data_suffix = current.into();
        self.legacy_data_suffix = legacy.into();
        self
    }

    /// Set the index blob suffix
    #[must_use]
    pub fn with_index_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.index_suffix = suffix.into();
        self
    }

    /// Force a container generation
    #[must_use]
    pub const fn with_format(mut self, format: Option<StoreFormat>) -> Self {
        self.format = format;
        self
    }

    /// Full name of the data blob for a generation
    pub fn data_file_name(&self, format: StoreFormat) -> String {
        match format {
            StoreFormat::Js5 => format!("{}{}", self.cache_name, self.data_suffix),
            StoreFormat::Jag => format!("{}{}", self.cache_name, self.legacy_data_suffix),
        }
    }

    /// Full name of the index blob for a channel
    pub fn index_file_name(&self, channel: u8) -> String {
        format!("{}{}{}", self.cache_name, self.index_suffix, channel)
    }

    /// Channel number encoded in an index blob name.
    ///
    /// Returns `Ok(None)` when `name` is not an index blob of this cache.
    pub fn index_channel(&self, name: &str) -> Result<Option<u8>> {
        let Some(rest) = name.strip_prefix(self.cache_name.as_str()) else {
            return Ok(None);
        };
        let Some(suffix) = rest.strip_prefix(self.index_suffix.as_str()) else {
            return Ok(None);
        };

        suffix
            .parse::<u8>()
            .map(Some)
            .map_err(|_| StoreError::InvalidIndexName(name.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_names() {
        let config = StoreConfig::default();
        assert_eq!(config.data_file_name(StoreFormat::Js5), "main_file_cache.dat2");
        assert_eq!(config.data_file_name(StoreFormat::Jag), "main_file_cache.dat");
        assert_eq!(config.index_file_name(255), "main_file_cache.idx255");
    }

    #[test]
    fn test_index_channel() {
        let config = StoreConfig::default();
        assert_eq!(config.index_channel("main_file_cache.idx0").expect("valid"), Some(0));
        assert_eq!(config.index_channel("main_file_cache.idx17").expect("valid"), Some(17));
        assert_eq!(config.index_channel("main_file_cache.dat2").expect("valid"), None);
        assert_eq!(config.index_channel("other.idx3").expect("valid"), None);

        for invalid in ["main_file_cache.idx", "main_file_cache.idxA", "main_file_cache.idx256"] {
            assert!(matches!(
                config.index_channel(invalid),
                Err(StoreError::InvalidIndexName(name)) if name == invalid
            ));
        }
    }

    #[test]
    fn test_builders() {
        let config = StoreConfig::new("cache")
            .with_data_suffixes(".d2", ".d1")
            .with_index_suffix(".i")
            .with_format(Some(StoreFormat::Jag));

        assert_eq!(config.data_file_name(StoreFormat::Js5), "cache.d2");
        assert_eq!(config.data_file_name(StoreFormat::Jag), "cache.d1");
        assert_eq!(config.index_channel("cache.i4").expect("valid"), Some(4));
        assert_eq!(config.format, Some(StoreFormat::Jag));
        assert_eq!(
            config.with_cache_name("x").index_file_name(1),
            "x.i1"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let config = StoreConfig::default().with_format(Some(StoreFormat::Js5));
        let json = serde_json::to_string(&config).expect("serializes");
        assert!(json.contains("\"format\":\"js5\""));

        let parsed: StoreConfig = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_serde_defaults_missing_fields() {
        let parsed: StoreConfig =
            serde_json::from_str(r#"{"cache_name":"legacy_cache"}"#).expect("deserializes");
        assert_eq!(parsed.cache_name, "legacy_cache");
        assert_eq!(parsed.data_suffix, ".dat2");
        assert_eq!(parsed.format, None);
    }
}
