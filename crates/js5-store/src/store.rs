//! Named blob sets
//!
//! A cache arrives as a set of `name -> bytes` blobs, wherever they were
//! loaded from. [`FileStore`] picks out the data blob and the index channels
//! by name and serves file reads across them.

use crate::config::StoreConfig;
use crate::data_file::{DataFile, StoreFormat};
use crate::index::IndexFile;
use crate::{Result, StoreError};
use std::collections::BTreeMap;
use tracing::{debug, error, info, trace, warn};

/// A recognized cache: one data blob and its index channels
#[derive(Debug, Clone)]
pub struct FileStore {
    config: StoreConfig,
    data: DataFile,
    indexes: BTreeMap<u8, IndexFile>,
}

impl FileStore {
    /// Recognize a cache in a set of named blobs.
    ///
    /// The generation comes from the data blob name (`.dat2` wins over
    /// `.dat` when both exist) unless the configuration forces one. Blobs
    /// outside the cache's base name are ignored, empty blobs are skipped
    /// with a warning, and index blobs whose channel cannot be parsed are
    /// logged and skipped.
    pub fn from_blobs<I, N, B>(config: StoreConfig, blobs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, B)>,
        N: AsRef<str>,
        B: Into<Vec<u8>>,
    {
        let blobs: Vec<(N, B)> = blobs.into_iter().collect();
        if blobs.is_empty() {
            return Err(StoreError::NoBlobs);
        }

        let names: Vec<&str> = blobs.iter().map(|(name, _)| name.as_ref()).collect();
        let format = Self::detect_format(&config, &names)?;
        let data_name = config.data_file_name(format);
        debug!("Recognized {} store {}", format, data_name);

        let mut data = DataFile::new(format, Vec::new());
        let mut indexes = BTreeMap::new();

        for (name, bytes) in blobs {
            let name = name.as_ref();
            if !name.starts_with(config.cache_name.as_str()) {
                trace!("Ignoring blob {} outside cache {}", name, config.cache_name);
                continue;
            }

            let bytes: Vec<u8> = bytes.into();
            if bytes.is_empty() {
                warn!("File {} is empty", name);
                continue;
            }

            if name == data_name {
                data = DataFile::new(format, bytes);
                continue;
            }

            match config.index_channel(name) {
                Ok(Some(channel)) => {
                    if indexes.insert(channel, IndexFile::new(channel, bytes)).is_some() {
                        warn!("Index {} supplied more than once, keeping {}", channel, name);
                    }
                }
                Ok(None) => debug!("Ignoring unrecognized blob {}", name),
                Err(e) => error!("{}", e),
            }
        }

        info!(
            "Loaded {} store with {} index channels ({} data bytes)",
            format,
            indexes.len(),
            data.len()
        );

        Ok(Self {
            config,
            data,
            indexes,
        })
    }

    fn detect_format(config: &StoreConfig, names: &[&str]) -> Result<StoreFormat> {
        let candidates = match config.format {
            Some(forced) => vec![forced],
            None => vec![StoreFormat::Js5, StoreFormat::Jag],
        };

        candidates
            .into_iter()
            .find(|&format| {
                let wanted = config.data_file_name(format);
                names.iter().any(|&name| name == wanted)
            })
            .ok_or_else(|| StoreError::DataFileMissing {
                cache_name: config.cache_name.clone(),
            })
    }

    /// Read one file from an index channel.
    pub fn read(&self, channel: u8, file_number: u32) -> Result<Vec<u8>> {
        let index = self.indexes.get(&channel).ok_or_else(|| StoreError::NotLoaded {
            what: format!("Index {channel}"),
        })?;
        let entry = index.entry(file_number)?;
        self.data.read(channel, &entry)
    }

    /// Index of one channel, if loaded.
    pub fn index(&self, channel: u8) -> Option<&IndexFile> {
        self.indexes.get(&channel)
    }

    /// Loaded channel numbers in ascending order.
    pub fn channels(&self) -> impl Iterator<Item = u8> + '_ {
        self.indexes.keys().copied()
    }

    /// Container generation.
    pub fn format(&self) -> StoreFormat {
        self.data.format()
    }

    /// The main data blob.
    pub fn data_file(&self) -> &DataFile {
        &self.data
    }

    /// Configuration the store was recognized with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}
