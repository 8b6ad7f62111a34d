// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Defaults for reading and writing, carried by [`FitsReader`] and
//! [`FitsWriter`].
//!
//! A config can be loaded from a TOML file; anything not specified keeps its
//! default:
//!
//! ```toml
//! memmap = false
//!
//! [write]
//! checksum = true
//!
//! [compression]
//! algorithm = "gzip1"
//! quantize_level = 8.0
//! ```
//!
//! [`FitsReader`]: crate::FitsReader
//! [`FitsWriter`]: crate::FitsWriter

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io::write::{CompressionSettings, WriteOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitsConfig {
    /// Memory map data when reading, unless a read says otherwise.
    pub memmap: bool,

    /// Log a warning for every metadata entry dropped while writing.
    pub log_metadata_warnings: bool,

    pub write: WriteOptions,

    /// Used when writing a compressed image HDU by class.
    pub compression: CompressionSettings,
}

impl Default for FitsConfig {
    fn default() -> Self {
        FitsConfig {
            memmap: true,
            log_metadata_warnings: true,
            write: WriteOptions::default(),
            compression: CompressionSettings::default(),
        }
    }
}

impl FitsConfig {
    pub fn from_toml_str(s: &str) -> Result<FitsConfig, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file<P: AsRef<Path>>(file: P) -> Result<FitsConfig, ConfigError> {
        let file = file.as_ref();
        debug!("Parsing config file {}", file.display());
        let contents = std::fs::read_to_string(file).map_err(|err| ConfigError::Read {
            file: file.to_path_buf(),
            err,
        })?;
        toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            file: Some(file.to_path_buf()),
            err,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Couldn't read config file {file:?}: {err}")]
    Read { file: PathBuf, err: std::io::Error },

    #[error("Couldn't decode toml structure{}:\n{err}", file.as_ref().map(|f| format!(" from {f:?}")).unwrap_or_default())]
    Parse {
        file: Option<PathBuf>,
        err: toml::de::Error,
    },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse { file: None, err }
    }
}
