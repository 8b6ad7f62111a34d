// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Diagnostics for metadata entries that can't be written to a FITS header.
//!
//! These are not errors; the entry is dropped and the header is still
//! written.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataWarning {
    #[error("The meta key {key} is too long, dropping from the FITS header (maximum allowed key length is 8 characters).")]
    TooLong { key: String },

    #[error("The meta key {key} is not a valid FITS keyword, dropping from the FITS header")]
    InvalidKeyword { key: String },

    #[error("The meta key {key} is not valid ascii, dropping from the FITS header")]
    NotAscii { key: String },

    #[error("The meta key {key} has a NaN value, which is not valid in a FITS header, dropping from the FITS header")]
    NaN { key: String },

    #[error("The meta key {key} has an infinite value, which is not valid in a FITS header, dropping from the FITS header")]
    Infinite { key: String },
}

impl MetadataWarning {
    /// The offending key, as the caller spelled it.
    pub fn key(&self) -> &str {
        match self {
            MetadataWarning::TooLong { key }
            | MetadataWarning::InvalidKeyword { key }
            | MetadataWarning::NotAscii { key }
            | MetadataWarning::NaN { key }
            | MetadataWarning::Infinite { key } => key,
        }
    }
}
