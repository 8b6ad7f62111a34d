// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Reading and writing FITS files of solar-physics data products.

FITS headers are normalised into a [`MetaDict`], an ordered, case-insensitive
mapping with a sidecar of key comments, and converted back into FITS-legal
cards when writing. Metadata that can't be written (keys that are too long,
non-ASCII text, NaN values) is dropped with a [`MetadataWarning`] rather than
an error.
 */

pub mod config;
pub mod data;
mod error;
pub mod header;
pub mod io;
pub mod meta;
pub mod waveunit;

// Re-exports.
pub use config::{ConfigError, FitsConfig};
pub use data::{
    ByteStorage, HduData, ImageArray, ImageData, MappedImage, MappedRegion, PixelType, TableData,
};
pub use error::SolarFitsError;
pub use header::{
    format_comments_and_history, header_to_fits, Card, CardError, Denormalised, Header,
    HeaderFileError, MetadataWarning,
};
pub use io::read::{get_header, read, FitsError, FitsReader, HduPair, HduSelection, ReadError};
pub use io::write::{
    write, CompressionAlgorithm, CompressionSettings, FitsWriter, HduClass, HduType,
    PrebuiltHdu, QuantizeMethod, WriteError, WriteOptions,
};
pub use meta::{MetaDict, MetaValue};
pub use waveunit::extract_waveunit;
