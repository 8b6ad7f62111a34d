// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to write data and metadata to FITS files.

mod error;
mod fits;

pub use error::WriteError;

use std::path::{Path, PathBuf};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    config::FitsConfig,
    data::ImageArray,
    header::{header_from_meta, Header, MetadataWarning},
    io::read::fits::fits_open_hdu,
    meta::MetaDict,
};
use fits::*;

/// The kind of HDU the data is written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HduClass {
    /// The primary HDU.
    Primary,

    /// An image extension after an empty primary HDU.
    Image,

    /// A tile-compressed image extension after an empty primary HDU.
    CompImage,
}

/// A pre-built HDU whose header and compression settings are reused. Only
/// its data is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct PrebuiltHdu {
    pub class: HduClass,
    pub header: Header,

    /// Only used by [`HduClass::CompImage`].
    pub compression: CompressionSettings,
}

impl PrebuiltHdu {
    /// A HDU of this class with an empty header and default compression.
    pub fn new(class: HduClass) -> PrebuiltHdu {
        PrebuiltHdu {
            class,
            header: Header::new(),
            compression: CompressionSettings::default(),
        }
    }

    pub fn with_header(mut self, header: Header) -> PrebuiltHdu {
        self.header = header;
        self
    }

    pub fn with_compression(mut self, compression: CompressionSettings) -> PrebuiltHdu {
        self.compression = compression;
        self
    }
}

/// How to write a HDU.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HduType {
    /// Same as `Class(HduClass::Primary)`.
    #[default]
    Default,
    Class(HduClass),
    Instance(PrebuiltHdu),
}

impl From<HduClass> for HduType {
    fn from(class: HduClass) -> Self {
        HduType::Class(class)
    }
}

impl From<PrebuiltHdu> for HduType {
    fn from(hdu: PrebuiltHdu) -> Self {
        HduType::Instance(hdu)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    Rice,
    Gzip1,
    Gzip2,
    Plio,
    Hcompress,

    /// Write a plain image extension.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantizeMethod {
    NoDither,
    SubtractiveDither1,
    SubtractiveDither2,
}

/// Tile-compression settings, passed through to cfitsio. Quantization only
/// applies to floating-point images, and loses precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    pub algorithm: CompressionAlgorithm,

    /// Positive: the quantization step is the tile's noise divided by this.
    /// Negative: the absolute quantization step. Zero: lossless.
    pub quantize_level: f32,

    pub quantize_method: QuantizeMethod,

    /// 1 to 10000 picks a dither seed, 0 seeds from the clock and -1 seeds
    /// from the checksum of the first tile. Anything but 0 gives reproducible
    /// files.
    pub dither_seed: i32,

    /// Row-major tile shape. `None` compresses row by row.
    pub tile_shape: Option<Vec<usize>>,

    pub hcomp_scale: f32,
    pub hcomp_smooth: bool,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        CompressionSettings {
            algorithm: CompressionAlgorithm::Rice,
            quantize_level: 16.0,
            quantize_method: QuantizeMethod::SubtractiveDither1,
            dither_seed: -1,
            tile_shape: None,
            hcomp_scale: 0.0,
            hcomp_smooth: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Replace an existing file.
    pub overwrite: bool,

    /// Write `CHECKSUM` and `DATASUM` to every HDU.
    pub checksum: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            overwrite: true,
            checksum: false,
        }
    }
}

/// Writes FITS files according to a [`FitsConfig`].
#[derive(Debug, Clone, Default)]
pub struct FitsWriter {
    config: FitsConfig,
}

impl FitsWriter {
    pub fn new(config: FitsConfig) -> FitsWriter {
        FitsWriter { config }
    }

    pub fn config(&self) -> &FitsConfig {
        &self.config
    }

    /// Write an image and its metadata with the configured write options.
    /// Metadata that can't be written is dropped and returned as warnings.
    pub fn write<P: AsRef<Path>>(
        &self,
        path: P,
        data: &ImageArray,
        header: &MetaDict,
        hdu_type: HduType,
    ) -> Result<Vec<MetadataWarning>, WriteError> {
        self.write_with_options(path, data, header, hdu_type, self.config.write)
    }

    pub fn write_with_options<P: AsRef<Path>>(
        &self,
        path: P,
        data: &ImageArray,
        header: &MetaDict,
        hdu_type: HduType,
        options: WriteOptions,
    ) -> Result<Vec<MetadataWarning>, WriteError> {
        let path = path.as_ref();
        let denormalised = header_from_meta(header, self.config.log_metadata_warnings);

        let (class, mut cards, compression) = match hdu_type {
            HduType::Default => (HduClass::Primary, Header::new(), &self.config.compression),
            HduType::Class(class) => (class, Header::new(), &self.config.compression),
            HduType::Instance(ref hdu) => (hdu.class, hdu.header.clone(), &hdu.compression),
        };
        cards.extend_update(denormalised.header.cards().iter().cloned());
        cards.retain(|c| !is_structural(c.keyword()));

        if path.exists() && !options.overwrite {
            return Err(WriteError::FileExists(path.to_path_buf()));
        }

        debug!(
            "Writing a {:?} {class:?} HDU of shape {:?} with {} header cards to {}",
            data.pixel_type(),
            data.shape(),
            cards.len(),
            path.display()
        );
        // An existing file is only replaced once the new one is complete.
        let staging = staging_path(path);
        if staging.exists() {
            std::fs::remove_file(&staging)?;
        }
        match write_hdus(&staging, class, &cards, compression, data, options) {
            Ok(()) => std::fs::rename(&staging, path)?,
            Err(e) => {
                if let Err(rm_err) = std::fs::remove_file(&staging) {
                    trace!("Couldn't remove {}: {rm_err}", staging.display());
                }
                return Err(e);
            }
        }

        Ok(denormalised.warnings)
    }
}

/// Where a file is written before being renamed to `path`. It sits in the
/// same directory and keeps the file name as a suffix, so cfitsio still sees
/// e.g. a `.gz` extension.
fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".solar_fits-{}-{file_name}", std::process::id()))
}

/// Create a file and lay out, fill and optionally checksum its HDUs. The file
/// is closed when this returns.
fn write_hdus(
    path: &Path,
    class: HduClass,
    cards: &Header,
    compression: &CompressionSettings,
    data: &ImageArray,
    options: WriteOptions,
) -> Result<(), WriteError> {
    let mut fits_fptr = fits_create(path)?;
    let data_hdu = match class {
        HduClass::Primary => {
            fits_resize_primary(&mut fits_fptr, data.pixel_type(), data.shape())?;
            0
        }
        HduClass::Image => {
            fits_create_image(&mut fits_fptr, 1, data.pixel_type(), data.shape())?;
            1
        }
        HduClass::CompImage => {
            if compression.algorithm == CompressionAlgorithm::None {
                debug!("No compression algorithm set; writing a plain image extension");
            } else {
                fits_set_compression(&mut fits_fptr, 1, compression)?;
            }
            fits_create_image(&mut fits_fptr, 1, data.pixel_type(), data.shape())?;
            1
        }
    };

    for card in cards.iter() {
        fits_write_card(&mut fits_fptr, data_hdu, card)?;
    }
    fits_write_image(&mut fits_fptr, data_hdu, data)?;

    if options.checksum {
        for hdu_num in 0..=data_hdu {
            fits_open_hdu(&mut fits_fptr, hdu_num)?;
            fits_write_checksum(&mut fits_fptr, hdu_num)?;
        }
    }
    Ok(())
}

/// Write an image and its metadata with the default configuration.
///
/// ```no_run
/// use ndarray::ArrayD;
/// use solar_fits::{write, HduClass, HduType, MetaDict};
///
/// let data = ArrayD::<f32>::zeros(vec![512, 512]);
/// let mut meta = MetaDict::new();
/// meta.insert("TELESCOP", "SDO/AIA");
/// let warnings = write(
///     "out.fits",
///     &data.into(),
///     &meta,
///     HduType::Class(HduClass::CompImage),
/// )?;
/// assert!(warnings.is_empty());
/// # Ok::<(), solar_fits::WriteError>(())
/// ```
pub fn write<P: AsRef<Path>>(
    path: P,
    data: &ImageArray,
    header: &MetaDict,
    hdu_type: HduType,
) -> Result<Vec<MetadataWarning>, WriteError> {
    FitsWriter::default().write(path, data, header, hdu_type)
}

/// Keywords that describe the structure of a HDU. cfitsio writes these from
/// the data, so they're never copied from a header.
fn is_structural(keyword: &str) -> bool {
    let keyword = keyword.to_ascii_uppercase();
    match keyword.as_str() {
        "SIMPLE" | "XTENSION" | "BITPIX" | "NAXIS" | "EXTEND" | "PCOUNT" | "GCOUNT" | "GROUPS"
        | "END" | "BSCALE" | "BZERO" | "BLANK" | "CHECKSUM" | "DATASUM" | "ZIMAGE"
        | "ZBITPIX" | "ZNAXIS" | "ZCMPTYPE" | "ZQUANTIZ" | "ZDITHER0" | "ZSIMPLE" | "ZEXTEND"
        | "ZTENSION" | "ZPCOUNT" | "ZGCOUNT" | "ZBLANK" | "ZHECKSUM" | "ZDATASUM" | "TFIELDS"
        | "THEAP" => true,
        _ => ["NAXIS", "ZNAXIS", "ZTILE", "ZNAME", "ZVAL", "TTYPE", "TFORM"]
            .iter()
            .any(|prefix| indexed(&keyword, prefix)),
    }
}

/// Is this keyword the prefix followed by a number (e.g. `NAXIS2`)?
fn indexed(keyword: &str, prefix: &str) -> bool {
    keyword
        .strip_prefix(prefix)
        .map(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}
