// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read (data, header) pairs from FITS files.

mod error;
pub(crate) mod fits;

pub use error::ReadError;
pub use fits::FitsError;

use std::{fs::File, io::Read, ops::Range, path::Path, sync::Arc};

use fitsio::{hdu::HduInfo, FitsFile};
use itertools::Itertools;
use log::{debug, trace};
use memmap2::Mmap;

use crate::{
    config::FitsConfig,
    data::{ByteStorage, HduData, ImageData, MappedImage, MappedRegion, PixelType, TableData},
    header::{format_comments_and_history, Header},
    meta::MetaDict,
    waveunit::extract_waveunit,
};
use fits::*;

/// Which HDUs of a file to read. HDU 0 is the primary HDU.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HduSelection {
    /// Every HDU in the file, including an empty primary and any tables.
    #[default]
    All,
    Single(usize),

    /// These HDUs, in this order.
    List(Vec<usize>),
    Range(Range<usize>),
}

impl HduSelection {
    /// The selected HDU indices, checked against the number of HDUs in the
    /// file.
    fn indices(&self, num_hdus: usize) -> Result<Vec<usize>, ReadError> {
        let indices = match self {
            HduSelection::All => (0..num_hdus).collect(),
            HduSelection::Single(i) => vec![*i],
            HduSelection::List(l) => l.clone(),
            HduSelection::Range(r) => r.clone().collect(),
        };
        match indices.iter().find(|&&i| i >= num_hdus) {
            Some(&index) => Err(ReadError::HduOutOfRange { index, num_hdus }),
            None => Ok(indices),
        }
    }
}

impl From<usize> for HduSelection {
    fn from(i: usize) -> Self {
        HduSelection::Single(i)
    }
}

impl From<Vec<usize>> for HduSelection {
    fn from(l: Vec<usize>) -> Self {
        HduSelection::List(l)
    }
}

impl From<&[usize]> for HduSelection {
    fn from(l: &[usize]) -> Self {
        HduSelection::List(l.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for HduSelection {
    fn from(l: [usize; N]) -> Self {
        HduSelection::List(l.to_vec())
    }
}

impl From<Range<usize>> for HduSelection {
    fn from(r: Range<usize>) -> Self {
        HduSelection::Range(r)
    }
}

/// The data and normalised header of one HDU.
#[derive(Debug, Clone)]
pub struct HduPair {
    pub data: HduData,
    pub header: MetaDict,
}

/// Reads FITS files according to a [`FitsConfig`].
#[derive(Debug, Clone, Default)]
pub struct FitsReader {
    config: FitsConfig,
}

impl FitsReader {
    pub fn new(config: FitsConfig) -> FitsReader {
        FitsReader { config }
    }

    pub fn config(&self) -> &FitsConfig {
        &self.config
    }

    /// Read the selected HDUs of a file. `memmap` overrides the configured
    /// default; when mapping, uncompressed and unscaled images and table rows
    /// are left in a memory map of the file instead of being read.
    pub fn read<P: AsRef<Path>, H: Into<HduSelection>>(
        &self,
        path: P,
        hdus: H,
        memmap: Option<bool>,
    ) -> Result<Vec<HduPair>, ReadError> {
        let path = path.as_ref();
        let mut fits_fptr = fits_open(path)?;
        let memmap = memmap.unwrap_or(self.config.memmap) && is_plain_fits(path);
        let indices = select(&mut fits_fptr, hdus.into())?;
        debug!(
            "Reading HDUs [{}] of {} (memmap: {memmap})",
            indices.iter().join(", "),
            path.display()
        );

        let mut map = None;
        let mut pairs = Vec::with_capacity(indices.len());
        for i in indices {
            let hdu = fits_open_hdu(&mut fits_fptr, i)?;
            let header = fits_get_header(&mut fits_fptr, &hdu)?;
            let mapping = if memmap { Some(&mut map) } else { None };
            let data = read_data(path, &mut fits_fptr, &hdu, &header, mapping)?;
            trace!("HDU {i}: {} cards, data shape {:?}", header.len(), data.shape());
            pairs.push(HduPair {
                data,
                header: normalise(&header),
            });
        }
        Ok(pairs)
    }

    /// Read only the normalised headers of the selected HDUs.
    pub fn get_header<P: AsRef<Path>, H: Into<HduSelection>>(
        &self,
        path: P,
        hdus: H,
    ) -> Result<Vec<MetaDict>, ReadError> {
        let path = path.as_ref();
        let mut fits_fptr = fits_open(path)?;
        let indices = select(&mut fits_fptr, hdus.into())?;
        debug!(
            "Reading the headers of HDUs [{}] of {}",
            indices.iter().join(", "),
            path.display()
        );

        let mut headers = Vec::with_capacity(indices.len());
        for i in indices {
            let hdu = fits_open_hdu(&mut fits_fptr, i)?;
            let header = fits_get_header(&mut fits_fptr, &hdu)?;
            headers.push(normalise(&header));
        }
        Ok(headers)
    }
}

/// Read the selected HDUs of a file with the default configuration.
///
/// ```no_run
/// use solar_fits::{read, HduSelection};
///
/// let pairs = read("aia_171.fits", HduSelection::All, None)?;
/// for pair in &pairs {
///     println!("{:?} {:?}", pair.data.shape(), pair.header.get("TELESCOP"));
/// }
/// # Ok::<(), solar_fits::ReadError>(())
/// ```
pub fn read<P: AsRef<Path>, H: Into<HduSelection>>(
    path: P,
    hdus: H,
    memmap: Option<bool>,
) -> Result<Vec<HduPair>, ReadError> {
    FitsReader::default().read(path, hdus, memmap)
}

/// Read the normalised headers of the selected HDUs of a file with the
/// default configuration.
pub fn get_header<P: AsRef<Path>, H: Into<HduSelection>>(
    path: P,
    hdus: H,
) -> Result<Vec<MetaDict>, ReadError> {
    FitsReader::default().get_header(path, hdus)
}

fn select(fits_fptr: &mut FitsFile, hdus: HduSelection) -> Result<Vec<usize>, ReadError> {
    let num_hdus = fits_get_num_hdus(fits_fptr)?;
    hdus.indices(num_hdus)
}

/// Normalise a header and, if a wavelength unit can be worked out, record it
/// as `WAVEUNIT`.
fn normalise(header: &Header) -> MetaDict {
    let mut meta = format_comments_and_history(header);
    if let Some(waveunit) = extract_waveunit(&meta) {
        meta.insert("WAVEUNIT", waveunit);
    }
    meta
}

fn header_int(header: &Header, keyword: &str) -> Option<i64> {
    header.get(keyword).and_then(|v| v.as_i64())
}

/// The data shape described by a header, in row-major order.
fn header_shape(header: &Header) -> Vec<usize> {
    let naxis = header_int(header, "NAXIS").unwrap_or(0);
    (1..=naxis)
        .rev()
        .map(|n| header_int(header, &format!("NAXIS{n}")).unwrap_or(0).max(0) as usize)
        .collect()
}

/// Is the file on disk a plain FITS stream? cfitsio also opens gzip and
/// other compressed files, and its HDU offsets are then offsets into the
/// decompressed stream, so such files can't be mapped.
fn is_plain_fits(path: &Path) -> bool {
    let mut magic = [0; 6];
    let plain = File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|()| &magic == b"SIMPLE")
        .unwrap_or(false);
    if !plain {
        debug!("{} is not a plain FITS file; reading it into memory", path.display());
    }
    plain
}

/// The shared map of the whole file, creating it on first use.
fn get_map(path: &Path, map: &mut Option<Arc<Mmap>>) -> Result<Arc<Mmap>, ReadError> {
    if let Some(m) = map {
        return Ok(Arc::clone(m));
    }
    debug!("Memory mapping {}", path.display());
    let file = File::open(path)?;
    let m = Arc::new(unsafe { Mmap::map(&file)? });
    *map = Some(Arc::clone(&m));
    Ok(m)
}

/// Read (or map) the data unit of the current HDU. `map` is `None` when
/// nothing should be memory mapped.
fn read_data(
    path: &Path,
    fits_fptr: &mut FitsFile,
    hdu: &fitsio::hdu::FitsHdu,
    header: &Header,
    map: Option<&mut Option<Arc<Mmap>>>,
) -> Result<HduData, ReadError> {
    let hdu_num = hdu.number;
    let shape = header_shape(header);

    match &hdu.info {
        HduInfo::ImageInfo { .. } => {
            if shape.is_empty() {
                return Ok(HduData::Empty);
            }

            let bitpix = header_int(header, "BITPIX").unwrap_or(0);
            let bscale = header.get("BSCALE").and_then(|v| v.as_f64()).unwrap_or(1.0);
            let bzero = header.get("BZERO").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let pixel_type = PixelType::from_header(bitpix, bscale, bzero)
                .ok_or(ReadError::BadBitpix { hdu_num, bitpix })?;

            let scaled = bscale != 1.0 || bzero != 0.0;
            let mappable = match map {
                Some(_) if scaled => {
                    debug!("HDU {hdu_num} is scaled; reading it into memory");
                    None
                }
                Some(_) if fits_is_compressed_image(fits_fptr, hdu)? => {
                    debug!("HDU {hdu_num} is a compressed image; reading it into memory");
                    None
                }
                m => m,
            };

            let image = match mappable {
                Some(map) => {
                    let offsets = fits_get_hdu_offsets(fits_fptr, hdu)?;
                    let map = get_map(path, map)?;
                    let mapped = MappedImage::new(map, offsets.data_start, pixel_type, shape)
                        .ok_or(ReadError::Truncated { hdu_num })?;
                    ImageData::Mapped(mapped)
                }
                None => {
                    ImageData::InMemory(fits_get_image(fits_fptr, hdu, pixel_type, &shape)?)
                }
            };
            Ok(HduData::Image(image))
        }

        HduInfo::TableInfo { .. } => {
            let (num_rows, row_len) = match shape.as_slice() {
                [num_rows, row_len] => (*num_rows, *row_len),
                _ => (0, 0),
            };
            let num_bytes = num_rows * row_len;
            let bytes = match map {
                Some(map) => {
                    let offsets = fits_get_hdu_offsets(fits_fptr, hdu)?;
                    if offsets.data_start + num_bytes > offsets.data_end {
                        return Err(ReadError::Truncated { hdu_num });
                    }
                    let map = get_map(path, map)?;
                    let region = MappedRegion::new(map, offsets.data_start, num_bytes)
                        .ok_or(ReadError::Truncated { hdu_num })?;
                    ByteStorage::Mapped(region)
                }
                None => ByteStorage::Owned(fits_get_table_bytes(fits_fptr, hdu, num_bytes)?),
            };
            Ok(HduData::Table(TableData {
                num_rows,
                row_len,
                bytes,
            }))
        }

        HduInfo::AnyInfo => Ok(HduData::Empty),
    }
}
