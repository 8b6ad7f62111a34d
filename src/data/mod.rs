// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Containers for the data units of HDUs.
//!
//! Image data is either decoded into an [`ndarray`] array or left as raw
//! big-endian bytes inside a shared memory map of the file. Arrays are in C
//! (row-major) order; the first axis is `NAXISn` and the last is `NAXIS1`.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};
use memmap2::Mmap;
use ndarray::{ArrayD, IxDyn};

/// The Rust type pixels are presented as, following the FITS rules for
/// equivalent data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    U8,
    I8,
    I16,
    U16,
    I32,
    U32,
    I64,
    F32,
    F64,
}

impl PixelType {
    /// The type of the physical values of an image with these `BITPIX`,
    /// `BSCALE` and `BZERO` values. `None` for an invalid `BITPIX`.
    pub fn from_header(bitpix: i64, bscale: f64, bzero: f64) -> Option<PixelType> {
        let raw = match bitpix {
            8 => PixelType::U8,
            16 => PixelType::I16,
            32 => PixelType::I32,
            64 => PixelType::I64,
            -32 => PixelType::F32,
            -64 => PixelType::F64,
            _ => return None,
        };
        if bscale == 1.0 && bzero == 0.0 {
            return Some(raw);
        }

        let pixel_type = match (raw, bscale == 1.0) {
            (PixelType::U8, true) if bzero == -128.0 => PixelType::I8,
            (PixelType::I16, true) if bzero == 32768.0 => PixelType::U16,
            (PixelType::I32, true) if bzero == 2147483648.0 => PixelType::U32,
            (PixelType::U8 | PixelType::I16, _) => PixelType::F32,
            _ => PixelType::F64,
        };
        Some(pixel_type)
    }

    /// The `BITPIX` of the stored values for this type.
    pub fn bitpix(self) -> i64 {
        match self {
            PixelType::U8 | PixelType::I8 => 8,
            PixelType::I16 | PixelType::U16 => 16,
            PixelType::I32 | PixelType::U32 => 32,
            PixelType::I64 => 64,
            PixelType::F32 => -32,
            PixelType::F64 => -64,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        (self.bitpix().unsigned_abs() / 8) as usize
    }
}

/// An in-memory image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageArray {
    U8(ArrayD<u8>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    U16(ArrayD<u16>),
    I32(ArrayD<i32>),
    U32(ArrayD<u32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl ImageArray {
    pub fn shape(&self) -> &[usize] {
        match self {
            ImageArray::U8(a) => a.shape(),
            ImageArray::I8(a) => a.shape(),
            ImageArray::I16(a) => a.shape(),
            ImageArray::U16(a) => a.shape(),
            ImageArray::I32(a) => a.shape(),
            ImageArray::U32(a) => a.shape(),
            ImageArray::I64(a) => a.shape(),
            ImageArray::F32(a) => a.shape(),
            ImageArray::F64(a) => a.shape(),
        }
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pixel_type(&self) -> PixelType {
        match self {
            ImageArray::U8(_) => PixelType::U8,
            ImageArray::I8(_) => PixelType::I8,
            ImageArray::I16(_) => PixelType::I16,
            ImageArray::U16(_) => PixelType::U16,
            ImageArray::I32(_) => PixelType::I32,
            ImageArray::U32(_) => PixelType::U32,
            ImageArray::I64(_) => PixelType::I64,
            ImageArray::F32(_) => PixelType::F32,
            ImageArray::F64(_) => PixelType::F64,
        }
    }

    /// Every pixel as an `f64`, in row-major order.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            ImageArray::U8(a) => a.mapv(f64::from),
            ImageArray::I8(a) => a.mapv(f64::from),
            ImageArray::I16(a) => a.mapv(f64::from),
            ImageArray::U16(a) => a.mapv(f64::from),
            ImageArray::I32(a) => a.mapv(f64::from),
            ImageArray::U32(a) => a.mapv(f64::from),
            ImageArray::I64(a) => a.mapv(|v| v as f64),
            ImageArray::F32(a) => a.mapv(f64::from),
            ImageArray::F64(a) => a.clone(),
        }
    }
}

macro_rules! image_array_from {
    ($t:ty, $variant:ident) => {
        impl From<ArrayD<$t>> for ImageArray {
            fn from(a: ArrayD<$t>) -> Self {
                ImageArray::$variant(a)
            }
        }
    };
}

image_array_from!(u8, U8);
image_array_from!(i8, I8);
image_array_from!(i16, I16);
image_array_from!(u16, U16);
image_array_from!(i32, I32);
image_array_from!(u32, U32);
image_array_from!(i64, I64);
image_array_from!(f32, F32);
image_array_from!(f64, F64);

/// A contiguous byte range of a memory-mapped file.
#[derive(Debug, Clone)]
pub struct MappedRegion {
    map: Arc<Mmap>,
    offset: usize,
    len: usize,
}

impl MappedRegion {
    /// `None` if the range doesn't fit inside the map.
    pub(crate) fn new(map: Arc<Mmap>, offset: usize, len: usize) -> Option<MappedRegion> {
        let end = offset.checked_add(len)?;
        if end > map.len() {
            return None;
        }
        Some(MappedRegion { map, offset, len })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.map[self.offset..self.offset + self.len]
    }
}

/// Image pixels left in place inside a memory-mapped file.
#[derive(Debug, Clone)]
pub struct MappedImage {
    region: MappedRegion,
    pixel_type: PixelType,
    shape: Vec<usize>,
}

impl MappedImage {
    /// `None` if the pixels don't fit inside the map.
    pub(crate) fn new(
        map: Arc<Mmap>,
        offset: usize,
        pixel_type: PixelType,
        shape: Vec<usize>,
    ) -> Option<MappedImage> {
        let len = shape.iter().product::<usize>() * pixel_type.bytes_per_pixel();
        let region = MappedRegion::new(map, offset, len)?;
        Some(MappedImage {
            region,
            pixel_type,
            shape,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// The raw big-endian pixel bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.region.as_bytes()
    }

    /// Decode the pixel at a (row-major) index. `None` if the index has the
    /// wrong number of axes or is out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0;
        for (&i, &n) in index.iter().zip(self.shape.iter()) {
            if i >= n {
                return None;
            }
            flat = flat * n + i;
        }

        let size = self.pixel_type.bytes_per_pixel();
        let b = &self.as_bytes()[flat * size..(flat + 1) * size];
        let value = match self.pixel_type {
            PixelType::U8 => f64::from(b[0]),
            PixelType::I8 => f64::from(b[0] as i8),
            PixelType::I16 => f64::from(BigEndian::read_i16(b)),
            PixelType::U16 => f64::from(BigEndian::read_u16(b)),
            PixelType::I32 => f64::from(BigEndian::read_i32(b)),
            PixelType::U32 => f64::from(BigEndian::read_u32(b)),
            PixelType::I64 => BigEndian::read_i64(b) as f64,
            PixelType::F32 => f64::from(BigEndian::read_f32(b)),
            PixelType::F64 => BigEndian::read_f64(b),
        };
        Some(value)
    }

    /// Decode every pixel into memory.
    pub fn to_array(&self) -> ImageArray {
        let bytes = self.as_bytes();
        let n = bytes.len() / self.pixel_type.bytes_per_pixel();
        let dim = IxDyn(&self.shape);
        // The lengths always agree with the shape, so building the arrays
        // can't fail.
        match self.pixel_type {
            PixelType::U8 => ImageArray::U8(from_vec(dim, bytes.to_vec())),
            PixelType::I8 => {
                ImageArray::I8(from_vec(dim, bytes.iter().map(|&b| b as i8).collect()))
            }
            PixelType::I16 => {
                let mut v = vec![0; n];
                BigEndian::read_i16_into(bytes, &mut v);
                ImageArray::I16(from_vec(dim, v))
            }
            PixelType::U16 => {
                let mut v = vec![0; n];
                BigEndian::read_u16_into(bytes, &mut v);
                ImageArray::U16(from_vec(dim, v))
            }
            PixelType::I32 => {
                let mut v = vec![0; n];
                BigEndian::read_i32_into(bytes, &mut v);
                ImageArray::I32(from_vec(dim, v))
            }
            PixelType::U32 => {
                let mut v = vec![0; n];
                BigEndian::read_u32_into(bytes, &mut v);
                ImageArray::U32(from_vec(dim, v))
            }
            PixelType::I64 => {
                let mut v = vec![0; n];
                BigEndian::read_i64_into(bytes, &mut v);
                ImageArray::I64(from_vec(dim, v))
            }
            PixelType::F32 => {
                let mut v = vec![0.0; n];
                BigEndian::read_f32_into(bytes, &mut v);
                ImageArray::F32(from_vec(dim, v))
            }
            PixelType::F64 => {
                let mut v = vec![0.0; n];
                BigEndian::read_f64_into(bytes, &mut v);
                ImageArray::F64(from_vec(dim, v))
            }
        }
    }
}

pub(crate) fn from_vec<T>(dim: IxDyn, v: Vec<T>) -> ArrayD<T> {
    ArrayD::from_shape_vec(dim, v).unwrap()
}

#[derive(Debug, Clone)]
pub enum ImageData {
    InMemory(ImageArray),
    Mapped(MappedImage),
}

impl ImageData {
    pub fn shape(&self) -> &[usize] {
        match self {
            ImageData::InMemory(a) => a.shape(),
            ImageData::Mapped(m) => m.shape(),
        }
    }

    /// The pixels in memory, decoding them if they are mapped.
    pub fn to_array(&self) -> ImageArray {
        match self {
            ImageData::InMemory(a) => a.clone(),
            ImageData::Mapped(m) => m.to_array(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ByteStorage {
    Owned(Vec<u8>),
    Mapped(MappedRegion),
}

impl ByteStorage {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ByteStorage::Owned(v) => v,
            ByteStorage::Mapped(r) => r.as_bytes(),
        }
    }
}

/// The raw rows of an ASCII or binary table HDU. Columns are not decoded.
#[derive(Debug, Clone)]
pub struct TableData {
    pub num_rows: usize,

    /// The length of a row in bytes (`NAXIS1`).
    pub row_len: usize,

    pub bytes: ByteStorage,
}

impl TableData {
    /// The bytes of one row, if it exists.
    pub fn row(&self, i: usize) -> Option<&[u8]> {
        if i >= self.num_rows {
            return None;
        }
        self.bytes
            .as_bytes()
            .get(i * self.row_len..(i + 1) * self.row_len)
    }
}

/// The data unit of one HDU.
#[derive(Debug, Clone)]
pub enum HduData {
    /// No data (e.g. a primary HDU with `NAXIS = 0`).
    Empty,
    Image(ImageData),
    Table(TableData),
}

impl HduData {
    pub fn is_memory_mapped(&self) -> bool {
        matches!(
            self,
            HduData::Image(ImageData::Mapped(_))
                | HduData::Table(TableData {
                    bytes: ByteStorage::Mapped(_),
                    ..
                })
        )
    }

    /// The image shape, or `[NAXIS2, NAXIS1]` for tables.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            HduData::Empty => vec![],
            HduData::Image(i) => i.shape().to_vec(),
            HduData::Table(t) => vec![t.num_rows, t.row_len],
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            HduData::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableData> {
        match self {
            HduData::Table(t) => Some(t),
            _ => None,
        }
    }
}
