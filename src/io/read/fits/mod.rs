// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions for reading FITS files.

mod error;

pub use error::FitsError;

use std::{
    ffi::{c_char, CStr},
    fmt::Display,
    ptr,
};

use fitsio::{hdu::*, FitsFile};
use ndarray::{ArrayD, IxDyn};

use crate::{
    data::{ImageArray, PixelType},
    header::Header,
};

/// Open a fits file.
#[track_caller]
pub(crate) fn fits_open<P: AsRef<std::path::Path>>(file: P) -> Result<FitsFile, FitsError> {
    // Closures don't carry `#[track_caller]`.
    let caller = std::panic::Location::caller();
    FitsFile::open(file.as_ref()).map_err(|e| FitsError::Open {
        fits_error: Box::new(e),
        fits_filename: file.as_ref().to_path_buf().into_boxed_path(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    })
}

/// Open a fits file's HDU. This also makes it the current HDU for raw cfitsio
/// calls.
#[track_caller]
pub(crate) fn fits_open_hdu<T: DescribesHdu + Display + Copy>(
    fits_fptr: &mut FitsFile,
    hdu_description: T,
) -> Result<FitsHdu, FitsError> {
    match fits_fptr.hdu(hdu_description) {
        Ok(hdu) => Ok(hdu),
        Err(e) => Err(fitsio_error(fits_fptr, hdu_description, e)),
    }
}

/// Wrap an error from the fitsio crate, recording where it happened.
#[track_caller]
pub(crate) fn fitsio_error<T: Display>(
    fits_fptr: &FitsFile,
    hdu_description: T,
    fits_error: fitsio::errors::Error,
) -> FitsError {
    let caller = std::panic::Location::caller();
    FitsError::Fitsio {
        fits_error: Box::new(fits_error),
        fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
        hdu_description: format!("{hdu_description}").into_boxed_str(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    }
}

/// Turn the status of a raw cfitsio call into a result.
#[track_caller]
pub(crate) fn fits_check_status<T: Display>(
    fits_fptr: &FitsFile,
    hdu_description: T,
    status: i32,
) -> Result<(), FitsError> {
    match fitsio::errors::check_status(status) {
        Ok(()) => Ok(()),
        Err(e) => Err(fitsio_error(fits_fptr, hdu_description, e)),
    }
}

/// The total number of HDUs in the file.
#[track_caller]
pub(crate) fn fits_get_num_hdus(fits_fptr: &mut FitsFile) -> Result<usize, FitsError> {
    let mut num_hdus = 0;
    let mut status = 0;
    unsafe {
        // ffthdu = fits_get_num_hdus
        fitsio_sys::ffthdu(fits_fptr.as_raw(), &mut num_hdus, &mut status);
    }
    fits_check_status(fits_fptr, "all", status)?;
    Ok(num_hdus as usize)
}

/// Read all of the header cards of a HDU. For a tile-compressed image, this
/// is the header of the uncompressed image, not of the binary table storing
/// it.
#[track_caller]
pub(crate) fn fits_get_header(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
) -> Result<Header, FitsError> {
    // Make sure the HDU is current.
    let hdu = fits_open_hdu(fits_fptr, hdu.number)?;

    let mut status = 0;
    let mut num_keys = 0;
    let mut header_ptr: *mut c_char = ptr::null_mut();
    let bytes = unsafe {
        // ffcnvthdr2str = fits_convert_hdr2str
        fitsio_sys::ffcnvthdr2str(
            fits_fptr.as_raw(),
            0,
            ptr::null_mut(),
            0,
            &mut header_ptr,
            &mut num_keys,
            &mut status,
        );
        let bytes = if status == 0 && !header_ptr.is_null() {
            Some(CStr::from_ptr(header_ptr).to_bytes().to_vec())
        } else {
            None
        };
        if !header_ptr.is_null() {
            // fffree = fits_free_memory
            fitsio_sys::fffree(header_ptr.cast(), &mut 0);
        }
        bytes
    };
    fits_check_status(fits_fptr, hdu.number, status)?;

    let caller = std::panic::Location::caller();
    Header::parse(&bytes.unwrap_or_default()).map_err(|err| {
        FitsError::Card {
            err,
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_num: hdu.number,
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }
    })
}

/// Byte offsets of a HDU within its file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HduOffsets {
    pub(crate) data_start: usize,
    pub(crate) data_end: usize,
}

#[track_caller]
pub(crate) fn fits_get_hdu_offsets(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
) -> Result<HduOffsets, FitsError> {
    let hdu = fits_open_hdu(fits_fptr, hdu.number)?;

    let mut header_start = 0;
    let mut data_start = 0;
    let mut data_end = 0;
    let mut status = 0;
    unsafe {
        // ffghadll = fits_get_hduaddrll
        fitsio_sys::ffghadll(
            fits_fptr.as_raw(),
            &mut header_start,
            &mut data_start,
            &mut data_end,
            &mut status,
        );
    }
    fits_check_status(fits_fptr, hdu.number, status)?;
    Ok(HduOffsets {
        data_start: data_start as usize,
        data_end: data_end as usize,
    })
}

#[track_caller]
pub(crate) fn fits_is_compressed_image(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
) -> Result<bool, FitsError> {
    let hdu = fits_open_hdu(fits_fptr, hdu.number)?;

    let mut status = 0;
    let compressed = unsafe { fitsio_sys::fits_is_compressed_image(fits_fptr.as_raw(), &mut status) };
    fits_check_status(fits_fptr, hdu.number, status)?;
    Ok(compressed != 0)
}

/// Given a FITS file pointer and an image HDU, read the image's physical
/// values (i.e. with `BSCALE` and `BZERO` applied) as the given type.
/// `shape` is in row-major order.
#[track_caller]
pub(crate) fn fits_get_image(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    pixel_type: PixelType,
    shape: &[usize],
) -> Result<ImageArray, FitsError> {
    if !matches!(hdu.info, HduInfo::ImageInfo { .. }) {
        let caller = std::panic::Location::caller();
        return Err(FitsError::NotImage {
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_num: hdu.number,
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        });
    }
    let hdu = fits_open_hdu(fits_fptr, hdu.number)?;

    let image = match pixel_type {
        PixelType::U8 => ImageArray::U8(read_pixels(fits_fptr, &hdu, fitsio_sys::TBYTE, shape)?),
        PixelType::I8 => ImageArray::I8(read_pixels(fits_fptr, &hdu, fitsio_sys::TSBYTE, shape)?),
        PixelType::I16 => {
            ImageArray::I16(read_pixels(fits_fptr, &hdu, fitsio_sys::TSHORT, shape)?)
        }
        PixelType::U16 => {
            ImageArray::U16(read_pixels(fits_fptr, &hdu, fitsio_sys::TUSHORT, shape)?)
        }
        PixelType::I32 => ImageArray::I32(read_pixels(fits_fptr, &hdu, fitsio_sys::TINT, shape)?),
        PixelType::U32 => {
            ImageArray::U32(read_pixels(fits_fptr, &hdu, fitsio_sys::TUINT, shape)?)
        }
        PixelType::I64 => {
            ImageArray::I64(read_pixels(fits_fptr, &hdu, fitsio_sys::TLONGLONG, shape)?)
        }
        PixelType::F32 => {
            ImageArray::F32(read_pixels(fits_fptr, &hdu, fitsio_sys::TFLOAT, shape)?)
        }
        PixelType::F64 => {
            ImageArray::F64(read_pixels(fits_fptr, &hdu, fitsio_sys::TDOUBLE, shape)?)
        }
    };
    Ok(image)
}

#[track_caller]
fn read_pixels<T: Default + Clone>(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    datatype: u32,
    shape: &[usize],
) -> Result<ArrayD<T>, FitsError> {
    let num_pixels = shape.iter().product::<usize>();
    let mut buffer = vec![T::default(); num_pixels];
    if num_pixels > 0 {
        let mut status = 0;
        unsafe {
            // ffgpv = fits_read_img
            fitsio_sys::ffgpv(
                fits_fptr.as_raw(),
                datatype as _,
                1,
                num_pixels as i64,
                ptr::null_mut(),
                buffer.as_mut_ptr().cast(),
                ptr::null_mut(),
                &mut status,
            );
        }
        fits_check_status(fits_fptr, hdu.number, status)?;
    }
    Ok(crate::data::from_vec(IxDyn(shape), buffer))
}

/// Read the raw bytes of the rows of a table HDU.
#[track_caller]
pub(crate) fn fits_get_table_bytes(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    num_bytes: usize,
) -> Result<Vec<u8>, FitsError> {
    let hdu = fits_open_hdu(fits_fptr, hdu.number)?;

    let mut bytes = vec![0u8; num_bytes];
    if num_bytes > 0 {
        let mut status = 0;
        unsafe {
            // ffgtbb = fits_read_tblbytes
            fitsio_sys::ffgtbb(
                fits_fptr.as_raw(),
                1,
                1,
                num_bytes as i64,
                bytes.as_mut_ptr(),
                &mut status,
            );
        }
        fits_check_status(fits_fptr, hdu.number, status)?;
    }
    Ok(bytes)
}
