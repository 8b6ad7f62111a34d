// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions for writing FITS files. All of these act on the current
//! HDU of the file.

use std::{
    ffi::{c_long, CString},
    path::Path,
};

use fitsio::FitsFile;
use log::trace;
use ndarray::ArrayD;

use super::{CompressionAlgorithm, CompressionSettings, QuantizeMethod, WriteError};
use crate::{
    data::{ImageArray, PixelType},
    header::Card,
    io::read::{fits::fits_check_status, FitsError},
    meta::MetaValue,
};

/// Create a new fits file with an empty primary HDU.
#[track_caller]
pub(crate) fn fits_create<P: AsRef<Path>>(file: P) -> Result<FitsFile, FitsError> {
    let caller = std::panic::Location::caller();
    FitsFile::create(file.as_ref()).open().map_err(|e| FitsError::Open {
        fits_error: Box::new(e),
        fits_filename: file.as_ref().to_path_buf().into_boxed_path(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    })
}

/// The cfitsio `BITPIX` code used to create an image of this type. The
/// unsigned 16- and 32-bit and signed 8-bit codes make cfitsio write the
/// matching `BZERO`.
fn cfitsio_bitpix(pixel_type: PixelType) -> i32 {
    match pixel_type {
        PixelType::U8 => 8,
        PixelType::I8 => 10,
        PixelType::I16 => 16,
        PixelType::U16 => 20,
        PixelType::I32 => 32,
        PixelType::U32 => 40,
        PixelType::I64 => 64,
        PixelType::F32 => -32,
        PixelType::F64 => -64,
    }
}

/// `NAXISn` values, `NAXIS1` first.
fn naxes(shape: &[usize]) -> Vec<i64> {
    shape.iter().rev().map(|&n| n as i64).collect()
}

/// Give the (empty) primary HDU the type and shape of an image.
#[track_caller]
pub(crate) fn fits_resize_primary(
    fits_fptr: &mut FitsFile,
    pixel_type: PixelType,
    shape: &[usize],
) -> Result<(), FitsError> {
    let mut naxes = naxes(shape);
    let mut status = 0;
    unsafe {
        // ffrsimll = fits_resize_imgll
        fitsio_sys::ffrsimll(
            fits_fptr.as_raw(),            /* I - FITS file pointer           */
            cfitsio_bitpix(pixel_type),    /* I - bits per pixel              */
            naxes.len() as i32,            /* I - number of axes in the array */
            naxes.as_mut_ptr(),            /* I - size of each axis           */
            &mut status,                   /* IO - error status               */
        );
    }
    fits_check_status(fits_fptr, 0, status)
}

/// Append an image HDU to the file. If compression has been requested with
/// [`fits_set_compression`], it is a tile-compressed image.
#[track_caller]
pub(crate) fn fits_create_image(
    fits_fptr: &mut FitsFile,
    hdu_num: usize,
    pixel_type: PixelType,
    shape: &[usize],
) -> Result<(), FitsError> {
    let mut naxes = naxes(shape);
    let mut status = 0;
    unsafe {
        // ffcrimll = fits_create_imgll
        fitsio_sys::ffcrimll(
            fits_fptr.as_raw(),            /* I - FITS file pointer           */
            cfitsio_bitpix(pixel_type),    /* I - bits per pixel              */
            naxes.len() as i32,            /* I - number of axes in the array */
            naxes.as_mut_ptr(),            /* I - size of each axis           */
            &mut status,                   /* IO - error status               */
        );
    }
    fits_check_status(fits_fptr, hdu_num, status)
}

/// Request that the next image HDU created is tile compressed with these
/// settings.
#[track_caller]
pub(crate) fn fits_set_compression(
    fits_fptr: &mut FitsFile,
    hdu_num: usize,
    settings: &CompressionSettings,
) -> Result<(), FitsError> {
    let compression_type = match settings.algorithm {
        CompressionAlgorithm::Rice => 11,
        CompressionAlgorithm::Gzip1 => 21,
        CompressionAlgorithm::Gzip2 => 22,
        CompressionAlgorithm::Plio => 31,
        CompressionAlgorithm::Hcompress => 41,
        CompressionAlgorithm::None => -1,
    };
    let quantize_method = match settings.quantize_method {
        QuantizeMethod::NoDither => -1,
        QuantizeMethod::SubtractiveDither1 => 1,
        QuantizeMethod::SubtractiveDither2 => 2,
    };

    let mut status = 0;
    unsafe {
        let fptr = fits_fptr.as_raw();
        fitsio_sys::fits_set_compression_type(fptr, compression_type, &mut status);
        fitsio_sys::fits_set_quantize_level(fptr, settings.quantize_level, &mut status);
        fitsio_sys::fits_set_quantize_method(fptr, quantize_method, &mut status);
        fitsio_sys::fits_set_dither_seed(fptr, settings.dither_seed, &mut status);
        if let Some(tile_shape) = &settings.tile_shape {
            let mut tile_dims: Vec<c_long> = tile_shape.iter().rev().map(|&n| n as c_long).collect();
            fitsio_sys::fits_set_tile_dim(
                fptr,
                tile_dims.len() as i32,
                tile_dims.as_mut_ptr(),
                &mut status,
            );
        }
        if settings.algorithm == CompressionAlgorithm::Hcompress {
            fitsio_sys::fits_set_hcomp_scale(fptr, settings.hcomp_scale, &mut status);
            fitsio_sys::fits_set_hcomp_smooth(fptr, i32::from(settings.hcomp_smooth), &mut status);
        }
    }
    fits_check_status(fits_fptr, hdu_num, status)
}

/// Write a header card, replacing a value card with the same keyword.
#[track_caller]
pub(crate) fn fits_write_card(
    fits_fptr: &mut FitsFile,
    hdu_num: usize,
    card: &Card,
) -> Result<(), WriteError> {
    let mut status = 0;
    match card {
        Card::Value {
            keyword,
            value,
            comment,
        } => {
            trace!("Writing {keyword} = {value}");
            let key_name = CString::new(keyword.as_str())?;
            let comment = CString::new(comment.as_deref().unwrap_or(""))?;
            unsafe {
                let fptr = fits_fptr.as_raw();
                match value {
                    MetaValue::String(s) => {
                        let value = CString::new(s.as_str())?;
                        // ffukls = fits_update_key_longstr
                        fitsio_sys::ffukls(
                            fptr,
                            key_name.as_ptr(),
                            value.as_ptr(),
                            comment.as_ptr(),
                            &mut status,
                        );
                    }
                    MetaValue::Integer(i) => {
                        // ffukyj = fits_update_key_lng
                        fitsio_sys::ffukyj(fptr, key_name.as_ptr(), *i, comment.as_ptr(), &mut status);
                    }
                    MetaValue::Float(f) => {
                        // ffukyd = fits_update_key_dbl; a negative number of
                        // decimals picks the shorter of fixed and exponential
                        // format.
                        fitsio_sys::ffukyd(
                            fptr,
                            key_name.as_ptr(),
                            *f,
                            -15,
                            comment.as_ptr(),
                            &mut status,
                        );
                    }
                    MetaValue::Bool(b) => {
                        // ffukyl = fits_update_key_log
                        fitsio_sys::ffukyl(
                            fptr,
                            key_name.as_ptr(),
                            i32::from(*b),
                            comment.as_ptr(),
                            &mut status,
                        );
                    }
                    MetaValue::Undefined => {
                        // ffukyu = fits_update_key_null
                        fitsio_sys::ffukyu(fptr, key_name.as_ptr(), comment.as_ptr(), &mut status);
                    }
                }
            }
        }

        Card::Commentary { keyword, text } => {
            trace!("Writing {keyword} {text}");
            unsafe {
                let fptr = fits_fptr.as_raw();
                match keyword.as_str() {
                    "COMMENT" => {
                        let text = CString::new(text.as_str())?;
                        // ffpcom = fits_write_comment
                        fitsio_sys::ffpcom(fptr, text.as_ptr(), &mut status);
                    }
                    "HISTORY" => {
                        let text = CString::new(text.as_str())?;
                        // ffphis = fits_write_history
                        fitsio_sys::ffphis(fptr, text.as_ptr(), &mut status);
                    }
                    _ => {
                        for image in card.images() {
                            let image = CString::new(image)?;
                            // ffprec = fits_write_record
                            fitsio_sys::ffprec(fptr, image.as_ptr(), &mut status);
                        }
                    }
                }
            }
        }
    }
    fits_check_status(fits_fptr, hdu_num, status)?;
    Ok(())
}

/// Write all of an image's pixels into the current image HDU, which must
/// have the same type and shape.
#[track_caller]
pub(crate) fn fits_write_image(
    fits_fptr: &mut FitsFile,
    hdu_num: usize,
    data: &ImageArray,
) -> Result<(), FitsError> {
    match data {
        ImageArray::U8(a) => write_pixels(fits_fptr, hdu_num, fitsio_sys::TBYTE, a),
        ImageArray::I8(a) => write_pixels(fits_fptr, hdu_num, fitsio_sys::TSBYTE, a),
        ImageArray::I16(a) => write_pixels(fits_fptr, hdu_num, fitsio_sys::TSHORT, a),
        ImageArray::U16(a) => write_pixels(fits_fptr, hdu_num, fitsio_sys::TUSHORT, a),
        ImageArray::I32(a) => write_pixels(fits_fptr, hdu_num, fitsio_sys::TINT, a),
        ImageArray::U32(a) => write_pixels(fits_fptr, hdu_num, fitsio_sys::TUINT, a),
        ImageArray::I64(a) => write_pixels(fits_fptr, hdu_num, fitsio_sys::TLONGLONG, a),
        ImageArray::F32(a) => write_pixels(fits_fptr, hdu_num, fitsio_sys::TFLOAT, a),
        ImageArray::F64(a) => write_pixels(fits_fptr, hdu_num, fitsio_sys::TDOUBLE, a),
    }
}

#[track_caller]
fn write_pixels<T: Copy>(
    fits_fptr: &mut FitsFile,
    hdu_num: usize,
    datatype: u32,
    array: &ArrayD<T>,
) -> Result<(), FitsError> {
    // Row-major order regardless of the array's memory layout.
    let mut pixels: Vec<T> = array.iter().copied().collect();
    if pixels.is_empty() {
        return Ok(());
    }

    let mut status = 0;
    unsafe {
        // ffppr = fits_write_img
        fitsio_sys::ffppr(
            fits_fptr.as_raw(),          /* I - FITS file pointer                */
            datatype as _,               /* I - datatype of the array            */
            1,                           /* I - first vector element to write    */
            pixels.len() as i64,         /* I - number of values to write        */
            pixels.as_mut_ptr().cast(),  /* I - array of values that are written */
            &mut status,                 /* IO - error status                    */
        );
    }
    fits_check_status(fits_fptr, hdu_num, status)
}

/// Write `CHECKSUM` and `DATASUM` to the current HDU.
#[track_caller]
pub(crate) fn fits_write_checksum(fits_fptr: &mut FitsFile, hdu_num: usize) -> Result<(), FitsError> {
    let mut status = 0;
    unsafe {
        // ffpcks = fits_write_chksum
        fitsio_sys::ffpcks(fits_fptr.as_raw(), &mut status);
    }
    fits_check_status(fits_fptr, hdu_num, status)
}
