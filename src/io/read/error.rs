// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading FITS files.

use thiserror::Error;

use super::fits::FitsError;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Requested HDU {index}, but the file only has {num_hdus} HDUs")]
    HduOutOfRange { index: usize, num_hdus: usize },

    #[error("HDU {hdu_num} has an invalid BITPIX ({bitpix})")]
    BadBitpix { hdu_num: usize, bitpix: i64 },

    #[error("HDU {hdu_num}: the data unit described by the header lies outside the file")]
    Truncated { hdu_num: usize },

    #[error(transparent)]
    Fits(#[from] FitsError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
