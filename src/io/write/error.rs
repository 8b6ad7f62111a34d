// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from writing FITS files.

use std::path::PathBuf;

use thiserror::Error;

use crate::io::read::FitsError;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("{0} already exists and overwriting was not requested")]
    FileExists(PathBuf),

    #[error("Keyword or value {0:?} contains a NUL byte")]
    Nul(String),

    #[error(transparent)]
    Fits(#[from] FitsError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl From<std::ffi::NulError> for WriteError {
    fn from(e: std::ffi::NulError) -> Self {
        WriteError::Nul(String::from_utf8_lossy(&e.into_vec()).into_owned())
    }
}
