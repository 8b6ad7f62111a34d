// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all solar_fits-related errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolarFitsError {
    #[error("{0}")]
    Read(#[from] crate::io::read::ReadError),

    #[error("{0}")]
    Write(#[from] crate::io::write::WriteError),

    #[error("{0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("{0}")]
    HeaderFile(#[from] crate::header::HeaderFileError),

    #[error("{0}")]
    Card(#[from] crate::header::CardError),
}
