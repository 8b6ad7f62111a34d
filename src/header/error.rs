// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with parsing FITS header cards.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Header card {card_num} contains bytes that aren't printable ASCII")]
    NotAscii { card_num: usize },

    #[error("Header card {card_num} ({keyword}): string value is missing its closing quote")]
    UnterminatedString { card_num: usize, keyword: String },

    #[error("Header card {card_num} ({keyword}): couldn't parse value '{value}'")]
    BadValue {
        card_num: usize,
        keyword: String,
        value: String,
    },
}

#[derive(Error, Debug)]
pub enum HeaderFileError {
    #[error("Couldn't parse the header in {file}: {err}")]
    Card { file: PathBuf, err: CardError },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
