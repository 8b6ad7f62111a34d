// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `MetaDict` -> header cards.

use log::warn;

use super::{card::KEYWORD_LEN, Card, Header, MetadataWarning};
use crate::meta::{MetaDict, MetaValue};

/// The result of converting a [`MetaDict`] into a [`Header`]: the header that
/// could be built, and a warning for every entry that had to be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Denormalised {
    pub header: Header,
    pub warnings: Vec<MetadataWarning>,
}

/// Convert a [`MetaDict`] into a FITS-legal [`Header`].
///
/// Entries that can't be represented are dropped and reported (and logged),
/// never raised:
///
/// - keys longer than 8 characters;
/// - keys with characters other than `A-Z`, `0-9`, `-` and `_`;
/// - values that aren't printable ASCII;
/// - NaN floats.
///
/// `COMMENT` and `HISTORY` are split on newlines into
/// individual commentary cards. Key comments are attached to the cards that
/// survived.
pub fn header_to_fits(meta: &MetaDict) -> Denormalised {
    header_from_meta(meta, true)
}

pub(crate) fn header_from_meta(meta: &MetaDict, log_warnings: bool) -> Denormalised {
    let mut header = Header::new();
    let mut warnings = vec![];

    for (key, value) in meta.iter() {
        if let Some(w) = check_entry(key, value) {
            if log_warnings {
                warn!("{w}");
            }
            warnings.push(w);
            continue;
        }

        let keyword = key.to_ascii_uppercase();
        match keyword.as_str() {
            "COMMENT" => push_commentary(&mut header, "COMMENT", value),
            "HISTORY" => push_commentary(&mut header, "HISTORY", value),
            _ => header.push(Card::value(keyword, value.clone())),
        }
    }

    for (key, comment) in meta.key_comments() {
        // Comments for keys that weren't written are ignored.
        header.set_comment(key, comment);
    }

    Denormalised { header, warnings }
}

/// The first reason this entry can't be written, if any.
fn check_entry(key: &str, value: &MetaValue) -> Option<MetadataWarning> {
    if key.len() > KEYWORD_LEN {
        return Some(MetadataWarning::TooLong {
            key: key.to_string(),
        });
    }
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Some(MetadataWarning::InvalidKeyword {
            key: key.to_string(),
        });
    }

    let text = value.to_string();
    let printable = match key.to_ascii_uppercase().as_str() {
        "COMMENT" | "HISTORY" => text.split('\n').all(is_printable_ascii),
        _ => is_printable_ascii(&text),
    };
    if !printable {
        return Some(MetadataWarning::NotAscii {
            key: key.to_string(),
        });
    }

    if value.is_nan() {
        return Some(MetadataWarning::NaN {
            key: key.to_string(),
        });
    }
    if matches!(value, MetaValue::Float(f) if f.is_infinite()) {
        return Some(MetadataWarning::Infinite {
            key: key.to_string(),
        });
    }

    None
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7e).contains(&b))
}

fn push_commentary(header: &mut Header, keyword: &str, value: &MetaValue) {
    let text = value.to_string();
    if text.is_empty() {
        return;
    }
    for line in text.split('\n') {
        header.push(Card::commentary(keyword, line));
    }
}
