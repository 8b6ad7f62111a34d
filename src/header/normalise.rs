// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Header cards -> `MetaDict`.

use itertools::Itertools;
use log::trace;

use super::{Card, Header};
use crate::meta::{MetaDict, MetaValue};

/// Convert a header into a [`MetaDict`].
///
/// Every value card becomes an (upper-cased) key. All COMMENT cards are
/// joined with newlines into the `COMMENT` key, and all HISTORY cards into the
/// `HISTORY` key; both keys are always present. Card comments go into the
/// key-comments sidecar. If a keyword is repeated, the last value wins.
pub fn format_comments_and_history(header: &Header) -> MetaDict {
    let mut meta = MetaDict::new();
    let mut comments = vec![];
    let mut history = vec![];

    for card in header {
        match card {
            Card::Commentary { keyword, text } => match keyword.as_str() {
                "COMMENT" => comments.push(text.as_str()),
                "HISTORY" => history.push(text.as_str()),
                "" => trace!("Dropping blank-keyword card '{text}'"),
                _ => {
                    meta.insert(keyword.to_ascii_uppercase(), text.as_str());
                }
            },

            Card::Value {
                keyword,
                value,
                comment,
            } => {
                meta.insert(keyword.to_ascii_uppercase(), value.clone());
                if let Some(c) = comment.as_deref().filter(|c| !c.is_empty()) {
                    meta.set_key_comment(keyword, c);
                }
            }
        }
    }

    meta.insert(
        "COMMENT",
        MetaValue::String(comments.iter().join("\n").trim().to_string()),
    );
    meta.insert(
        "HISTORY",
        MetaValue::String(history.iter().join("\n").trim().to_string()),
    );
    meta
}
