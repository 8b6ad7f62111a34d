// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parsing and formatting of individual 80-column header cards.

use super::CardError;
use crate::meta::MetaValue;

/// The number of bytes in a header card.
pub const CARD_LEN: usize = 80;

/// The number of columns reserved for a standard keyword.
pub const KEYWORD_LEN: usize = 8;

/// The most characters of a (quote-escaped) string that fit on one card.
const MAX_STRING_LEN: usize = 68;

/// The most characters of commentary text that fit on one card.
const COMMENTARY_LEN: usize = CARD_LEN - KEYWORD_LEN;

/// A single FITS header card.
#[derive(Debug, Clone, PartialEq)]
pub enum Card {
    /// A `KEYWORD = value / comment` card.
    Value {
        keyword: String,
        value: MetaValue,
        comment: Option<String>,
    },

    /// HISTORY, COMMENT, a blank keyword, or any other card without a value
    /// indicator.
    Commentary { keyword: String, text: String },
}

impl Card {
    pub fn value<K: Into<String>, V: Into<MetaValue>>(keyword: K, value: V) -> Card {
        Card::Value {
            keyword: keyword.into(),
            value: value.into(),
            comment: None,
        }
    }

    pub fn commentary<K: Into<String>, T: Into<String>>(keyword: K, text: T) -> Card {
        Card::Commentary {
            keyword: keyword.into(),
            text: text.into(),
        }
    }

    /// Attach a comment to a value card. Commentary cards are unchanged.
    pub fn with_comment<C: Into<String>>(mut self, new_comment: C) -> Card {
        if let Card::Value { comment, .. } = &mut self {
            *comment = Some(new_comment.into());
        }
        self
    }

    pub fn keyword(&self) -> &str {
        match self {
            Card::Value { keyword, .. } | Card::Commentary { keyword, .. } => keyword,
        }
    }

    pub fn is_commentary(&self) -> bool {
        matches!(self, Card::Commentary { .. })
    }

    /// Render this card as one or more 80-column card images. Long strings
    /// spill onto CONTINUE cards and long commentary onto repeated cards.
    pub fn images(&self) -> Vec<String> {
        match self {
            Card::Commentary { keyword, text } => {
                let chunks = chunk_chars(text, COMMENTARY_LEN);
                if chunks.is_empty() {
                    return vec![pad(keyword.clone())];
                }
                chunks
                    .into_iter()
                    .map(|chunk| pad(format!("{keyword:<KEYWORD_LEN$}{chunk}")))
                    .collect()
            }

            Card::Value {
                keyword,
                value,
                comment,
            } => {
                let prefix = if keyword.len() > KEYWORD_LEN {
                    format!("HIERARCH {keyword} = ")
                } else {
                    format!("{keyword:<KEYWORD_LEN$}= ")
                };
                let with_comment = |s: String| match comment {
                    Some(c) => format!("{s} / {c}"),
                    None => s,
                };

                match value {
                    MetaValue::String(s) => {
                        let chunks = chunk_string_value(s);
                        let last = chunks.len() - 1;
                        chunks
                            .into_iter()
                            .enumerate()
                            .map(|(i, chunk)| {
                                let lead = if i == 0 {
                                    prefix.clone()
                                } else {
                                    format!("{:<10}", "CONTINUE")
                                };
                                if i == last {
                                    pad(with_comment(format!("{lead}'{chunk:<8}'")))
                                } else {
                                    pad(format!("{lead}'{chunk}&'"))
                                }
                            })
                            .collect()
                    }
                    MetaValue::Bool(b) => {
                        let v = if *b { "T" } else { "F" };
                        vec![pad(with_comment(format!("{prefix}{v:>20}")))]
                    }
                    MetaValue::Integer(i) => {
                        vec![pad(with_comment(format!("{prefix}{i:>20}")))]
                    }
                    MetaValue::Float(f) => {
                        vec![pad(with_comment(format!("{prefix}{:>20}", format_real(*f))))]
                    }
                    MetaValue::Undefined => {
                        vec![pad(with_comment(format!("{prefix}{:20}", "")))]
                    }
                }
            }
        }
    }
}

/// A parsed card image, before long strings are stitched together.
#[derive(Debug, PartialEq)]
pub(super) enum RawCard {
    Card(Card),
    Continue {
        text: String,
        comment: Option<String>,
    },
    Blank,
    End,
}

/// Check that a card image is printable ASCII and hand it back as a `str`.
pub(super) fn ascii_image(bytes: &[u8], card_num: usize) -> Result<&str, CardError> {
    if bytes.iter().all(|b| (0x20..=0x7e).contains(b)) {
        // Printable ASCII is always valid UTF-8.
        std::str::from_utf8(bytes).map_err(|_| CardError::NotAscii { card_num })
    } else {
        Err(CardError::NotAscii { card_num })
    }
}

/// Parse a single card image. The image may be shorter than 80 columns (as
/// in text dumps of headers); missing columns are treated as blanks.
pub(super) fn parse_card_image(image: &str, card_num: usize) -> Result<RawCard, CardError> {
    let image = image.trim_end();
    if image.is_empty() {
        return Ok(RawCard::Blank);
    }
    let keyword = columns(image, 0, KEYWORD_LEN).trim_end();
    let rest = columns(image, KEYWORD_LEN, image.len());

    match keyword {
        "END" if rest.trim().is_empty() => return Ok(RawCard::End),

        "COMMENT" | "HISTORY" | "" => {
            return Ok(RawCard::Card(Card::commentary(keyword, rest)));
        }

        "CONTINUE" => {
            if let Ok((MetaValue::String(text), comment)) =
                parse_value_field(rest, keyword, card_num)
            {
                return Ok(RawCard::Continue { text, comment });
            }
            return Ok(RawCard::Card(Card::commentary(keyword, rest.trim())));
        }

        "HIERARCH" => {
            if let Some(eq) = rest.find('=') {
                let keyword = rest[..eq].trim().to_string();
                let (value, comment) = parse_value_field(&rest[eq + 1..], &keyword, card_num)?;
                return Ok(RawCard::Card(Card::Value {
                    keyword,
                    value,
                    comment,
                }));
            }
        }

        _ => (),
    }

    match rest.strip_prefix('=') {
        Some(field) => {
            let (value, comment) = parse_value_field(field, keyword, card_num)?;
            Ok(RawCard::Card(Card::Value {
                keyword: keyword.to_string(),
                value,
                comment,
            }))
        }
        None => Ok(RawCard::Card(Card::commentary(keyword, rest))),
    }
}

/// Parse everything after the value indicator into a value and an optional
/// comment.
fn parse_value_field(
    field: &str,
    keyword: &str,
    card_num: usize,
) -> Result<(MetaValue, Option<String>), CardError> {
    let field = field.trim_start();

    if let Some(quoted) = field.strip_prefix('\'') {
        let mut value = String::with_capacity(quoted.len());
        let mut chars = quoted.char_indices().peekable();
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                // Two quotes in a row are an escaped quote.
                if let Some((_, '\'')) = chars.peek() {
                    value.push('\'');
                    chars.next();
                } else {
                    end = Some(i + 1);
                    break;
                }
            } else {
                value.push(c);
            }
        }
        let end = end.ok_or_else(|| CardError::UnterminatedString {
            card_num,
            keyword: keyword.to_string(),
        })?;
        let value = value.trim_end().to_string();
        return Ok((MetaValue::String(value), parse_comment(&quoted[end..])));
    }

    let (value, comment) = match field.find('/') {
        Some(i) => (field[..i].trim(), parse_comment(&field[i..])),
        None => (field.trim(), None),
    };
    let value = parse_scalar(value).ok_or_else(|| CardError::BadValue {
        card_num,
        keyword: keyword.to_string(),
        value: value.to_string(),
    })?;
    Ok((value, comment))
}

fn parse_comment(s: &str) -> Option<String> {
    let comment = s.find('/').map(|i| s[i + 1..].trim())?;
    if comment.is_empty() {
        None
    } else {
        Some(comment.to_string())
    }
}

fn parse_scalar(s: &str) -> Option<MetaValue> {
    match s {
        "" => Some(MetaValue::Undefined),
        "T" => Some(MetaValue::Bool(true)),
        "F" => Some(MetaValue::Bool(false)),
        // Complex values are kept verbatim.
        _ if s.starts_with('(') && s.ends_with(')') => Some(MetaValue::String(s.to_string())),
        _ => {
            if let Ok(i) = s.parse::<i64>() {
                return Some(MetaValue::Integer(i));
            }
            s.replace(|c: char| c == 'D' || c == 'd', "E")
                .parse::<f64>()
                .ok()
                .map(MetaValue::Float)
        }
    }
}

/// Format a real so that it always reads back as a real (i.e. it has a
/// decimal point) and never runs to hundreds of digits.
pub(crate) fn format_real(v: f64) -> String {
    let abs = v.abs();
    let mut s = if abs != 0.0 && abs.is_finite() && !(1e-4..1e16).contains(&abs) {
        format!("{v:E}")
    } else {
        format!("{v}")
    };
    if v.is_finite() && !s.contains('.') {
        match s.find('E') {
            Some(i) => s.insert_str(i, ".0"),
            None => s.push_str(".0"),
        }
    }
    s
}

/// Slice ASCII columns without panicking on short images.
fn columns(image: &str, start: usize, end: usize) -> &str {
    let end = end.min(image.len());
    if start >= end {
        ""
    } else {
        &image[start..end]
    }
}

fn pad(mut image: String) -> String {
    image.truncate(CARD_LEN);
    format!("{image:<CARD_LEN$}")
}

fn chunk_chars(s: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Split a string value into quote-escaped pieces that each fit on a card,
/// leaving room for the `&` continuation marker. An escaped quote is never
/// split across cards.
fn chunk_string_value(s: &str) -> Vec<String> {
    let mut chunks = vec![];
    let mut current = String::new();
    for c in s.chars() {
        let escaped = if c == '\'' { "''" } else { "" };
        let width = if escaped.is_empty() { 1 } else { 2 };
        if current.len() + width > MAX_STRING_LEN - 1 {
            chunks.push(std::mem::take(&mut current));
        }
        if escaped.is_empty() {
            current.push(c);
        } else {
            current.push_str(escaped);
        }
    }
    chunks.push(current);
    chunks
}
