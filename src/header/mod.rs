// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! FITS headers: ordered lists of cards, and the conversions between them and
//! [`MetaDict`](crate::meta::MetaDict).

pub(crate) mod card;
mod denormalise;
mod error;
mod normalise;
mod warnings;

pub use card::Card;
pub use denormalise::{header_to_fits, Denormalised};
pub(crate) use denormalise::header_from_meta;
pub use error::{CardError, HeaderFileError};
pub use normalise::format_comments_and_history;
pub use warnings::MetadataWarning;

use std::path::Path;

use log::trace;

use crate::meta::MetaValue;
use card::{ascii_image, parse_card_image, RawCard, CARD_LEN};

/// An ordered list of header cards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn new() -> Header {
        Header::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Append a card, even if a card with the same keyword already exists.
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    fn position(&self, keyword: &str) -> Option<usize> {
        self.cards
            .iter()
            .position(|c| !c.is_commentary() && c.keyword().eq_ignore_ascii_case(keyword))
    }

    /// Get the value of the first value card with this keyword.
    pub fn get(&self, keyword: &str) -> Option<&MetaValue> {
        match self.position(keyword).map(|i| &self.cards[i]) {
            Some(Card::Value { value, .. }) => Some(value),
            _ => None,
        }
    }

    /// Get the comment of the first value card with this keyword.
    pub fn comment(&self, keyword: &str) -> Option<&str> {
        match self.position(keyword).map(|i| &self.cards[i]) {
            Some(Card::Value { comment, .. }) => comment.as_deref(),
            _ => None,
        }
    }

    /// Set the comment of the first value card with this keyword. Returns
    /// `false` if there is no such card.
    pub fn set_comment<C: Into<String>>(&mut self, keyword: &str, new_comment: C) -> bool {
        match self.position(keyword).map(|i| &mut self.cards[i]) {
            Some(Card::Value { comment, .. }) => {
                *comment = Some(new_comment.into());
                true
            }
            _ => false,
        }
    }

    pub fn contains_key(&self, keyword: &str) -> bool {
        self.position(keyword).is_some()
    }

    /// The keywords of all value cards, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cards
            .iter()
            .filter(|c| !c.is_commentary())
            .map(|c| c.keyword())
    }

    /// Replace the first value card with the same keyword, in place, or
    /// append the card if there is none. A replacement without a comment
    /// keeps the existing comment. Commentary cards are always appended.
    pub fn update(&mut self, card: Card) {
        if card.is_commentary() {
            self.cards.push(card);
            return;
        }
        match self.position(card.keyword()) {
            Some(i) => {
                let keep = match (&self.cards[i], &card) {
                    (Card::Value { comment: Some(old), .. }, Card::Value { comment: None, .. }) => {
                        Some(old.clone())
                    }
                    _ => None,
                };
                self.cards[i] = match keep {
                    Some(old) => card.with_comment(old),
                    None => card,
                };
            }
            None => self.cards.push(card),
        }
    }

    /// [`Header::update`] with every card of `other`, in order.
    pub fn extend_update<I: IntoIterator<Item = Card>>(&mut self, other: I) {
        for card in other {
            self.update(card);
        }
    }

    /// Remove every card (value or commentary) with this keyword.
    pub fn remove(&mut self, keyword: &str) -> usize {
        let before = self.cards.len();
        self.cards
            .retain(|c| !c.keyword().eq_ignore_ascii_case(keyword));
        before - self.cards.len()
    }

    /// Keep only the cards for which the predicate holds.
    pub fn retain<F: FnMut(&Card) -> bool>(&mut self, f: F) {
        self.cards.retain(f);
    }

    /// Parse a header as stored in a file: concatenated 80-byte card images,
    /// terminated by `END` (or the end of the input).
    pub fn parse(bytes: &[u8]) -> Result<Header, CardError> {
        let mut raw = vec![];
        for (i, chunk) in bytes.chunks(CARD_LEN).enumerate() {
            let image = ascii_image(chunk, i + 1)?;
            match parse_card_image(image, i + 1)? {
                RawCard::End => break,
                r => raw.push(r),
            }
        }
        Ok(Header::from_raw_cards(raw))
    }

    /// Parse a text dump of a header, one card per line.
    pub fn from_text(text: &str) -> Result<Header, CardError> {
        let mut raw = vec![];
        for (i, line) in text.lines().enumerate() {
            let image = ascii_image(line.trim_end_matches('\r').as_bytes(), i + 1)?;
            match parse_card_image(image, i + 1)? {
                RawCard::End => break,
                r => raw.push(r),
            }
        }
        Ok(Header::from_raw_cards(raw))
    }

    pub fn from_text_file<P: AsRef<Path>>(path: P) -> Result<Header, HeaderFileError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Header::from_text(&text).map_err(|err| HeaderFileError::Card {
            file: path.as_ref().to_path_buf(),
            err,
        })
    }

    /// Render the header as text, one 80-column card per line, without the
    /// `END` card.
    pub fn to_text(&self) -> String {
        self.cards
            .iter()
            .flat_map(|c| c.images())
            .map(|mut image| {
                image.push('\n');
                image
            })
            .collect()
    }

    pub fn write_text_file<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        std::fs::write(path, self.to_text())
    }

    /// Stitch long strings (a string ending in `&` followed by CONTINUE
    /// cards) back together and drop blank cards.
    fn from_raw_cards(raw: Vec<RawCard>) -> Header {
        let mut cards: Vec<Card> = Vec::with_capacity(raw.len());
        for r in raw {
            match r {
                RawCard::Card(card) => cards.push(card),
                RawCard::Blank => (),
                RawCard::End => break,
                RawCard::Continue { text, comment } => {
                    let continued = match cards.last_mut() {
                        Some(Card::Value {
                            value: MetaValue::String(s),
                            comment: last_comment,
                            ..
                        }) if s.ends_with('&') => {
                            s.pop();
                            s.push_str(&text);
                            if let Some(c) = comment {
                                match last_comment {
                                    Some(l) => {
                                        l.push(' ');
                                        l.push_str(&c);
                                    }
                                    None => *last_comment = Some(c),
                                }
                            }
                            true
                        }
                        _ => false,
                    };
                    if !continued {
                        trace!("CONTINUE card without a long string before it; keeping it as text");
                        cards.push(Card::commentary("CONTINUE", format!("'{text}'")));
                    }
                }
            }
        }
        Header { cards }
    }
}

impl<'a> IntoIterator for &'a Header {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

impl FromIterator<Card> for Header {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Header {
            cards: iter.into_iter().collect(),
        }
    }
}
