// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Working out the unit of an observation's wavelength from its header.
//!
//! Instruments record this in a handful of different ways; the ones handled
//! here, in order of precedence, are:
//!
//! 1. `WAVEUNIT` holding a unit name (e.g. AIA's `'angstrom'`), or a power of
//!    ten of the metre (e.g. MEDN's `-9`);
//! 2. a `WAVEUNIT` comment of `in meters` (e.g. NA);
//! 3. a `WAVELNTH` comment of the form `Observed wavelength (nm)` (SVSM) or
//!    `[Angstrom] ...` (MQ, SWAP).

#[cfg(test)]
mod tests;

use regex::Regex;

use crate::{
    header::card::format_real,
    meta::{MetaDict, MetaValue},
};

lazy_static::lazy_static! {
    static ref OBSERVED_WAVELENGTH: Regex =
        Regex::new(r"Observed wavelength \((\w+?)\)$").unwrap();
    static ref BRACKETED_UNIT: Regex = Regex::new(r"^\[(\w+?)\]").unwrap();
}

/// Attempt to read the wavelength unit from a normalised header. `None` means
/// no unit could be determined.
pub fn extract_waveunit(header: &MetaDict) -> Option<String> {
    let waveunit_comment = header.key_comment("WAVEUNIT");
    let wavelnth_comment = header.key_comment("WAVELNTH");

    let waveunit = match header.get("WAVEUNIT") {
        Some(value) => match metre_exponent(value) {
            Some(0) => parse_waveunit_comment(waveunit_comment),
            Some(exponent) => match metre_submultiple(exponent) {
                Some(unit) => Some(unit.to_string()),
                None => Some(value_text(value)),
            },
            None => Some(value_text(value)),
        },
        None => match (waveunit_comment, wavelnth_comment) {
            (Some(_), _) => parse_waveunit_comment(waveunit_comment),
            (None, Some(comment)) => [&*OBSERVED_WAVELENGTH, &*BRACKETED_UNIT]
                .iter()
                .find_map(|re| re.captures(comment))
                .map(|caps| caps[1].to_string()),
            (None, None) => None,
        },
    };

    // HMI writes an empty WAVEUNIT.
    waveunit.filter(|u| !u.is_empty())
}

/// A `WAVEUNIT` that is an integer (or a float with no fractional part) is a
/// power of ten of the metre.
fn metre_exponent(value: &MetaValue) -> Option<i64> {
    match value {
        MetaValue::Integer(i) => Some(*i),
        MetaValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e3 => Some(*f as i64),
        _ => None,
    }
}

/// A `WAVEUNIT` used as the unit as written. Reals keep their decimal point,
/// so `5.0` is `"5.0"`, not `"5"`.
fn value_text(value: &MetaValue) -> String {
    match value {
        MetaValue::Float(f) => format_real(*f).to_lowercase(),
        _ => value.to_string().to_lowercase(),
    }
}

fn metre_submultiple(exponent: i64) -> Option<&'static str> {
    let unit = match exponent {
        -1 => "dm",
        -2 => "cm",
        -3 => "mm",
        -6 => "um",
        -9 => "nm",
        -10 => "angstrom",
        -12 => "pm",
        -15 => "fm",
        -18 => "am",
        -21 => "zm",
        -24 => "ym",
        _ => return None,
    };
    Some(unit)
}

fn parse_waveunit_comment(comment: Option<&str>) -> Option<String> {
    match comment {
        Some("in meters") => Some("m".to_string()),
        _ => None,
    }
}
