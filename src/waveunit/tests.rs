// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use indoc::indoc;

use super::*;
use crate::header::{format_comments_and_history, Header};

/// Normalise a text dump of a header, as read from a `.header` file.
fn header(text: &str) -> MetaDict {
    format_comments_and_history(&Header::from_text(text).unwrap())
}

#[test]
fn test_aia_171() {
    let meta = header(indoc! {"
        SIMPLE  =                    T
        TELESCOP= 'SDO/AIA '
        INSTRUME= 'AIA_3   '
        WAVELNTH=                  171
        WAVEUNIT= 'angstrom'
    "});
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("angstrom"));
}

#[test]
fn test_eit() {
    let meta = header(indoc! {"
        SIMPLE  =                    T
        TELESCOP= 'SOHO    '
        INSTRUME= 'EIT     '
        WAVELNTH=                  195 / Wavelength
        COMMENT  CORRECTED DATE_OBS = '2004-03-01T00:00:10.000Z'
    "});
    assert_eq!(extract_waveunit(&meta), None);
}

#[test]
fn test_rhessi() {
    let meta = header(indoc! {"
        SIMPLE  =                    T
        TELESCOP= 'RHESSI  '
        ENERGY_L=                   12.
        ENERGY_H=                   25.
    "});
    assert_eq!(extract_waveunit(&meta), None);
}

#[test]
fn test_medn() {
    let meta = header(indoc! {"
        SIMPLE  =                    T
        ORIGIN  = 'Meudon  '
        WAVELNTH=                 6563
        WAVEUNIT=                   -9 / wavelength unit
    "});
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("nm"));
}

#[test]
fn test_svsm() {
    let meta = header(indoc! {"
        SIMPLE  =                    T
        TELESCOP= 'SOLIS   '
        INSTRUME= 'VSM     '
        WAVELNTH=                630.2 / Observed wavelength (nm)
    "});
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("nm"));
}

#[test]
fn test_na() {
    let meta = header(indoc! {"
        SIMPLE  =                    T
        TELESCOP= 'NA      '
        WAVELNTH=              1.7E-02
        WAVEUNIT=                    0 / in meters
    "});
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("m"));
}

#[test]
fn test_mq_and_swap() {
    let meta = header(indoc! {"
        SIMPLE  =                    T
        ORIGIN  = 'MQ      '
        WAVELNTH=                 6563 / [Angstrom] H-alpha
    "});
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("Angstrom"));

    let meta = header(indoc! {"
        SIMPLE  =                    T
        TELESCOP= 'PROBA2  '
        INSTRUME= 'SWAP    '
        WAVELNTH=                  174 / [Angstrom]
    "});
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("Angstrom"));
}

#[test]
fn test_hmi_empty_waveunit() {
    let meta = header(indoc! {"
        SIMPLE  =                    T
        TELESCOP= 'SDO/HMI '
        WAVELNTH=               6173.0
        WAVEUNIT= ''
    "});
    assert_eq!(extract_waveunit(&meta), None);
}

#[test]
fn test_waveunit_value_forms() {
    let mut meta = MetaDict::new();
    meta.insert("WAVEUNIT", "Angstrom");
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("angstrom"));

    meta.insert("WAVEUNIT", -10.0);
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("angstrom"));

    meta.insert("WAVEUNIT", -6);
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("um"));

    // Not a known submultiple; the value itself is the unit.
    meta.insert("WAVEUNIT", 5);
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("5"));
    meta.insert("WAVEUNIT", 5.0);
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("5.0"));
    meta.insert("WAVEUNIT", 2.5);
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("2.5"));

    // Zero defers to the comment.
    meta.insert("WAVEUNIT", 0);
    assert_eq!(extract_waveunit(&meta), None);
    meta.set_key_comment("WAVEUNIT", "in meters");
    assert_eq!(extract_waveunit(&meta).as_deref(), Some("m"));
}

#[test]
fn test_waveunit_comment_takes_precedence_over_wavelnth_comment() {
    let mut meta = MetaDict::new();
    meta.insert("WAVELNTH", 171);
    meta.set_key_comment("WAVELNTH", "[Angstrom]");
    meta.set_key_comment("WAVEUNIT", "something else");
    assert_eq!(extract_waveunit(&meta), None);
}

#[test]
fn test_wavelnth_comment_patterns_are_anchored() {
    let mut meta = MetaDict::new();
    meta.insert("WAVELNTH", 171);
    meta.set_key_comment("WAVELNTH", "wavelength [Angstrom]");
    assert_eq!(extract_waveunit(&meta), None);

    meta.set_key_comment("WAVELNTH", "Observed wavelength (nm) approx");
    assert_eq!(extract_waveunit(&meta), None);
}
