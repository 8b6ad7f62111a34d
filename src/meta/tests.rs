// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::*;

#[test]
fn test_keys_are_case_insensitive() {
    let mut meta = MetaDict::new();
    meta.insert("Telescop", "SDO/AIA");
    assert!(meta.contains_key("TELESCOP"));
    assert!(meta.contains_key("telescop"));
    assert_eq!(meta.get("telescop"), Some(&MetaValue::from("SDO/AIA")));

    // Re-inserting with another spelling replaces the value, but keeps the
    // original spelling and position.
    meta.insert("naxis", 2);
    let old = meta.insert("TELESCOP", "SOHO");
    assert_eq!(old, Some(MetaValue::from("SDO/AIA")));
    assert_eq!(meta.keys().collect::<Vec<_>>(), ["Telescop", "naxis"]);
    assert_eq!(meta.get("TELESCOP").and_then(|v| v.as_str()), Some("SOHO"));
}

#[test]
fn test_insertion_order_is_preserved() {
    let meta: MetaDict = [("C", 3), ("A", 1), ("B", 2)].into_iter().collect();
    assert_eq!(meta.keys().collect::<Vec<_>>(), ["C", "A", "B"]);

    let mut meta = meta;
    meta.remove("a");
    assert_eq!(meta.keys().collect::<Vec<_>>(), ["C", "B"]);
    assert_eq!(meta.len(), 2);
}

#[test]
fn test_key_comments_sidecar() {
    let mut meta = MetaDict::new();
    meta.insert("WAVELNTH", 171);
    meta.set_key_comment("wavelnth", "[Angstrom]");
    assert_eq!(meta.key_comment("WAVELNTH"), Some("[Angstrom]"));
    assert_eq!(meta.key_comment("EXPTIME"), None);

    // Comments may exist for keys that don't.
    meta.set_key_comment("TEST", "Hello world");
    assert_eq!(meta.key_comment("test"), Some("Hello world"));
    assert_eq!(meta.key_comments().count(), 2);

    // Removing a key also removes its comment.
    meta.remove("WAVELNTH");
    assert_eq!(meta.key_comment("WAVELNTH"), None);
}

#[test]
fn test_value_accessors() {
    assert_eq!(MetaValue::from(3).as_f64(), Some(3.0));
    assert_eq!(MetaValue::from(2.5).as_i64(), None);
    assert_eq!(MetaValue::from(true).as_bool(), Some(true));
    assert!(MetaValue::from(f64::NAN).is_nan());
    assert!(!MetaValue::from("nan").is_nan());
    assert_eq!(MetaValue::Undefined.to_string(), "");
}

#[test]
fn test_serde_keeps_order_and_comments() {
    let mut meta = MetaDict::new();
    meta.insert("telescop", "SDO/AIA");
    meta.insert("EXPTIME", 2.0);
    meta.insert("DATAMIN", -7);
    meta.insert("DONE", false);
    meta.set_key_comment("EXPTIME", "[s] exposure duration");

    let json = serde_json::to_string(&meta).unwrap();
    assert_eq!(
        json,
        r#"{"meta":{"telescop":"SDO/AIA","EXPTIME":2.0,"DATAMIN":-7,"DONE":false},"key_comments":{"EXPTIME":"[s] exposure duration"}}"#
    );
    let back: MetaDict = serde_json::from_str(&json).unwrap();
    assert_eq!(back, meta);
}
