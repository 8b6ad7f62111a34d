// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use indoc::indoc;

use super::*;
use crate::io::write::{CompressionAlgorithm, QuantizeMethod};

#[test]
fn test_defaults() {
    let config = FitsConfig::default();
    assert!(config.memmap);
    assert!(config.log_metadata_warnings);
    assert!(config.write.overwrite);
    assert!(!config.write.checksum);
    assert_eq!(config.compression.algorithm, CompressionAlgorithm::Rice);
    assert_eq!(
        config.compression.quantize_method,
        QuantizeMethod::SubtractiveDither1
    );

    // An empty file is the default config.
    assert_eq!(FitsConfig::from_toml_str("").unwrap(), config);
}

#[test]
fn test_from_toml_str() {
    let config = FitsConfig::from_toml_str(indoc! {r#"
        memmap = false

        [write]
        checksum = true

        [compression]
        algorithm = "gzip1"
        quantize_level = 8.0
        tile_shape = [1, 512]
    "#})
    .unwrap();
    assert!(!config.memmap);
    assert!(config.log_metadata_warnings);
    assert!(config.write.overwrite);
    assert!(config.write.checksum);
    assert_eq!(config.compression.algorithm, CompressionAlgorithm::Gzip1);
    assert_eq!(config.compression.quantize_level, 8.0);
    assert_eq!(config.compression.tile_shape, Some(vec![1, 512]));
    assert_eq!(config.compression.dither_seed, -1);
}

#[test]
fn test_bad_toml() {
    let result = FitsConfig::from_toml_str("memmap = 3");
    assert!(matches!(result, Err(ConfigError::Parse { file: None, .. })));

    let result = FitsConfig::from_toml_str(indoc! {r#"
        [compression]
        algorithm = "lzma"
    "#});
    assert!(result.is_err());
}

#[test]
fn test_toml_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("solar_fits.toml");

    let mut config = FitsConfig::default();
    config.log_metadata_warnings = false;
    config.compression.algorithm = CompressionAlgorithm::Plio;
    std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();
    assert_eq!(FitsConfig::from_toml_file(&path).unwrap(), config);

    let result = FitsConfig::from_toml_file(dir.path().join("missing.toml"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));

    std::fs::write(&path, "memmap = ").unwrap();
    let result = FitsConfig::from_toml_file(&path);
    match result {
        Err(ConfigError::Parse { file: Some(f), .. }) => assert_eq!(f, path),
        other => panic!("unexpected {other:?}"),
    }
}
