//! Raw source retention and export.

mod common;

use std::fs;

use common::{two_point_cache, write_temp};
use houdini_pointcache::loader::supports_export;
use houdini_pointcache::prelude::*;

fn roundtrip(name: &str, bytes: &[u8]) {
    let (dir, path) = write_temp(name, bytes);
    let cache = PointCache::load(&path).unwrap();

    let out = dir.path().join(format!("copy_{}", name));
    let written = export_raw_to_path(&cache, &out).unwrap();
    assert_eq!(written, bytes.len());
    assert_eq!(fs::read(&out).unwrap(), bytes);

    // The exported copy loads to the same table
    let again = PointCache::load(&out).unwrap();
    assert_eq!(again.float_sample_data(), cache.float_sample_data());
}

#[test]
fn test_roundtrip_every_format() {
    let file = two_point_cache();
    roundtrip("trail.hbjson", &file.to_hbjson());
    roundtrip("trail.hjson", &file.to_json());
    roundtrip("tagged.hjson", &file.to_tagged());
    roundtrip("trail.hcsv", b"id,P.x,time\n3,0,0\n3,1,1\n");
}

#[test]
fn test_export_to_writer() {
    let bytes = two_point_cache().to_hbjson();
    let cache = PointCache::load_from_bytes(&bytes, FileType::BinaryJson, &LoadOptions::default()).unwrap();
    let summary = cache.summary();
    assert_eq!(summary.raw_format.as_deref(), Some("HBJSON"));
    assert!(supports_export(summary.raw_format.as_deref().unwrap()));

    let mut out = Vec::new();
    export_raw(&cache, &mut out).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn test_compression_levels() {
    let bytes = two_point_cache().to_json();
    for level in [0, 1, 9] {
        let opts = LoadOptions {
            compression_level: level,
            ..LoadOptions::default()
        };
        let cache = PointCache::load_from_bytes(&bytes, FileType::Json, &opts).unwrap();
        let raw = cache.raw_data().unwrap();
        assert_eq!(raw.decompress().unwrap(), bytes);
    }
}

#[test]
fn test_no_raw_data() {
    let opts = LoadOptions {
        retain_raw_data: false,
        ..LoadOptions::default()
    };
    let cache = PointCache::load_from_bytes(&two_point_cache().to_hbjson(), FileType::BinaryJson, &opts)
        .unwrap();
    assert!(matches!(
        export_raw(&cache, Vec::new()),
        Err(Error::MissingRawData)
    ));
}

#[test]
fn test_options_from_config_file() {
    let (_dir, path) = write_temp(
        "options.json",
        br#"{"custom_title_row": "id,P,time", "retain_raw_data": false}"#,
    );
    let opts = LoadOptions::from_json_file(&path).unwrap();
    assert_eq!(opts.custom_title_row.as_deref(), Some("id,P,time"));
    assert!(!opts.retain_raw_data);
    assert_eq!(opts.compression_level, 6);
}
