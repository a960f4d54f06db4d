//! Fixture builders shared by the integration tests.
//!
//! [`CacheFile`] describes one JSON-family cache and writes it as text JSON,
//! compact `.hbjson`, or tagged binary `.hjson`.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Write `bytes` to `name` inside a fresh temp dir.
///
/// The directory lives as long as the returned guard.
pub fn write_temp(name: &str, bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    (dir, path)
}

pub struct FrameSpec {
    pub number: u32,
    pub time: f32,
    pub rows: Vec<Vec<f32>>,
}

/// Logical content of a JSON-family cache.
pub struct CacheFile {
    pub names: Vec<String>,
    pub sizes: Vec<usize>,
    /// Compact marker per component; empty writes no `attrib_data_type`.
    pub types: Vec<u8>,
    pub num_points: usize,
    pub frames: Vec<FrameSpec>,
}

impl CacheFile {
    pub fn new(attributes: &[(&str, usize)], num_points: usize) -> Self {
        Self {
            names: attributes.iter().map(|(n, _)| n.to_string()).collect(),
            sizes: attributes.iter().map(|&(_, s)| s).collect(),
            types: Vec::new(),
            num_points,
            frames: Vec::new(),
        }
    }

    pub fn with_types(mut self, types: &[u8]) -> Self {
        self.types = types.to_vec();
        self
    }

    pub fn frame(mut self, number: u32, time: f32, rows: &[&[f32]]) -> Self {
        self.frames.push(FrameSpec {
            number,
            time,
            rows: rows.iter().map(|r| r.to_vec()).collect(),
        });
        self
    }

    pub fn num_samples(&self) -> usize {
        self.frames.iter().map(|f| f.rows.len()).sum()
    }

    // ------------------------------------------------------------------------
    // Text JSON
    // ------------------------------------------------------------------------

    pub fn to_json(&self) -> Vec<u8> {
        let types: Vec<String> = self
            .types
            .iter()
            .map(|&m| match m {
                b'f' => "float32".to_string(),
                b'l' => "int32".to_string(),
                other => char::from(other).to_string(),
            })
            .collect();
        let frames: Vec<serde_json::Value> = self
            .frames
            .iter()
            .map(|f| {
                serde_json::json!({
                    "number": f.number,
                    "time": f.time,
                    "num_points": f.rows.len(),
                    "frame_data": f.rows,
                })
            })
            .collect();

        let mut header = serde_json::json!({
            "version": "1.0",
            "num_samples": self.num_samples(),
            "num_frames": self.frames.len(),
            "num_points": self.num_points,
            "num_attrib": self.names.len(),
            "attrib_name": self.names,
            "attrib_size": self.sizes,
            "data_type": "float32",
        });
        if !types.is_empty() {
            header["attrib_data_type"] = serde_json::json!(types);
        }

        let doc = serde_json::json!({
            "header": header,
            "cache_data": { "frames": frames },
        });
        serde_json::to_vec_pretty(&doc).unwrap()
    }

    // ------------------------------------------------------------------------
    // Compact binary
    // ------------------------------------------------------------------------

    pub fn to_hbjson(&self) -> Vec<u8> {
        let mut w = CompactWriter::default();
        w.raw(b"{").key("header").raw(b"{");
        w.key("version").string("1.0");
        w.key("num_samples").u32(self.num_samples() as u32);
        w.key("num_frames").u32(self.frames.len() as u32);
        w.key("num_points").u32(self.num_points as u32);
        w.key("num_attrib").raw(&(self.names.len() as u16).to_le_bytes());
        w.key("attrib_name").raw(b"[");
        for name in &self.names {
            w.string(name);
        }
        w.raw(b"]");
        w.key("attrib_size").raw(b"[");
        for &size in &self.sizes {
            w.raw(&[size as u8]);
        }
        w.raw(b"]");
        if !self.types.is_empty() {
            w.key("attrib_data_type").raw(b"[").raw(&self.types).raw(b"]");
        }
        w.key("data_type").string("float32").raw(b"}");

        w.key("cache_data").raw(b"{").key("frames").raw(b"[");
        for f in &self.frames {
            w.raw(b"{").key("number").u32(f.number);
            w.key("time").raw(&f.time.to_le_bytes());
            w.key("num_points").u32(f.rows.len() as u32);
            w.key("frame_data").raw(b"[");
            for row in &f.rows {
                w.raw(b"[");
                for (i, &v) in row.iter().enumerate() {
                    w.value(self.types.get(i).copied().unwrap_or(b'f'), v);
                }
                w.raw(b"]");
            }
            w.raw(b"]}");
        }
        w.raw(b"]}}");
        w.0
    }

    // ------------------------------------------------------------------------
    // Tagged binary
    // ------------------------------------------------------------------------

    pub fn to_tagged(&self) -> Vec<u8> {
        let mut w = TaggedWriter::default();
        w.raw(b"{").key("header").raw(b"{");
        w.key("version").string("1.0");
        w.key("num_samples").int(self.num_samples() as i32);
        w.key("num_frames").int(self.frames.len() as i32);
        w.key("num_points").int(self.num_points as i32);
        w.key("num_attrib").int(self.names.len() as i32);
        w.key("attrib_name").raw(b"[");
        for name in &self.names {
            w.string(name);
        }
        w.raw(b"]");
        w.key("attrib_size").raw(b"[");
        for &size in &self.sizes {
            w.int(size as i32);
        }
        w.raw(b"]");
        w.key("data_type").string("float32").raw(b"}");

        w.key("cache_data").raw(b"{").key("frames").raw(b"[");
        for f in &self.frames {
            w.raw(b"{").key("number").int(f.number as i32);
            w.key("time").float(f.time);
            w.key("num_points").int(f.rows.len() as i32);
            w.key("frame_data").raw(b"[");
            for row in &f.rows {
                w.raw(b"[");
                for &v in row {
                    w.float(v);
                }
                w.raw(b"]");
            }
            w.raw(b"]}");
        }
        w.raw(b"]}}");
        w.0
    }
}

/// Little-endian writer for the compact alphabet.
#[derive(Default)]
pub struct CompactWriter(pub Vec<u8>);

impl CompactWriter {
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.extend_from_slice(bytes);
        self
    }

    /// Key: `B`-tagged length then bytes, no `s` marker.
    pub fn key(&mut self, k: &str) -> &mut Self {
        self.0.push(b'B');
        self.0.push(k.len() as u8);
        self.raw(k.as_bytes())
    }

    /// String values are written like keys: tagged length then bytes.
    pub fn string(&mut self, s: &str) -> &mut Self {
        self.key(s)
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.raw(&v.to_le_bytes())
    }

    /// Untagged value in the representation of marker `m`.
    pub fn value(&mut self, m: u8, v: f32) -> &mut Self {
        match m {
            b'B' => self.raw(&[v as u8]),
            b'h' => self.raw(&(v as i16).to_le_bytes()),
            b'l' => self.raw(&(v as i32).to_le_bytes()),
            b'd' => self.raw(&(v as f64).to_le_bytes()),
            _ => self.raw(&v.to_le_bytes()),
        }
    }
}

/// Big-endian writer for the tagged alphabet.
#[derive(Default)]
pub struct TaggedWriter(pub Vec<u8>);

impl TaggedWriter {
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.extend_from_slice(bytes);
        self
    }

    /// Key: `U`-tagged length then bytes, no `S` marker.
    pub fn key(&mut self, k: &str) -> &mut Self {
        self.0.push(b'U');
        self.0.push(k.len() as u8);
        self.raw(k.as_bytes())
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        self.0.push(b'S');
        self.key(s)
    }

    pub fn int(&mut self, v: i32) -> &mut Self {
        self.0.push(b'l');
        self.raw(&v.to_be_bytes())
    }

    pub fn float(&mut self, v: f32) -> &mut Self {
        self.0.push(b'd');
        self.raw(&v.to_be_bytes())
    }
}

/// Two points moving along x, the second spawning a frame later.
///
/// Attributes `id`, `P` (3), `age`; point 7 spawns at 0, point 3 at 0.5.
pub fn two_point_cache() -> CacheFile {
    CacheFile::new(&[("id", 1), ("P", 3), ("age", 1)], 2)
        .frame(1, 0.0, &[&[7.0, 0.0, 0.0, 0.0, 0.0]])
        .frame(
            2,
            0.5,
            &[&[7.0, 1.0, 0.0, 0.0, 0.5], &[3.0, 10.0, 0.0, 0.0, 0.0]],
        )
        .frame(
            3,
            1.0,
            &[&[7.0, 2.0, 0.0, 0.0, 1.0], &[3.0, 12.0, 0.0, 0.0, 0.5]],
        )
}
