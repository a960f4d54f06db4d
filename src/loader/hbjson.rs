//! Compact binary JSON point cache parser (`.hbjson`).
//!
//! The layout mirrors the text JSON file key for key. Header scalars use
//! fixed markers; frame values use the per-component markers declared in
//! `attrib_data_type`, falling back to native `f32` when none are declared.

use tracing::debug;

use super::compact::{marker, CompactReader};
use super::frames::{Frame, FrameAssembler, Header};
use crate::core::ParsedCache;
use crate::util::{Error, Result};

fn read_header(r: &mut CompactReader<'_>) -> Result<Header> {
    r.expect_marker(marker::OBJECT_START)?;
    r.expect_key("header")?;
    r.expect_marker(marker::OBJECT_START)?;

    let mut header = Header::default();
    r.expect_key("version")?;
    header.version = r.read_string(marker::STRING)?;
    r.expect_key("num_samples")?;
    header.num_samples = r.read_value::<u32>(marker::UINT32)? as usize;
    r.expect_key("num_frames")?;
    header.num_frames = r.read_value::<u32>(marker::UINT32)? as usize;
    r.expect_key("num_points")?;
    header.num_points = r.read_value::<u32>(marker::UINT32)? as usize;
    r.expect_key("num_attrib")?;
    header.num_attrib = r.read_value::<u16>(marker::UINT16)? as usize;
    r.expect_key("attrib_name")?;
    header.attrib_name = r.read_string_array(marker::STRING)?;
    r.expect_key("attrib_size")?;
    header.attrib_size = r
        .read_array::<u8>(marker::UINT8)?
        .into_iter()
        .map(usize::from)
        .collect();

    let mut key = r.read_key()?;
    if key == "attrib_data_type" {
        let types = r.read_string_array(marker::CHAR)?;
        header.attrib_data_type = Header::data_type_markers(&types);
        key = r.read_key()?;
    }
    if key != "data_type" {
        return Err(Error::UnexpectedKey {
            expected: "data_type".into(),
            found: key,
        });
    }
    header.data_type = r.read_string(marker::STRING)?;
    r.expect_marker(marker::OBJECT_END)?;

    Ok(header)
}

fn read_frame(r: &mut CompactReader<'_>, markers: &[u8]) -> Result<Frame> {
    r.expect_marker(marker::OBJECT_START)?;
    r.expect_key("number")?;
    let number = r.read_value::<u32>(marker::UINT32)? as f32;
    r.expect_key("time")?;
    let time = r.read_value::<f32>(marker::FLOAT32)?;
    r.expect_key("num_points")?;
    let num_points = r.read_value::<u32>(marker::UINT32)? as usize;

    r.expect_key("frame_data")?;
    r.expect_marker(marker::ARRAY_START)?;
    let mut rows = Vec::with_capacity(num_points);
    while !r.at_end() && !r.is_next(marker::ARRAY_END) {
        rows.push(r.read_array_typed::<f32>(markers)?);
    }
    r.expect_marker(marker::ARRAY_END)?;
    r.expect_marker(marker::OBJECT_END)?;

    Ok(Frame {
        number,
        time,
        num_points,
        rows,
    })
}

/// Parse a compact binary JSON buffer into a sample table.
pub fn parse(bytes: &[u8]) -> Result<ParsedCache> {
    let mut r = CompactReader::new(bytes);
    let header = read_header(&mut r)?;
    let mut asm = FrameAssembler::new(&header)?;

    r.expect_key("cache_data")?;
    r.expect_marker(marker::OBJECT_START)?;
    r.expect_key("frames")?;
    r.expect_marker(marker::ARRAY_START)?;
    while !r.at_end() && !r.is_next(marker::ARRAY_END) {
        let frame = read_frame(&mut r, &header.attrib_data_type)?;
        asm.push_frame(frame)?;
    }
    r.expect_marker(marker::ARRAY_END)?;
    r.expect_marker(marker::OBJECT_END)?;
    r.expect_marker(marker::OBJECT_END)?;

    debug!(
        frames = asm.frames_seen(),
        bytes = r.position(),
        "Parsed binary JSON point cache"
    );
    asm.finish()
}
