//! Legacy tagged binary JSON parser (binary `.hjson`).
//!
//! Same logical layout as the text file, written big-endian with a type
//! marker before every value.

use tracing::debug;

use super::frames::{Frame, FrameAssembler, Header};
use super::tagged::{marker, TaggedReader};
use crate::core::ParsedCache;
use crate::util::{Error, Result};

fn read_count(r: &mut TaggedReader<'_>, key: &str) -> Result<usize> {
    r.expect_key(key)?;
    Ok(r.read_value::<u32>()? as usize)
}

fn read_header(r: &mut TaggedReader<'_>) -> Result<Header> {
    r.expect_marker(marker::OBJECT_START)?;
    r.expect_key("header")?;
    r.expect_marker(marker::OBJECT_START)?;

    r.expect_key("version")?;
    let version = r.read_string()?;
    let num_samples = read_count(r, "num_samples")?;
    let num_frames = read_count(r, "num_frames")?;
    let num_points = read_count(r, "num_points")?;
    let num_attrib = read_count(r, "num_attrib")?;
    r.expect_key("attrib_name")?;
    let attrib_name = r.read_string_array()?;
    r.expect_key("attrib_size")?;
    let attrib_size = r
        .read_array::<u32>()?
        .into_iter()
        .map(|s| s as usize)
        .collect();

    let mut attrib_data_type = Vec::new();
    let mut key = r.read_key()?;
    if key == "attrib_data_type" {
        attrib_data_type = Header::data_type_markers(&r.read_string_array()?);
        key = r.read_key()?;
    }
    if key != "data_type" {
        return Err(Error::UnexpectedKey {
            expected: "data_type".into(),
            found: key,
        });
    }
    let data_type = r.read_string()?;
    r.expect_marker(marker::OBJECT_END)?;

    Ok(Header {
        version,
        num_samples,
        num_frames,
        num_points,
        num_attrib,
        attrib_name,
        attrib_size,
        attrib_data_type,
        data_type,
    })
}

/// Frame body; the opening `{` is already consumed.
fn read_frame(r: &mut TaggedReader<'_>) -> Result<Frame> {
    r.expect_key("number")?;
    let number = r.read_value::<f32>()?;
    r.expect_key("time")?;
    let time = r.read_value::<f32>()?;
    let num_points = read_count(r, "num_points")?;

    r.expect_key("frame_data")?;
    r.expect_marker(marker::ARRAY_START)?;
    let mut rows = Vec::with_capacity(num_points);
    while !r.is_next(marker::ARRAY_END) {
        rows.push(r.read_array::<f32>()?);
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

/// Parse a tagged binary JSON buffer into a sample table.
pub fn parse(bytes: &[u8]) -> Result<ParsedCache> {
    let mut r = TaggedReader::new(bytes);
    let header = read_header(&mut r)?;
    let mut asm = FrameAssembler::new(&header)?;

    r.expect_key("cache_data")?;
    r.expect_marker(marker::OBJECT_START)?;
    r.expect_key("frames")?;
    r.expect_marker(marker::ARRAY_START)?;
    loop {
        let offset = r.position();
        match r.read_marker()? {
            marker::ARRAY_END => break,
            marker::OBJECT_START => asm.push_frame(read_frame(&mut r)?)?,
            found => {
                return Err(Error::UnexpectedMarker {
                    expected: marker::OBJECT_START,
                    found,
                    offset,
                })
            }
        }
    }
    r.expect_marker(marker::OBJECT_END)?;
    r.expect_marker(marker::OBJECT_END)?;

    debug!(frames = asm.frames_seen(), "Parsed tagged binary JSON point cache");
    asm.finish()
}
