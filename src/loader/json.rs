//! Text JSON point cache parser (`.hjson`).

use serde::Deserialize;
use tracing::debug;

use super::frames::{Frame, FrameAssembler, Header};
use crate::core::ParsedCache;
use crate::util::{Error, Result};

#[derive(Debug, Deserialize)]
struct JsonCache {
    header: JsonHeader,
    cache_data: JsonCacheData,
}

#[derive(Debug, Deserialize)]
struct JsonHeader {
    #[serde(default)]
    version: String,
    num_samples: usize,
    num_frames: usize,
    num_points: usize,
    num_attrib: usize,
    attrib_name: Vec<String>,
    attrib_size: Vec<usize>,
    #[serde(default)]
    attrib_data_type: Vec<String>,
    #[serde(default)]
    data_type: String,
}

impl From<JsonHeader> for Header {
    fn from(h: JsonHeader) -> Self {
        Self {
            attrib_data_type: Header::data_type_markers(&h.attrib_data_type),
            version: h.version,
            num_samples: h.num_samples,
            num_frames: h.num_frames,
            num_points: h.num_points,
            num_attrib: h.num_attrib,
            attrib_name: h.attrib_name,
            attrib_size: h.attrib_size,
            data_type: h.data_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonCacheData {
    frames: Vec<JsonFrame>,
}

#[derive(Debug, Deserialize)]
struct JsonFrame {
    number: f32,
    time: f32,
    num_points: usize,
    frame_data: Vec<Vec<f32>>,
}

/// Parse text JSON into a sample table.
pub fn parse(bytes: &[u8]) -> Result<ParsedCache> {
    let file: JsonCache = serde_json::from_slice(bytes)?;
    let header = Header::from(file.header);
    let mut asm = FrameAssembler::new(&header)?;

    let frames = file.cache_data.frames;
    if frames.len() != header.num_frames {
        return Err(Error::header("num_frames", header.num_frames, frames.len()));
    }

    let components = asm.components();
    for frame in frames {
        if frame.frame_data.len() > frame.num_points {
            return Err(Error::invalid(format!(
                "frame {} holds {} samples but declares {}",
                frame.number,
                frame.frame_data.len(),
                frame.num_points
            )));
        }

        let mut rows = frame.frame_data;
        for (index, row) in rows.iter_mut().enumerate() {
            if row.len() > components {
                return Err(Error::invalid(format!(
                    "frame {}, sample {} holds {} values but the header declares {}",
                    frame.number,
                    index,
                    row.len(),
                    components
                )));
            }
            // Short rows are zero filled
            row.resize(components, 0.0);
        }

        asm.push_frame(Frame {
            number: frame.number,
            time: frame.time,
            num_points: frame.num_points,
            rows,
        })?;
    }

    debug!(frames = asm.frames_seen(), "Parsed JSON point cache");
    asm.finish()
}
