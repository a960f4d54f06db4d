//! Frozen GPU-side view of a loaded cache.
//!
//! A [`GpuSnapshot`] copies the buffers a device upload needs into flat,
//! `Pod`-friendly arrays. It is built once and handed to the consumer
//! through a channel; nothing mutates it afterwards.

use std::sync::mpsc::{self, Receiver, RecvError, TryRecvError};
use std::sync::Arc;
use std::thread;

use tracing::debug;

use super::attribute::SpecialAttribute;
use super::cache::PointCache;

/// Flattened buffers for device upload.
#[derive(Clone, Debug, PartialEq)]
pub struct GpuSnapshot {
    pub number_of_samples: u32,
    pub number_of_attributes: u32,
    pub number_of_points: u32,
    /// Row stride of [`point_value_indexes`](Self::point_value_indexes).
    pub max_number_of_indexes: u32,
    /// Column-major sample table.
    pub float_values: Vec<f32>,
    /// Role to column, `-1` when absent.
    pub special_attribute_indexes: [i32; SpecialAttribute::COUNT],
    pub spawn_times: Vec<f32>,
    pub life_values: Vec<f32>,
    pub point_types: Vec<i32>,
    /// `number_of_points * max_number_of_indexes`, padded with `-1`.
    pub point_value_indexes: Vec<i32>,
}

impl GpuSnapshot {
    pub fn from_cache(cache: &PointCache) -> Self {
        // One spare slot so every row ends in -1
        let stride = cache.max_number_of_point_value_indexes() + 1;
        let points = cache.number_of_points();

        let mut point_value_indexes = vec![-1i32; points * stride];
        for (point, indexes) in cache.point_value_indexes().iter().enumerate().take(points) {
            let row = &mut point_value_indexes[point * stride..point * stride + indexes.len()];
            for (dst, &src) in row.iter_mut().zip(indexes) {
                *dst = src as i32;
            }
        }

        let mut special_attribute_indexes = [-1; SpecialAttribute::COUNT];
        for role in SpecialAttribute::ALL {
            if let Some(column) = cache.role_index(role) {
                special_attribute_indexes[role.index()] = column as i32;
            }
        }

        Self {
            number_of_samples: cache.number_of_samples() as u32,
            number_of_attributes: cache.number_of_attributes() as u32,
            number_of_points: points as u32,
            max_number_of_indexes: stride as u32,
            float_values: cache.float_sample_data().to_vec(),
            special_attribute_indexes,
            spawn_times: cache.spawn_times().to_vec(),
            life_values: cache.life_values().to_vec(),
            point_types: cache.point_types().to_vec(),
            point_value_indexes,
        }
    }

    /// Sample rows of `point`, without padding.
    pub fn point_indexes(&self, point: usize) -> &[i32] {
        let stride = self.max_number_of_indexes as usize;
        let Some(row) = self.point_value_indexes.get(point * stride..(point + 1) * stride) else {
            return &[];
        };
        let len = row.iter().position(|&i| i < 0).unwrap_or(row.len());
        &row[..len]
    }

    pub fn float_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.float_values)
    }

    pub fn special_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.special_attribute_indexes)
    }

    pub fn spawn_time_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.spawn_times)
    }

    pub fn life_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.life_values)
    }

    pub fn point_type_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.point_types)
    }

    pub fn point_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.point_value_indexes)
    }

    /// Total size of all buffers in bytes.
    pub fn byte_size(&self) -> usize {
        self.float_bytes().len()
            + self.special_index_bytes().len()
            + self.spawn_time_bytes().len()
            + self.life_bytes().len()
            + self.point_type_bytes().len()
            + self.point_index_bytes().len()
    }
}

/// Receiving end of a [`publish`] handoff.
pub struct SnapshotReceiver {
    rx: Receiver<Arc<GpuSnapshot>>,
}

impl SnapshotReceiver {
    /// Block until the snapshot is ready.
    pub fn wait(&self) -> Result<Arc<GpuSnapshot>, RecvError> {
        self.rx.recv()
    }

    /// The snapshot if it is ready, `None` while it is still being built.
    pub fn try_get(&self) -> Option<Arc<GpuSnapshot>> {
        match self.rx.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

/// Build the snapshot on a worker thread and send it once.
pub fn publish(cache: Arc<PointCache>) -> SnapshotReceiver {
    let (tx, rx) = mpsc::sync_channel(1);
    thread::spawn(move || {
        let snapshot = GpuSnapshot::from_cache(&cache);
        debug!(
            points = snapshot.number_of_points,
            bytes = snapshot.byte_size(),
            "GPU snapshot ready"
        );
        // Receiver may already be gone
        let _ = tx.send(Arc::new(snapshot));
    });
    SnapshotReceiver { rx }
}
