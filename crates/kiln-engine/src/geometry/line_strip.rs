use glam::Vec3;
use thiserror::Error;

use crate::gpu::{BufferDesc, BufferDevice, BufferError, BufferSet, BufferUsage, GpuBuffer};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LineStripError {
    #[error("line strip has no points")]
    Empty,

    #[error("point {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{len} floats do not form xyz triples")]
    RaggedPoints { len: usize },

    #[error("line strip buffers: {0}")]
    Buffer(#[from] BufferError),
}

/// Polyline drawn as one connected strip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineStrip {
    points: Vec<Vec3>,
}

impl LineStrip {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// Builds a strip from packed `x, y, z` floats.
    pub fn from_flat(coords: &[f32]) -> Result<Self, LineStripError> {
        if coords.len() % 3 != 0 {
            return Err(LineStripError::RaggedPoints { len: coords.len() });
        }
        Ok(Self::new(coords.chunks_exact(3).map(Vec3::from_slice).collect()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    #[inline]
    pub fn point_at(&self, index: usize) -> Option<Vec3> {
        self.points.get(index).copied()
    }

    pub fn translate_point_at(&mut self, index: usize, delta: Vec3) -> Result<(), LineStripError> {
        let len = self.points.len();
        let point = self
            .points
            .get_mut(index)
            .ok_or(LineStripError::IndexOutOfRange { index, len })?;
        *point += delta;
        Ok(())
    }

    pub fn into_points(self) -> Vec<Vec3> {
        self.points
    }
}

impl From<Vec<Vec3>> for LineStrip {
    fn from(points: Vec<Vec3>) -> Self {
        Self::new(points)
    }
}

const POSITIONS: usize = 0;
const INDICES: usize = 1;

/// Device copy of a [`LineStrip`]: a position buffer and a sequential index
/// buffer.
#[derive(Debug)]
pub struct GpuLineStrip<B> {
    buffers: BufferSet<B>,
    len: u32,
}

impl<B: GpuBuffer> GpuLineStrip<B> {
    pub fn upload<D>(device: &D, strip: &LineStrip) -> Result<Self, LineStripError>
    where
        D: BufferDevice<Buffer = B>,
    {
        if strip.is_empty() {
            return Err(LineStripError::Empty);
        }
        let len = u32::try_from(strip.len()).map_err(|_| BufferError::SizeOverflow)?;
        let indices: Vec<u32> = (0..len).collect();

        let buffers = BufferSet::acquire(
            device,
            &[
                (
                    BufferDesc::new("kiln line strip positions", BufferUsage::Vertex),
                    bytemuck::cast_slice(strip.points()),
                ),
                (
                    BufferDesc::new("kiln line strip indices", BufferUsage::Index),
                    bytemuck::cast_slice(&indices),
                ),
            ],
        )?;

        Ok(Self { buffers, len })
    }

    /// Number of vertices (and indices).
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn positions(&self) -> Option<&B> {
        self.buffers.get(POSITIONS)
    }

    #[inline]
    pub fn indices(&self) -> Option<&B> {
        self.buffers.get(INDICES)
    }

    /// Overwrites one vertex in place.
    pub fn write_point(&mut self, index: usize, point: Vec3) -> Result<(), LineStripError> {
        let len = self.len as usize;
        if index >= len {
            return Err(LineStripError::IndexOutOfRange { index, len });
        }
        let Some(positions) = self.buffers.get_mut(POSITIONS) else {
            return Err(LineStripError::Empty);
        };

        let offset = (index * core::mem::size_of::<Vec3>()) as u64;
        positions.write(offset, bytemuck::bytes_of(&point))?;
        Ok(())
    }
}
