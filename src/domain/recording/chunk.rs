//! Recorded chunks and the ordered buffer they accumulate into

use std::sync::Arc;

use crate::domain::media::{ContainerFormat, MediaData};

/// An immutable fragment flushed by the recording engine.
/// Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    data: Arc<[u8]>,
}

impl Chunk {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

/// Ordered, append-only sequence of the chunks of one recording.
///
/// Arrival order is authoritative: concatenating the chunks in order
/// reconstructs the recorded WebM stream.
#[derive(Debug, Clone, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Chunk>,
    total_bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Zero-length chunks are discarded.
    ///
    /// Returns whether the chunk was kept.
    pub fn push(&mut self, chunk: Chunk) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
        true
    }

    /// Number of chunks held
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Sum of all chunk sizes
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    /// Concatenate every chunk, in order, into one WebM payload
    pub fn to_payload(&self) -> MediaData {
        let mut data = Vec::with_capacity(self.total_bytes);
        for chunk in &self.chunks {
            data.extend_from_slice(chunk.as_bytes());
        }
        MediaData::new(data, ContainerFormat::Webm)
    }
}
