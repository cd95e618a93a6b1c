//! Progress tracking for knowledge-base builds.

use instant::Instant;

/// Progress of embedding the chunks of one source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProgress {
    /// Number of chunks embedded so far
    pub chunks_completed: usize,
    /// Total number of chunks to embed
    pub chunks_total: usize,
    /// Time elapsed since start (milliseconds)
    pub elapsed_ms: u64,
}

impl BuildProgress {
    pub fn new(chunks_completed: usize, chunks_total: usize, elapsed_ms: u64) -> Self {
        Self {
            chunks_completed,
            chunks_total,
            elapsed_ms,
        }
    }

    /// Returns the completion percentage (0.0 to 100.0).
    pub fn percent_complete(&self) -> f64 {
        if self.chunks_total == 0 {
            0.0
        } else {
            (self.chunks_completed as f64 / self.chunks_total as f64) * 100.0
        }
    }

    /// Returns true if every chunk has been embedded.
    pub fn is_complete(&self) -> bool {
        self.chunks_completed >= self.chunks_total
    }

    /// Returns estimated time remaining in milliseconds, if computable.
    pub fn estimated_remaining_ms(&self) -> Option<u64> {
        if self.chunks_completed == 0 || self.chunks_completed >= self.chunks_total {
            return None;
        }
        let remaining_chunks = self.chunks_total - self.chunks_completed;
        let ms_per_chunk = self.elapsed_ms / self.chunks_completed as u64;
        Some(remaining_chunks as u64 * ms_per_chunk)
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Number of chunks written
    pub chunks: usize,
    /// Embedding dimension of every chunk
    pub dimension: usize,
    /// Time spent chunking and embedding (milliseconds)
    pub elapsed_ms: u64,
}

/// Helper for tracking elapsed time during processing.
pub struct ProgressTimer {
    start: Instant,
}

impl ProgressTimer {
    /// Creates a new timer starting now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for ProgressTimer {
    fn default() -> Self {
        Self::new()
    }
}
