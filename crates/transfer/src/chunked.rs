use crate::{BYTES_PER_MB, DEFAULT_CHUNK_SIZE};

/// Converts a megabyte setting to bytes.
///
/// A value of 0 maps to [`DEFAULT_CHUNK_SIZE`] so a part plan never has a
/// zero-sized part.
pub fn mb_to_bytes(mb: u64) -> u64 {
    if mb == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        mb.saturating_mul(BYTES_PER_MB)
    }
}

/// Half-open byte range `[start, end)` of one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    /// 1-based part number.
    pub part_number: u32,
    pub start: u64,
    pub end: u64,
}

impl PartRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Splits a file of `size` bytes into fixed-size parts.
///
/// Parts are numbered from 1. The last part holds the remainder. A
/// zero-byte file has no parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartPlan {
    size: u64,
    chunk_size: u64,
    total_parts: u32,
}

impl PartPlan {
    /// Builds a plan. If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(size: u64, chunk_size: u64) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        let total_parts = size.div_ceil(chunk_size);
        Self {
            size,
            chunk_size,
            total_parts: u32::try_from(total_parts).unwrap_or(u32::MAX),
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn total_parts(&self) -> u32 {
        self.total_parts
    }

    /// Returns the byte range of `part_number`, or `None` if out of range.
    pub fn range(&self, part_number: u32) -> Option<PartRange> {
        if part_number == 0 || part_number > self.total_parts {
            return None;
        }
        let start = u64::from(part_number - 1) * self.chunk_size;
        let end = std::cmp::min(u64::from(part_number) * self.chunk_size, self.size);
        Some(PartRange {
            part_number,
            start,
            end,
        })
    }

    /// Iterates parts in increasing part-number order.
    pub fn parts(&self) -> impl Iterator<Item = PartRange> + '_ {
        (1..=self.total_parts).filter_map(|n| self.range(n))
    }
}
