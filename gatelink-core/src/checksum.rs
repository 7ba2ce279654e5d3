//! Frame checksum algorithms
//!
//! The trailer checksum is pluggable per adapter. Two algorithms ship with
//! the core:
//! - [`Crc32`]: IEEE CRC-32, used by the Entropy V4.8 layout
//! - [`OnesComplementSum`]: 16-bit ones-complement word sum as used by
//!   ZKTeco packet headers
//!
//! Both produce a `u32` that is written little-endian into the 4-byte trailer.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

/// Checksum algorithm behind the trailer hook
pub trait Checksum: Send + Sync {
    /// Algorithm name, for logs and statistics
    fn name(&self) -> &'static str;

    /// Compute the checksum of header and payload bytes
    fn compute(&self, data: &[u8]) -> u32;

    /// Verify data against a received checksum
    fn verify(&self, data: &[u8], expected: u32) -> bool {
        self.compute(data) == expected
    }
}

/// Shared handle to a checksum algorithm
pub type SharedChecksum = Arc<dyn Checksum>;

impl fmt::Debug for dyn Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.name())
    }
}

/// IEEE CRC-32
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl Checksum for Crc32 {
    fn name(&self) -> &'static str {
        "crc32"
    }

    fn compute(&self, data: &[u8]) -> u32 {
        let checksum = crc32fast::hash(data);

        trace!(
            data_len = data.len(),
            checksum = format!("0x{:08X}", checksum),
            "Calculated CRC32"
        );

        checksum
    }
}

/// Ones-complement sum of 16-bit little-endian words
///
/// # Algorithm
///
/// ```text
/// 1. Sum all 16-bit words (little-endian), odd trailing byte as low byte
/// 2. While sum > 0xFFFF: sum -= 0xFFFF
/// 3. Return ~sum as u16, widened to u32
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OnesComplementSum;

impl Checksum for OnesComplementSum {
    fn name(&self) -> &'static str {
        "ones-complement"
    }

    fn compute(&self, data: &[u8]) -> u32 {
        let mut sum: u32 = 0;

        for chunk in data.chunks(2) {
            let word = if chunk.len() == 2 {
                u16::from_le_bytes([chunk[0], chunk[1]]) as u32
            } else {
                chunk[0] as u32
            };

            sum = sum.wrapping_add(word);

            while sum > 0xFFFF {
                sum = sum.wrapping_sub(0xFFFF);
            }
        }

        let checksum = !(sum as u16) as u32;

        trace!(
            data_len = data.len(),
            checksum = format!("0x{:04X}", checksum),
            "Calculated ones-complement sum"
        );

        checksum
    }
}

/// Resolve an algorithm by name (`crc32`, `ones-complement`)
pub fn by_name(name: &str) -> Option<SharedChecksum> {
    match name.to_ascii_lowercase().as_str() {
        "crc32" => Some(Arc::new(Crc32)),
        "ones-complement" | "ones_complement" => Some(Arc::new(OnesComplementSum)),
        _ => None,
    }
}
