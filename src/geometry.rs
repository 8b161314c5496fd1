use std::{fmt, path::PathBuf};

use clap::ValueEnum;

use crate::error::{SimError, SimResult};

pub const ADDRESS_BITS: u32 = 32;
pub const COST_PER_KB: f64 = 0.09;

pub const CACHE_SIZE_KB_RANGE: std::ops::RangeInclusive<u32> = 1..=8192;
pub const BLOCK_SIZE_RANGE: std::ops::RangeInclusive<u32> = 4..=64;
pub const ASSOCIATIVITIES: [u32; 5] = [1, 2, 4, 8, 16];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReplacementKind {
    #[value(name = "RR")]
    RoundRobin,
    #[value(name = "RND")]
    Random,
    #[value(name = "LRU")]
    LeastRecentlyUsed,
}

impl ReplacementKind {
    pub fn pretty_name(&self) -> &'static str {
        match self {
            ReplacementKind::RoundRobin => "Round Robin",
            ReplacementKind::Random => "Random",
            ReplacementKind::LeastRecentlyUsed => "Least Recently Used",
        }
    }
}

impl fmt::Display for ReplacementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.pretty_name())
    }
}

/// Validated simulation inputs. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct CacheConfiguration {
    pub trace_file: PathBuf,
    pub cache_size_kb: u32,
    pub block_size: u32, // in Bytes
    pub associativity: u32,
    pub replacement: ReplacementKind,
}

impl CacheConfiguration {
    pub fn new(
        trace_file: impl Into<PathBuf>,
        cache_size_kb: u32,
        block_size: u32,
        associativity: u32,
        replacement: ReplacementKind,
    ) -> SimResult<Self> {
        if !CACHE_SIZE_KB_RANGE.contains(&cache_size_kb) {
            return Err(SimError::Configuration(format!(
                "cache size {cache_size_kb} KB outside 1..=8192"
            )));
        }
        if !BLOCK_SIZE_RANGE.contains(&block_size) {
            return Err(SimError::Configuration(format!(
                "block size {block_size} bytes outside 4..=64"
            )));
        }
        if !ASSOCIATIVITIES.contains(&associativity) {
            return Err(SimError::Configuration(format!(
                "associativity {associativity} is not one of 1, 2, 4, 8, 16"
            )));
        }
        Ok(Self {
            trace_file: trace_file.into(),
            cache_size_kb,
            block_size,
            associativity,
            replacement,
        })
    }

    pub fn cache_size_bytes(&self) -> u64 {
        self.cache_size_kb as u64 * 1024
    }
}

/// Sizing values derived once from a [`CacheConfiguration`].
///
/// Field widths use a floored log2, so block sizes and row counts are
/// assumed to be powers of two. Other values still produce a geometry but
/// the tag/index/offset split no longer describes real hardware.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheGeometry {
    pub num_blocks: u32,
    pub num_rows: u32,
    pub associativity: u32,
    pub block_size: u32,
    pub offset_bits: u32,
    pub index_bits: u32,
    pub tag_bits: u32,
    pub overhead_bytes: u64,
    pub implementation_bytes: u64,
    pub implementation_kb: f64,
    pub cost_usd: f64,
}

impl CacheGeometry {
    pub fn from_config(config: &CacheConfiguration) -> Self {
        let num_blocks = (config.cache_size_bytes() / config.block_size as u64) as u32;
        let num_rows = num_blocks / config.associativity;
        let offset_bits = floor_log2(config.block_size);
        let index_bits = floor_log2(num_rows);
        let tag_bits = ADDRESS_BITS - index_bits - offset_bits;
        // One validity bit plus the tag per block.
        let overhead_bytes = num_blocks as u64 * (tag_bits as u64 + 1) / 8;
        let implementation_bytes = config.cache_size_bytes() + overhead_bytes;
        let implementation_kb = implementation_bytes as f64 / 1024.0;
        Self {
            num_blocks,
            num_rows,
            associativity: config.associativity,
            block_size: config.block_size,
            offset_bits,
            index_bits,
            tag_bits,
            overhead_bytes,
            implementation_bytes,
            implementation_kb,
            cost_usd: implementation_kb * COST_PER_KB,
        }
    }

    /// Bytes one block occupies including its tag and validity bit.
    pub fn block_footprint_bytes(&self) -> f64 {
        self.block_size as f64 + (self.tag_bits + 1) as f64 / 8.0
    }
}

fn floor_log2(value: u32) -> u32 {
    if value == 0 { 0 } else { value.ilog2() }
}
