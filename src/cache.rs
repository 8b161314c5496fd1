use crate::{geometry::CacheGeometry, policy::ReplacementPolicy, stats::SimulationStatistics};

/// Cycles charged for a hit.
pub const HIT_CYCLES: u64 = 1;
/// Memory transfers are modelled in 4-byte words, 4 cycles each.
const WORD_BYTES: u64 = 4;
const CYCLES_PER_WORD: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit,
    CompulsoryMiss,
    ConflictMiss,
}

#[derive(Debug, Clone, Default)]
pub struct CacheBlock {
    pub valid: bool,
    pub tag: u32,
    pub timestamp: u64,
}

pub struct SetAssociativeCache {
    blocks: Vec<CacheBlock>,
    policy: Box<dyn ReplacementPolicy>,
    ways: usize,
    num_rows: usize,
    miss_cycles: u64,
}

impl SetAssociativeCache {
    pub fn new(geometry: &CacheGeometry, policy: Box<dyn ReplacementPolicy>) -> Self {
        let block_words = geometry.block_size as u64 / WORD_BYTES;
        Self {
            blocks: vec![CacheBlock::default(); geometry.num_blocks as usize],
            policy,
            ways: geometry.associativity as usize,
            num_rows: geometry.num_rows as usize,
            miss_cycles: CYCLES_PER_WORD * block_words,
        }
    }

    /// Resolves one access against the row selected by `index`.
    ///
    /// Index values past the last row wrap around, so `index + 1` on the
    /// final row lands on row 0. When the block count is not a multiple of
    /// the associativity (non-power-of-two block sizes), the trailing
    /// `num_blocks % ways` blocks are never reachable.
    pub fn access(&mut self, tag: u32, index: u64, stats: &mut SimulationStatistics) -> AccessOutcome {
        let row = (index % self.num_rows as u64) as usize;
        let start = row * self.ways;
        let now = stats.logical_cycle;
        let lines = &mut self.blocks[start..start + self.ways];

        if let Some(line) = lines.iter_mut().find(|line| line.valid && line.tag == tag) {
            line.timestamp = now;
            stats.record_hit(HIT_CYCLES);
            log::trace!("row {row}: hit tag {tag:#x}");
            return AccessOutcome::Hit;
        }

        stats.cpi_cycles += self.miss_cycles;
        if let Some(line) = lines.iter_mut().find(|line| !line.valid) {
            install(line, tag, now);
            stats.record_compulsory_miss();
            log::trace!("row {row}: compulsory miss tag {tag:#x}");
            return AccessOutcome::CompulsoryMiss;
        }

        let way = self.policy.victim(row, self.ways);
        let victim = &mut lines[way];
        log::trace!(
            "row {row}: conflict miss tag {tag:#x}, evicting way {way} (tag {:#x}, last used {})",
            victim.tag,
            victim.timestamp
        );
        install(victim, tag, now);
        stats.record_conflict_miss();
        AccessOutcome::ConflictMiss
    }

    #[cfg(test)]
    pub fn blocks(&self) -> &[CacheBlock] {
        &self.blocks
    }

    pub fn unused_blocks(&self) -> u64 {
        self.blocks.iter().filter(|line| !line.valid).count() as u64
    }
}

fn install(line: &mut CacheBlock, tag: u32, now: u64) {
    line.valid = true;
    line.tag = tag;
    line.timestamp = now;
}
