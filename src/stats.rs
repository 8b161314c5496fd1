use crate::geometry::{COST_PER_KB, CacheGeometry};

/// Running counters for one simulation. Only ever increase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStatistics {
    pub total_cache_accesses: u64,
    pub total_addresses: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub compulsory_misses: u64,
    pub conflict_misses: u64,
    pub cpi_cycles: u64,
    pub num_instructions: u64,
    /// Recency timestamp source, advanced once per processed address.
    pub logical_cycle: u64,
}

impl SimulationStatistics {
    pub fn record_hit(&mut self, cycles: u64) {
        self.total_cache_accesses += 1;
        self.cache_hits += 1;
        self.cpi_cycles += cycles;
    }

    pub fn record_compulsory_miss(&mut self) {
        self.total_cache_accesses += 1;
        self.cache_misses += 1;
        self.compulsory_misses += 1;
    }

    pub fn record_conflict_miss(&mut self) {
        self.total_cache_accesses += 1;
        self.cache_misses += 1;
        self.conflict_misses += 1;
    }

    pub fn hit_rate(&self) -> f64 {
        if self.total_cache_accesses == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_cache_accesses as f64 * 100.0
        }
    }

    pub fn miss_rate(&self) -> f64 {
        if self.total_cache_accesses == 0 {
            0.0
        } else {
            100.0 - self.hit_rate()
        }
    }

    pub fn cpi(&self) -> f64 {
        if self.num_instructions == 0 {
            0.0
        } else {
            self.cpi_cycles as f64 / self.num_instructions as f64
        }
    }

    /// Freezes the counters into the figures reported after a run.
    pub fn finalize(self, geometry: &CacheGeometry, unused_blocks: u64) -> SimulationSummary {
        if self.total_cache_accesses == 0 {
            log::warn!("trace produced no cache accesses, reporting hit and miss rate as 0");
        }
        if self.num_instructions == 0 {
            log::warn!("trace retired no instructions, reporting CPI as 0");
        }
        let unused_space_kb = unused_blocks as f64 * geometry.block_footprint_bytes() / 1024.0;
        SimulationSummary {
            hit_rate: self.hit_rate(),
            miss_rate: self.miss_rate(),
            cpi: self.cpi(),
            unused_blocks,
            unused_space_kb,
            unused_space_percentage: unused_space_kb / geometry.implementation_kb * 100.0,
            waste_usd: unused_space_kb * COST_PER_KB,
            counters: self,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub counters: SimulationStatistics,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub cpi: f64,
    pub unused_blocks: u64,
    pub unused_space_kb: f64,
    pub unused_space_percentage: f64,
    pub waste_usd: f64,
}
