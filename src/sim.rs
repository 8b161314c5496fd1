use std::io::BufRead;

use crate::{
    address::AddressCodec,
    cache::SetAssociativeCache,
    error::SimResult,
    geometry::{CacheConfiguration, CacheGeometry},
    stats::{SimulationStatistics, SimulationSummary},
    trace::{TraceReader, TraceRecord},
};

/// Cycles charged per processed address on top of its cache accesses.
const INSTRUCTION_CYCLES: u64 = 2;
const OPERAND_RECORD_CYCLES: u64 = 1;

/// Everything a reporter needs once a run is over.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub config: CacheConfiguration,
    pub geometry: CacheGeometry,
    pub summary: SimulationSummary,
}

/// Drives one trace through one cache.
pub struct Simulator {
    config: CacheConfiguration,
    geometry: CacheGeometry,
    codec: AddressCodec,
    cache: SetAssociativeCache,
    stats: SimulationStatistics,
}

impl Simulator {
    /// Fails with `UnsupportedPolicy` for LRU, before any trace is read.
    pub fn new(config: CacheConfiguration, seed: Option<u64>) -> SimResult<Self> {
        let geometry = CacheGeometry::from_config(&config);
        let policy = config.replacement.build(geometry.num_rows as usize, seed)?;
        log::info!(
            "{} blocks in {} rows, tag/index/offset = {}/{}/{} bits",
            geometry.num_blocks,
            geometry.num_rows,
            geometry.tag_bits,
            geometry.index_bits,
            geometry.offset_bits
        );
        Ok(Self {
            codec: AddressCodec::new(&geometry),
            cache: SetAssociativeCache::new(&geometry, policy),
            stats: SimulationStatistics::default(),
            config,
            geometry,
        })
    }

    pub fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    pub fn run_trace<R: BufRead>(&mut self, trace: TraceReader<R>) -> SimResult<()> {
        for record in trace {
            self.process_record(&record?);
        }
        log::info!(
            "processed {} addresses in {} cache accesses",
            self.stats.total_addresses,
            self.stats.total_cache_accesses
        );
        Ok(())
    }

    pub fn process_record(&mut self, record: &TraceRecord) {
        log::debug!("{record:?}");
        for (address, width) in record.accesses() {
            self.process_address(address, width);
            self.stats.total_addresses += 1;
            if record.is_instruction() {
                self.stats.cpi_cycles += INSTRUCTION_CYCLES;
                self.stats.num_instructions += 1;
            } else {
                self.stats.cpi_cycles += OPERAND_RECORD_CYCLES;
            }
        }
    }

    /// Accesses that run past the end of a block continue at the next
    /// index with the same tag rather than at the next aligned address.
    fn process_address(&mut self, address: u32, width: u32) {
        self.stats.logical_cycle += 1;
        let fields = self.codec.split(address);
        let block_size = self.geometry.block_size as u64;
        let span = (fields.offset as u64 + width as u64).div_ceil(block_size);
        for k in 0..span {
            self.cache
                .access(fields.tag, fields.index as u64 + k, &mut self.stats);
        }
    }

    pub fn finish(self) -> SimulationReport {
        let unused_blocks = self.cache.unused_blocks();
        SimulationReport {
            summary: self.stats.finalize(&self.geometry, unused_blocks),
            config: self.config,
            geometry: self.geometry,
        }
    }
}
