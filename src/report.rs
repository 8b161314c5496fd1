use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use crate::{
    geometry::{CacheConfiguration, CacheGeometry},
    sim::SimulationReport,
    stats::SimulationSummary,
};

pub const DEFAULT_RESULTS_FILE: &str = "Trace_Results.csv";

pub fn write_configuration(
    out: &mut impl Write,
    config: &CacheConfiguration,
    geometry: &CacheGeometry,
) -> io::Result<()> {
    writeln!(out, "Cache Simulator\n")?;
    writeln!(out, "Trace File: {}\n", config.trace_file.display())?;
    writeln!(out, "***** Cache Input Parameters *****")?;
    writeln!(out, "{:<32}{} KB", "Cache Size:", config.cache_size_kb)?;
    writeln!(out, "{:<32}{} bytes", "Block Size:", config.block_size)?;
    writeln!(out, "{:<32}{}", "Associativity:", config.associativity)?;
    writeln!(out, "{:<32}{}\n", "Replacement Policy:", config.replacement)?;
    writeln!(out, "***** Cache Calculated Values *****\n")?;
    writeln!(out, "{:<32}{}", "Total # Blocks:", geometry.num_blocks)?;
    writeln!(out, "{:<32}{} bits", "Tag Size:", geometry.tag_bits)?;
    writeln!(out, "{:<32}{} bits", "Index Size:", geometry.index_bits)?;
    writeln!(out, "{:<32}{}", "Total # Rows:", geometry.num_rows)?;
    writeln!(out, "{:<32}{} bytes", "Overhead Size:", geometry.overhead_bytes)?;
    writeln!(
        out,
        "{:<32}{:.2} KB ({} bytes)",
        "Implementation Memory Size:", geometry.implementation_kb, geometry.implementation_bytes
    )?;
    writeln!(out, "{:<32}${:.2}\n", "Cost:", geometry.cost_usd)
}

pub fn write_results(
    out: &mut impl Write,
    summary: &SimulationSummary,
    geometry: &CacheGeometry,
) -> io::Result<()> {
    let c = &summary.counters;
    writeln!(out, "***** CACHE SIMULATION RESULTS *****\n")?;
    writeln!(
        out,
        "{:<24}{:<7}({} addresses)",
        "Total Cache Accesses:", c.total_cache_accesses, c.total_addresses
    )?;
    writeln!(out, "{:<24}{}", "Cache Hits:", c.cache_hits)?;
    writeln!(out, "{:<24}{}", "Cache Misses:", c.cache_misses)?;
    writeln!(out, "{:<27}{}", "--- Compulsory Misses:", c.compulsory_misses)?;
    writeln!(out, "{:<27}{}\n\n", "--- Conflict Misses:", c.conflict_misses)?;
    writeln!(out, "***** ***** CACHE HIT & MISS RATE: ***** *****\n")?;
    writeln!(out, "{:<5}{:<18}{:.4}%", "Hit", "Rate:", summary.hit_rate)?;
    writeln!(out, "{:<5}{:<18}{:.4}%", "Miss", "Rate:", summary.miss_rate)?;
    writeln!(
        out,
        "{:<23}{:.2} Cycles/Instruction  ({})",
        "CPI:", summary.cpi, c.num_instructions
    )?;
    writeln!(
        out,
        "{:<23}{:.2} KB / {:.2} KB = {:.2}%  Waste: ${:.2}",
        "Unused Cache Space:",
        summary.unused_space_kb,
        geometry.implementation_kb,
        summary.unused_space_percentage,
        summary.waste_usd
    )?;
    writeln!(
        out,
        "{:<23}{} / {}\n",
        "Unused Cache Blocks:", summary.unused_blocks, geometry.num_blocks
    )
}

/// One results row: trace, inputs, geometry, then rates and waste.
pub fn csv_record(report: &SimulationReport) -> Vec<String> {
    let SimulationReport {
        config,
        geometry,
        summary,
    } = report;
    let mut record = vec![
        config.trace_file.display().to_string(),
        config.cache_size_kb.to_string(),
        config.block_size.to_string(),
        config.associativity.to_string(),
        config.replacement.to_string(),
        geometry.num_blocks.to_string(),
        geometry.num_rows.to_string(),
        geometry.overhead_bytes.to_string(),
    ];
    record.extend(
        [
            geometry.implementation_kb,
            geometry.cost_usd,
            summary.hit_rate,
            summary.miss_rate,
            summary.cpi,
            summary.unused_space_kb,
            summary.unused_space_percentage,
            summary.waste_usd,
        ]
        .iter()
        .map(|value| format!("{value:.6}")),
    );
    record
}

/// Appends the report's row to `path`, creating the file if needed.
pub fn append_csv(path: impl AsRef<Path>, report: &SimulationReport) -> csv::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(csv_record(report))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::ReplacementKind,
        sim::Simulator,
        trace::{TraceReader, parse_line},
    };
    use std::{fs, io::Cursor};

    fn report() -> SimulationReport {
        let config =
            CacheConfiguration::new("demo.trc", 1, 4, 1, ReplacementKind::RoundRobin).unwrap();
        let mut sim = Simulator::new(config, None).unwrap();
        let trace = "EIP (02): 00001000 90\n\ndstM: 00000000 00000000    srcM: 0000abcc 00000000\n";
        sim.run_trace(TraceReader::new(Cursor::new(trace))).unwrap();
        sim.process_record(&parse_line("EIP (02): 00001000 90", 1).unwrap().unwrap());
        sim.finish()
    }

    fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap()
            .records()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn csv_record_has_sixteen_fields_in_order() {
        let record = csv_record(&report());
        assert_eq!(record.len(), 16);
        assert_eq!(
            &record[..8],
            &["demo.trc", "1", "4", "1", "Round Robin", "256", "256", "736"]
        );
        // Three accesses, one hit.
        assert_eq!(record[10], "33.333333");
        assert_eq!(record[11], "66.666667");
    }

    #[test]
    fn append_creates_then_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let report = report();
        append_csv(&path, &report).unwrap();
        append_csv(&path, &report).unwrap();
        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], rows[1]);
        assert_eq!(rows[0].iter().collect::<Vec<_>>(), csv_record(&report));
    }

    #[test]
    fn comma_in_trace_path_stays_one_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let mut report = report();
        report.config.trace_file = "runs,2024/t.trc".into();
        append_csv(&path, &report).unwrap();
        let rows = read_rows(&path);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 16);
        assert_eq!(&rows[0][0], "runs,2024/t.trc");
        assert_eq!(&rows[0][4], "Round Robin");
    }

    #[test]
    fn console_report_lists_geometry_and_results() {
        let report = report();
        let mut out = Vec::new();
        write_configuration(&mut out, &report.config, &report.geometry).unwrap();
        write_results(&mut out, &report.summary, &report.geometry).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Trace File: demo.trc"));
        assert!(text.contains(&format!("{:<32}{}", "Replacement Policy:", "Round Robin")));
        assert!(text.contains(&format!("{:<32}{} bits", "Tag Size:", 22)));
        assert!(text.contains(&format!("{:<24}{:<7}({} addresses)", "Total Cache Accesses:", 3, 3)));
        assert!(text.contains(&format!("{:<5}{:<18}{}", "Hit", "Rate:", "33.3333%")));
        assert!(text.contains(&format!("{:<23}{} / {}", "Unused Cache Blocks:", 254, 256)));
    }
}
