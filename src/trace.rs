//! Fixed-column trace format.
//!
//! Instruction fetches look like
//! `EIP (04): 7c809767 83 ec 28    sub esp,0x28`
//! and the memory operands of that instruction follow on their own line,
//! `dstM: 0012f424 00000000    srcM: 00000000 00000000`.
//! An all-zero operand address means the instruction had no such operand.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    ops::Range,
    path::Path,
};

use crate::{
    address::parse_hex_address,
    error::{SimError, SimResult},
};

/// Lines shorter than this carry no record.
pub const MIN_RECORD_LEN: usize = 6;
/// Width in bytes of every data operand access.
pub const OPERAND_WIDTH: u32 = 4;

const INSTRUCTION_MARKER: &str = "EIP";
const FETCH_WIDTH: Range<usize> = 5..7;
const FETCH_ADDRESS: Range<usize> = 10..18;
const DESTINATION_ADDRESS: Range<usize> = 6..14;
const SOURCE_ADDRESS: Range<usize> = 33..41;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceRecord {
    InstructionFetch { width: u32, address: u32 },
    MemoryOperands { destination: Option<u32>, source: Option<u32> },
}

impl TraceRecord {
    /// Addresses this record touches, paired with the access width.
    pub fn accesses(&self) -> impl Iterator<Item = (u32, u32)> {
        let (first, second) = match *self {
            TraceRecord::InstructionFetch { width, address } => (Some((address, width)), None),
            TraceRecord::MemoryOperands {
                destination,
                source,
            } => (
                destination.map(|a| (a, OPERAND_WIDTH)),
                source.map(|a| (a, OPERAND_WIDTH)),
            ),
        };
        first.into_iter().chain(second)
    }

    pub fn is_instruction(&self) -> bool {
        matches!(self, TraceRecord::InstructionFetch { .. })
    }
}

/// Parses one trace line. `Ok(None)` for lines too short to hold a record.
///
/// Only the fixed columns are decoded, so bytes elsewhere on the line (the
/// disassembly text, for instance) need not be valid UTF-8.
pub fn parse_line(line: impl AsRef<[u8]>, line_no: usize) -> SimResult<Option<TraceRecord>> {
    let mut line = line.as_ref();
    while let [rest @ .., b'\r' | b'\n'] = line {
        line = rest;
    }
    if line.len() < MIN_RECORD_LEN {
        return Ok(None);
    }

    if line.starts_with(INSTRUCTION_MARKER.as_bytes()) {
        let width_bytes = field(line, FETCH_WIDTH, line_no, "access width")?;
        let width = std::str::from_utf8(width_bytes)
            .ok()
            .and_then(|text| text.trim().parse::<u32>().ok())
            .ok_or_else(|| SimError::TraceFormat {
                line: line_no,
                reason: format!(
                    "invalid access width '{}'",
                    String::from_utf8_lossy(width_bytes)
                ),
            })?;
        let address = address(line, FETCH_ADDRESS, line_no, "fetch address")?;
        return Ok(Some(TraceRecord::InstructionFetch { width, address }));
    }

    let destination = operand(line, DESTINATION_ADDRESS, line_no, "destination address")?;
    let source = operand(line, SOURCE_ADDRESS, line_no, "source address")?;
    Ok(Some(TraceRecord::MemoryOperands {
        destination,
        source,
    }))
}

fn field<'a>(line: &'a [u8], range: Range<usize>, line_no: usize, name: &str) -> SimResult<&'a [u8]> {
    line.get(range.clone()).ok_or_else(|| SimError::TraceFormat {
        line: line_no,
        reason: format!(
            "{name} expected at columns {}..{}, line has {} bytes",
            range.start,
            range.end,
            line.len()
        ),
    })
}

fn address(line: &[u8], range: Range<usize>, line_no: usize, name: &str) -> SimResult<u32> {
    let bytes = field(line, range, line_no, name)?;
    std::str::from_utf8(bytes)
        .ok()
        .and_then(parse_hex_address)
        .ok_or_else(|| SimError::MalformedAddress {
            address: String::from_utf8_lossy(bytes).into_owned(),
            line: line_no,
        })
}

fn operand(line: &[u8], range: Range<usize>, line_no: usize, name: &str) -> SimResult<Option<u32>> {
    let address = address(line, range, line_no, name)?;
    Ok((address != 0).then_some(address))
}

/// Streams records from a trace one line at a time.
pub struct TraceReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
}

impl TraceReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> SimResult<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = SimResult<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }
            self.line_no += 1;
            match parse_line(&self.buf, self.line_no) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
