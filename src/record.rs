//! # Input record interface (spec.md §6 Input)
//!
//! The parser itself is out of scope (an external collaborator); this
//! module defines the interface the rest of the crate consumes and ships
//! a minimal, correct-enough FASTA/FASTQ reader auto-detecting from the
//! first byte, the way `io::bed::BedFile` implements `RepeatSource` over a
//! concrete file in the teacher.
use std::io::BufRead;

use anyhow::{Context, Result};

/// One input record: an id, its sequence, and an optional quality string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub sequence: Vec<u8>,
    pub quality: Option<Vec<u8>>,
}

/// A blocking record stream. The external parser's contract (spec.md §6):
/// `next() -> Option<Record>`, except a genuine I/O failure must be
/// distinguishable from clean end-of-stream so the reader thread can
/// surface it (spec.md §5/§7) instead of quietly finalizing as if the
/// source had simply run out of records.
pub trait RecordSource {
    fn next_record(&mut self) -> Result<Option<RawRecord>>;
}

/// Minimal auto-detecting FASTA/FASTQ reader over any `BufRead`. Detects
/// format from the first non-empty line's leading byte (`>` or `@`) and
/// stays in that format for the rest of the stream.
///
/// Line-ending handling fixes the source's `format_forward` bug (spec.md
/// §9 Open Questions): both `\n` and `\r` are treated as line-ending bytes
/// to strip, not "anything that isn't both at once."
pub struct FastxReader<R> {
    reader: R,
    format: Option<Format>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Fasta,
    Fastq,
}

impl<R: BufRead> FastxReader<R> {
    pub fn new(reader: R) -> Self {
        FastxReader { reader, format: None }
    }

    /// Reads one line, stripped of its trailing line ending. `Ok(None)`
    /// means clean end-of-stream; a genuine I/O failure is returned as
    /// `Err` rather than folded into the `None` case.
    fn read_line_trimmed(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).context("reading input line")?;
        if n == 0 {
            return Ok(None);
        }
        trim_line_ending(&mut line);
        Ok(Some(line))
    }
}

/// Strip trailing `\n` and/or `\r` (both, whichever are present), per the
/// corrected skip logic.
fn trim_line_ending(line: &mut String) {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
}

impl<R: BufRead> RecordSource for FastxReader<R> {
    fn next_record(&mut self) -> Result<Option<RawRecord>> {
        let header = loop {
            let Some(line) = self.read_line_trimmed()? else {
                return Ok(None);
            };
            if !line.is_empty() {
                break line;
            }
        };

        let format = *self.format.get_or_insert_with(|| match header.as_bytes().first() {
            Some(b'@') => Format::Fastq,
            _ => Format::Fasta,
        });

        match format {
            Format::Fasta => {
                if !header.starts_with('>') {
                    return Ok(None);
                }
                let name = header[1..].to_string();
                let sequence = self.read_line_trimmed()?.unwrap_or_default().into_bytes();
                Ok(Some(RawRecord {
                    name,
                    sequence,
                    quality: None,
                }))
            }
            Format::Fastq => {
                if !header.starts_with('@') {
                    return Ok(None);
                }
                let name = header[1..].to_string();
                let sequence = self.read_line_trimmed()?.unwrap_or_default().into_bytes();
                let _plus = self.read_line_trimmed()?;
                let quality = self.read_line_trimmed()?.map(String::into_bytes);
                Ok(Some(RawRecord {
                    name,
                    sequence,
                    quality,
                }))
            }
        }
    }
}
