//! # Alignment sinks + run summary (spec.md §6 Output)
//!
//! `AlignmentSink` is a plain trait object sink accepting alignment
//! records — the redesign of the source's back-pointer `Output` struct
//! (spec.md §9 "Cyclic / back-reference patterns") — plus concrete writers
//! for the output formats named in spec.md §6. Mirrors the read-side
//! `RepeatSource`/`CopyNumberVariantSource` split the teacher uses in
//! `io::bed`, applied to the write side.
use std::io::Write;

use anyhow::{Context, Result};

use crate::index::References;
use crate::read::{Alignment, Read};
use crate::stats::RunStats;

/// One emitted record: which read, which reference header, and the
/// alignment itself.
pub struct EmittedAlignment<'a> {
    pub read: &'a Read,
    pub ref_header: &'a str,
    pub alignment: &'a Alignment,
}

/// A sink for accepted alignments. Implemented once per output format;
/// the pipeline's Writer holds a `Vec<Box<dyn AlignmentSink>>` and fans
/// each emitted alignment out to all configured sinks.
pub trait AlignmentSink: Send {
    fn emit(&mut self, record: &EmittedAlignment<'_>) -> Result<()>;
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// BLAST-tabular (`-m 8`-style) output: one tab-separated line per
/// alignment.
pub struct BlastTabularSink<W: Write> {
    writer: W,
}

impl<W: Write> BlastTabularSink<W> {
    pub fn new(writer: W) -> Self {
        BlastTabularSink { writer }
    }
}

impl<W: Write + Send> AlignmentSink for BlastTabularSink<W> {
    fn emit(&mut self, record: &EmittedAlignment<'_>) -> Result<()> {
        let a = record.alignment;
        writeln!(
            self.writer,
            "{}\t{}\t{:.2}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.read.id,
            record.ref_header,
            a.identity_pct,
            a.read_start,
            a.read_end,
            a.ref_start,
            a.ref_end,
            a.evalue,
            a.score,
        )
        .context("writing BLAST-tabular record")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("flushing BLAST-tabular sink")
    }
}

/// Minimal SAM output: enough fields to be a valid alignment line (no
/// header, no read group handling — out of scope per spec.md's external-
/// collaborator boundary on output formatting niceties).
pub struct SamSink<W: Write> {
    writer: W,
}

impl<W: Write> SamSink<W> {
    pub fn new(writer: W) -> Self {
        SamSink { writer }
    }
}

impl<W: Write + Send> AlignmentSink for SamSink<W> {
    fn emit(&mut self, record: &EmittedAlignment<'_>) -> Result<()> {
        let a = record.alignment;
        writeln!(
            self.writer,
            "{}\t0\t{}\t{}\t255\t{}\t*\t0\t0\t{}\t*",
            record.read.id,
            record.ref_header,
            a.ref_start + 1,
            a.cigar,
            String::from_utf8_lossy(&record.read.sequence),
        )
        .context("writing SAM record")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("flushing SAM sink")
    }
}

/// FASTA of reads that did/didn't hit, selected via `matched`.
pub struct FastaSink<W: Write> {
    writer: W,
    matched: bool,
    emitted: std::collections::HashSet<u64>,
}

impl<W: Write> FastaSink<W> {
    pub fn new(writer: W, matched: bool) -> Self {
        FastaSink {
            writer,
            matched,
            emitted: std::collections::HashSet::new(),
        }
    }
}

impl<W: Write + Send> AlignmentSink for FastaSink<W> {
    fn emit(&mut self, record: &EmittedAlignment<'_>) -> Result<()> {
        if record.read.hit != self.matched {
            return Ok(());
        }
        if !self.emitted.insert(record.read.id) {
            return Ok(());
        }
        writeln!(
            self.writer,
            ">{}\n{}",
            record.read.id,
            String::from_utf8_lossy(&record.read.sequence)
        )
        .context("writing FASTA record")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("flushing FASTA sink")
    }
}

/// OTU-map output: one line per reference header, listing the ids of
/// reads whose best alignment to it cleared `min_id`/`min_cov` (spec.md
/// §4.4 "Acceptance": those two gate OTU-map output, not the `hit` flag).
pub struct OtuMapSink<W: Write> {
    writer: W,
    min_id: f64,
    min_cov: f64,
    by_ref: std::collections::BTreeMap<String, Vec<u64>>,
}

impl<W: Write> OtuMapSink<W> {
    pub fn new(writer: W, min_id: f64, min_cov: f64) -> Self {
        OtuMapSink {
            writer,
            min_id,
            min_cov,
            by_ref: std::collections::BTreeMap::new(),
        }
    }
}

impl<W: Write + Send> AlignmentSink for OtuMapSink<W> {
    fn emit(&mut self, record: &EmittedAlignment<'_>) -> Result<()> {
        let a = record.alignment;
        if a.identity_pct >= self.min_id && a.coverage_pct >= self.min_cov {
            self.by_ref
                .entry(record.ref_header.to_string())
                .or_default()
                .push(record.read.id);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for (header, ids) in &self.by_ref {
            let ids_str = ids.iter().map(u64::to_string).collect::<Vec<_>>().join("\t");
            writeln!(self.writer, "{header}\t{ids_str}").context("writing OTU-map record")?;
        }
        self.writer.flush().context("flushing OTU-map sink")
    }
}

/// Emit an alignment to every configured sink, looking up the reference
/// header from `refs`.
pub fn emit_to_all(
    sinks: &mut [Box<dyn AlignmentSink>],
    read: &Read,
    refs: &References,
    alignment: &Alignment,
) -> Result<()> {
    let ref_header = refs.header(alignment.ref_id).unwrap_or("unknown");
    let record = EmittedAlignment {
        read,
        ref_header,
        alignment,
    };
    for sink in sinks.iter_mut() {
        sink.emit(&record)?;
    }
    Ok(())
}

/// Append a human-readable end-of-run summary (spec.md §6: "totals,
/// per-database percentages, min/max/mean read length, timestamp").
/// `timestamp` is passed in rather than computed here, since `Date.now()`-
/// style wall-clock reads belong to the caller, not this pure formatter.
pub fn write_summary<W: Write>(mut writer: W, index_file: &str, stats: &RunStats, timestamp: &str) -> Result<()> {
    writeln!(writer, "# seedsieve summary — {timestamp}").context("writing summary header")?;
    writeln!(writer, "index: {index_file}").context("writing summary body")?;
    writeln!(writer, "reads processed: {}", stats.reads_processed()).context("writing summary body")?;
    writeln!(
        writer,
        "reads mapped: {} ({:.2}%)",
        stats.reads_mapped(),
        stats.mapped_pct()
    )
    .context("writing summary body")?;
    writeln!(writer, "reads eligible for de-novo clustering: {}", stats.reads_denovo())
        .context("writing summary body")?;
    writeln!(
        writer,
        "read length: min={:?} max={:?} mean={:.1}",
        stats.min_read_len(),
        stats.max_read_len(),
        stats.mean_read_len()
    )
    .context("writing summary body")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::WorkerStats;

    fn sample_alignment() -> Alignment {
        Alignment {
            ref_id: 0,
            ref_start: 10,
            ref_end: 28,
            read_start: 0,
            read_end: 18,
            score: 36,
            cigar: "18M".to_string(),
            evalue: 0.0001,
            identity_pct: 100.0,
            coverage_pct: 100.0,
        }
    }

    #[test]
    fn blast_tabular_writes_one_line_per_alignment() {
        let read = Read::new(5, b"ACGTACGTACGTACGTAC".to_vec(), None, 1);
        let mut buf = Vec::new();
        {
            let mut sink = BlastTabularSink::new(&mut buf);
            let record = EmittedAlignment {
                read: &read,
                ref_header: "ref0",
                alignment: &sample_alignment(),
            };
            sink.emit(&record).unwrap();
            sink.flush().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("5\tref0\t100.00"));
    }

    #[test]
    fn fasta_sink_filters_by_hit_status_and_dedupes() {
        let mut read = Read::new(1, b"ACGT".to_vec(), None, 1);
        read.hit = true;
        let mut buf = Vec::new();
        let mut sink = FastaSink::new(&mut buf, true);
        let record = EmittedAlignment {
            read: &read,
            ref_header: "ref0",
            alignment: &sample_alignment(),
        };
        sink.emit(&record).unwrap();
        sink.emit(&record).unwrap(); // second emit for the same read is a no-op
        sink.flush().unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches('>').count(), 1);
    }

    #[test]
    fn otu_map_filters_by_identity_and_coverage() {
        let read = Read::new(2, b"ACGT".to_vec(), None, 1);
        let mut buf = Vec::new();
        let mut sink = OtuMapSink::new(&mut buf, 99.0, 99.0);
        let mut low_quality = sample_alignment();
        low_quality.identity_pct = 50.0;
        let record = EmittedAlignment {
            read: &read,
            ref_header: "ref0",
            alignment: &low_quality,
        };
        sink.emit(&record).unwrap();
        sink.flush().unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn summary_includes_totals() {
        let stats = RunStats::shared();
        let mut worker = WorkerStats::default();
        worker.record_read_len(18);
        worker.record_hit();
        stats.merge(&worker);

        let mut buf = Vec::new();
        write_summary(&mut buf, "index0", &stats, "2026-07-28T00:00:00Z").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("reads processed: 1"));
        assert!(text.contains("reads mapped: 1"));
    }
}
