//! # Reader / processor / writer harness (Component F)
//!
//! Wires the bounded queues from [`crate::queue`], the per-read driver from
//! [`crate::driver`], the checkpoint store from [`crate::store`], and the
//! output sinks from [`crate::output`] into the fixed-size, non-work-
//! stealing thread pool spec.md §4.6/§5 describes: `R` readers parse input
//! into `Read`s, `P` processors run the driver against one loaded index
//! part, one writer checkpoints state and (on the last part) emits
//! accepted alignments.
//!
//! The outer loop (spec.md §4.6 "for each index file, for each part: load
//! index+references, spawn readers/processors/writers, wait for all to
//! finish, unload") is [`run_pipeline`], generalizing the teacher's
//! `bin/ConSTRain.rs` shape (parse args -> build shared state -> spawn
//! workers over chunks -> join -> finalize output) from "one rayon
//! `par_chunks_mut` call" to three explicit thread roles connected by
//! bounded queues.
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use log::{error, warn};

use crate::config::SearchConfig;
use crate::driver::{early_termination_met, Driver, PerReadWorker, Strand};
use crate::index::{self, IndexPart, References};
use crate::output::{emit_to_all, AlignmentSink};
use crate::queue::BoundedQueue;
use crate::read::{reverse_complement, Read};
use crate::record::RecordSource;
use crate::stats::{RunStats, StatsHandle, WorkerStats};
use crate::store::ReadStore;

/// Bound on `read_queue`/`write_queue` depth (spec.md §4.6 `QUEUE_SIZE_MAX`).
pub const QUEUE_SIZE_MAX: usize = 1024;

/// Run every (index file, part) iteration to completion against a fresh
/// record source each time, checkpointing to `store` and emitting accepted
/// alignments to `sinks` once the very last part is reached.
///
/// `index_dirs` holds one directory per index file, each containing the
/// `indexN.partP.seedsieve` files [`IndexPart::load`] reads; `index_num` is
/// the position of that directory in the list.
pub fn run_pipeline<P: AsRef<Path>>(
    config: &SearchConfig,
    index_dirs: &[P],
    store: Arc<dyn ReadStore>,
    mut make_source: impl FnMut() -> Result<Box<dyn RecordSource + Send>>,
    sinks: Vec<Box<dyn AlignmentSink>>,
) -> Result<StatsHandle> {
    let stats = RunStats::shared();
    let driver = Arc::new(Driver::default());
    let sinks = Arc::new(Mutex::new(sinks));

    let total_indexes = index_dirs.len();
    let mut overall_first = true;
    for (index_num, index_dir) in index_dirs.iter().enumerate() {
        let index_dir = index_dir.as_ref();
        let parts = index::discover_parts(index_dir, index_num)
            .with_context(|| format!("discovering parts for index {index_num}"))?;
        let total_parts = parts.len();

        for (part_idx, &part_num) in parts.iter().enumerate() {
            let (part, refs) = IndexPart::load(index_num, part_num, index_dir)?;
            let is_last_part = index_num + 1 == total_indexes && part_idx + 1 == total_parts;
            let is_first_iteration = overall_first;
            overall_first = false;

            run_iteration(
                index_num,
                part_num,
                Arc::new(part),
                Arc::new(refs),
                config,
                Arc::clone(&store),
                &stats,
                &driver,
                &mut make_source,
                is_last_part,
                is_first_iteration,
                Arc::clone(&sinks),
            )?;
        }
    }

    let mut sinks_guard = sinks.lock().expect("sinks mutex poisoned");
    for sink in sinks_guard.iter_mut() {
        sink.flush().context("flushing output sink")?;
    }

    Ok(stats)
}

/// One (index, part) iteration: spawn readers, processors, and a writer,
/// wait for all to finish. The first worker error observed is surfaced
/// after every thread has joined, per spec.md §5's "an I/O error in any
/// worker is recorded and the worker exits; other workers continue and
/// drain; the outer loop surfaces the error after join."
#[allow(clippy::too_many_arguments)]
fn run_iteration(
    index_num: usize,
    part_num: usize,
    part: Arc<IndexPart>,
    refs: Arc<References>,
    config: &SearchConfig,
    store: Arc<dyn ReadStore>,
    stats: &StatsHandle,
    driver: &Arc<Driver>,
    make_source: &mut impl FnMut() -> Result<Box<dyn RecordSource + Send>>,
    is_last_part: bool,
    is_first_iteration: bool,
    sinks: Arc<Mutex<Vec<Box<dyn AlignmentSink>>>>,
) -> Result<()> {
    let read_queue: BoundedQueue<Read> = BoundedQueue::new(QUEUE_SIZE_MAX, config.num_fread_threads);
    let write_queue: BoundedQueue<Read> = BoundedQueue::new(QUEUE_SIZE_MAX, config.num_proc_threads);
    let next_ordinal = AtomicU64::new(0);
    let source: Mutex<Box<dyn RecordSource + Send>> = Mutex::new(make_source()?);
    let errors: Mutex<Vec<anyhow::Error>> = Mutex::new(Vec::new());

    thread::scope(|scope| {
        for _ in 0..config.num_fread_threads {
            let read_queue = read_queue.clone();
            let store = Arc::clone(&store);
            let source = &source;
            let next_ordinal = &next_ordinal;
            let errors = &errors;
            scope.spawn(move || {
                if let Err(e) = reader_loop(source, &read_queue, store.as_ref(), config, is_first_iteration, next_ordinal) {
                    error!("reader failed: {e:?}");
                    errors.lock().expect("errors mutex poisoned").push(e);
                }
                read_queue.finalize_producer();
            });
        }

        for _ in 0..config.num_proc_threads {
            let read_queue = read_queue.clone();
            let write_queue = write_queue.clone();
            let part = Arc::clone(&part);
            let refs = Arc::clone(&refs);
            let driver = Arc::clone(driver);
            let errors = &errors;
            scope.spawn(move || {
                if let Err(e) = processor_loop(
                    index_num, part_num, part.as_ref(), refs.as_ref(), &read_queue, &write_queue, config, driver.as_ref(),
                    stats, is_last_part,
                ) {
                    error!("processor failed: {e:?}");
                    errors.lock().expect("errors mutex poisoned").push(e);
                }
                write_queue.finalize_producer();
            });
        }

        let write_queue = write_queue.clone();
        let store = Arc::clone(&store);
        let refs = Arc::clone(&refs);
        let sinks = Arc::clone(&sinks);
        let errors = &errors;
        scope.spawn(move || {
            if let Err(e) = writer_loop(&write_queue, store.as_ref(), is_last_part, refs.as_ref(), sinks.as_ref()) {
                error!("writer failed: {e:?}");
                errors.lock().expect("errors mutex poisoned").push(e);
            }
        });
    });

    if let Some(first) = errors.into_inner().expect("errors mutex poisoned").into_iter().next() {
        return Err(first).context(format!("pipeline iteration failed (index {index_num}, part {part_num})"));
    }
    Ok(())
}

fn reader_loop(
    source: &Mutex<Box<dyn RecordSource + Send>>,
    read_queue: &BoundedQueue<Read>,
    store: &(dyn ReadStore),
    config: &SearchConfig,
    is_first_iteration: bool,
    next_ordinal: &AtomicU64,
) -> Result<()> {
    loop {
        let record = {
            let mut guard = source.lock().expect("record source mutex poisoned");
            guard.next_record().context("reading input record")?
        };
        let Some(record) = record else { break };

        if record.sequence.is_empty() {
            warn!("skipping record {} with an empty sequence", record.name);
            continue;
        }

        let ordinal = next_ordinal.fetch_add(1, Ordering::Relaxed);
        let read = if is_first_iteration {
            Read::new(ordinal, record.sequence, record.quality, config.num_alignments)
        } else {
            match store.get(ordinal).context("checkpoint lookup")? {
                Some(existing) => existing,
                None => Read::new(ordinal, record.sequence, record.quality, config.num_alignments),
            }
        };
        read_queue.push(read);
    }
    Ok(())
}

/// Pop reads, run the forward (and, unless configured forward-only,
/// reverse-complement) search pass, and forward the mutated read to the
/// write queue. Reverse-strand search temporarily swaps `read.encoded` for
/// its reverse complement (spec.md §4.1: "Reverse complement is computed
/// on demand") and restores the forward encoding before checkpointing.
#[allow(clippy::too_many_arguments)]
fn processor_loop(
    index_num: usize,
    part_num: usize,
    part: &IndexPart,
    refs: &References,
    read_queue: &BoundedQueue<Read>,
    write_queue: &BoundedQueue<Read>,
    config: &SearchConfig,
    driver: &Driver,
    stats: &StatsHandle,
    is_last_part: bool,
) -> Result<()> {
    let mut worker_stats = WorkerStats::default();
    while let Some(mut read) = read_queue.pop() {
        if read.is_valid && !early_termination_met(&read, config) {
            driver.process(
                &mut read, index_num, part_num, part, refs, Strand::Forward, is_last_part, config, &mut worker_stats,
            );

            if read.is_valid && !config.forward_only && !early_termination_met(&read, config) {
                let forward_encoded = std::mem::replace(&mut read.encoded, reverse_complement(&read.encoded));
                driver.process(
                    &mut read, index_num, part_num, part, refs, Strand::Reverse, is_last_part, config, &mut worker_stats,
                );
                read.encoded = forward_encoded;
            }
        }
        write_queue.push(read);
    }
    stats.merge(&worker_stats);
    Ok(())
}

fn writer_loop(
    write_queue: &BoundedQueue<Read>,
    store: &(dyn ReadStore),
    is_last_part: bool,
    refs: &References,
    sinks: &Mutex<Vec<Box<dyn AlignmentSink>>>,
) -> Result<()> {
    while let Some(read) = write_queue.pop() {
        store.put(read.id, &read).context("checkpointing read")?;
        if is_last_part {
            let mut sinks_guard = sinks.lock().expect("sinks mutex poisoned");
            for alignment in &read.alignments {
                emit_to_all(&mut sinks_guard, &read, refs, alignment)?;
            }
        }
    }
    Ok(())
}
