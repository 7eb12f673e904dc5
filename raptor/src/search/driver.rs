//! The query driver: opens an index (single file or partitioned
//! manifest), streams query reads through per-thread agents, and
//! reassembles results in input order.

use std::io::Write;

use raptor_core::minimiser::minimisers;
use raptor_core::threshold::ThresholdTable;
use raptor_core::{Dna4, Shape};

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::index::format::{self, Index};
use crate::index::partition::Manifest;
use crate::search::agent::SearchAgent;
use crate::search::options::SearchOptions;
use crate::search::query::{self, Record};

fn open_parts(options: &SearchOptions) -> Result<Vec<Index>> {
  let path = options.index();
  let bytes = std::fs::read(path).map_err(|e| Error::InputUnreadable {
    path: path.to_path_buf(),
    reason: e.to_string(),
  })?;

  if bytes.starts_with(b"RAPTORPT") {
    let manifest = Manifest::read(path)?;
    manifest.part_paths(path).iter().map(|p| format::read(p)).collect()
  } else {
    Ok(vec![format::read(path)?])
  }
}

fn decode(sequence: &str) -> Vec<Option<Dna4>> {
  sequence.bytes().map(Dna4::from_base).collect()
}

fn hashes_for(sequence: &str, shape: Shape, window: usize, seed: u64) -> Vec<u64> {
  if sequence.len() < window {
    return Vec::new();
  }
  let bases = decode(sequence);
  minimisers(&bases, shape, window, seed)
    .map(|ms| ms.into_iter().map(|m| m.hash).collect())
    .unwrap_or_default()
}

fn write_header(writer: &mut dyn Write, index: &Index) -> std::io::Result<()> {
  for (bin, files) in index.bin_paths.iter().enumerate() {
    for file in files {
      writeln!(writer, "#{bin}\t{file}")?;
    }
  }
  writeln!(writer, "#QUERY_NAME\tUSER_BINS")
}

/// Runs a search, writing the text output format to `writer`.
///
/// Reads are split into `options.threads()` contiguous chunks, each
/// processed by its own worker against its own [`SearchAgent`]s (no
/// inter-thread synchronisation on the hot path);
/// results are collected into a slot per record and written out in
/// input order once every worker has drained, regardless of which
/// thread finished first.
#[tracing::instrument(skip_all, fields(index = %options.index().display(), threads = options.threads()))]
pub fn search(options: &SearchOptions, cancel: &CancellationToken, writer: &mut dyn Write) -> Result<()> {
  let parts = open_parts(options)?;
  let primary = &parts[0];

  if !*options.quiet() {
    write_header(writer, primary).map_err(|e| Error::IoExhausted {
      path: options.output().clone().unwrap_or_default(),
      source: e,
    })?;
  }

  let records = query::read_records(options.query()).map_err(|e| Error::InputUnreadable {
    path: options.query().to_path_buf(),
    reason: e.to_string(),
  })?;
  tracing::info!(reads = records.len(), "starting search");

  let errors = *options.errors();
  let table = match options.threshold_override() {
    Some(_) => None,
    None => {
      let lengths: Vec<usize> = match options.pattern_override() {
        Some(l) => vec![*l],
        None => {
          let mut ls: Vec<usize> = records.iter().map(|r| r.sequence.len()).collect();
          ls.sort_unstable();
          ls.dedup();
          ls
        }
      };
      if lengths.is_empty() {
        None
      } else {
        Some(ThresholdTable::build(
          primary.shape,
          primary.window,
          primary.target_fpr,
          lengths,
          [errors],
        ))
      }
    }
  };

  let lines = run_search_workers(&records, options, &parts, errors, table.as_ref(), cancel)?;

  for line in lines {
    writeln!(writer, "{line}").map_err(|e| Error::IoExhausted {
      path: options.output().clone().unwrap_or_default(),
      source: e,
    })?;
  }

  Ok(())
}

/// Computes one output line per record, `options.threads()`-way
/// parallel over contiguous chunks, returning them in input order.
fn run_search_workers(
  records: &[Record],
  options: &SearchOptions,
  parts: &[Index],
  errors: usize,
  table: Option<&ThresholdTable>,
  cancel: &CancellationToken,
) -> Result<Vec<String>> {
  let threads = (*options.threads()).max(1);
  if threads == 1 || records.len() <= 1 {
    return records
      .iter()
      .map(|record| {
        if cancel.is_cancelled() {
          return Err(Error::Cancelled);
        }
        search_one(record, options, parts, errors, table)
      })
      .collect();
  }

  let chunk_size = records.len().div_ceil(threads).max(1);
  let first_error: std::sync::Mutex<Option<Error>> = std::sync::Mutex::new(None);
  let mut lines: Vec<Option<String>> = vec![None; records.len()];

  std::thread::scope(|scope| {
    let mut handles = Vec::new();
    for (worker_index, chunk) in records.chunks(chunk_size).enumerate() {
      let first_error = &first_error;
      handles.push((
        worker_index * chunk_size,
        scope.spawn(move || {
          let span = tracing::debug_span!("search_worker", worker_index, reads = chunk.len());
          let _enter = span.enter();
          let mut out = Vec::with_capacity(chunk.len());
          for record in chunk {
            if cancel.is_cancelled() {
              return out;
            }
            match search_one(record, options, parts, errors, table) {
              Ok(line) => out.push(line),
              Err(e) => {
                let mut slot = first_error.lock().unwrap();
                if slot.is_none() {
                  *slot = Some(e);
                }
                cancel.cancel();
                return out;
              }
            }
          }
          out
        }),
      ));
    }

    for (base, handle) in handles {
      let out = handle.join().expect("search worker panicked");
      for (offset, line) in out.into_iter().enumerate() {
        lines[base + offset] = Some(line);
      }
    }
  });

  if let Some(e) = first_error.into_inner().unwrap() {
    return Err(e);
  }
  if cancel.is_cancelled() {
    return Err(Error::Cancelled);
  }

  Ok(lines.into_iter().map(|l| l.expect("every slot filled when not cancelled")).collect())
}

fn search_one(
  record: &Record,
  options: &SearchOptions,
  parts: &[Index],
  errors: usize,
  table: Option<&ThresholdTable>,
) -> Result<String> {
  let pattern_size = match options.pattern_override() {
    Some(l) => *l,
    None => record.sequence.len(),
  };
  let primary = &parts[0];
  let hashes = hashes_for(&record.sequence, primary.shape, primary.window, primary.seed);

  let tau = match options.threshold_override() {
    Some(p) => {
      let m = pattern_size.saturating_sub(primary.window) + 1;
      (*p * m as f64).ceil() as usize
    }
    None => table
      .map(|t| t.tau(pattern_size, errors))
      .unwrap_or(usize::MAX),
  };

  // Each minimiser hash was emplaced into exactly one part at build
  // time (the part `partition::hash_partition(hash, parts.len())`
  // selects, or the sole part when the index is unpartitioned). A
  // bin's true hit count is the sum of its count across parts, so
  // every hash is routed to its one owning part's agent and the `tau`
  // comparison happens once, over the combined total — querying a
  // hash against every part and thresholding each independently would
  // undercount (spec.md invariant 6: partition union).
  let mut agents: Vec<SearchAgent<'_>> = parts.iter().map(|index| SearchAgent::new(&index.body)).collect();
  for &h in &hashes {
    let part = if parts.len() > 1 {
      crate::index::partition::hash_partition(h, parts.len())
    } else {
      0
    };
    agents[part].accumulate(h);
  }

  let bin_count = agents[0].bin_count();
  let bins: Vec<String> = (0..bin_count)
    .filter(|&b| agents.iter().map(|a| a.count(b) as usize).sum::<usize>() >= tau)
    .map(|b| b.to_string())
    .collect();
  Ok(format!("{}\t{}", record.id, bins.join(",")))
}
