use super::config::Config;
use super::emitter::{ReferenceEmitter, write_json};
use super::engine::{PositionEngine, ShakmatyEngine};
use super::error::{FailureLog, OracleError};
use super::record::BatchDocument;
use super::visitor::GameVisitor;
use pgn_reader::Reader;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread;
use tracing::{error, info, warn};
use zstd::stream::read::Decoder as ZstdDecoder;

pub type PgnInput = Box<dyn Read + Send>;

const SOURCE_PATTERNS: [&str; 2] = ["*.pgn", "*.pgn.zst"];

// The walk recurses once per ply, so every worker gets a large stack.
const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressionMode {
    Plain,
    Zstd,
}

impl CompressionMode {
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("zst") => Self::Zstd,
            _ => Self::Plain,
        }
    }
}

/// Recognised source files in `input_dir`, sorted by path.
pub fn discover_sources(input_dir: &Path) -> Result<Vec<PathBuf>, OracleError> {
    if !input_dir.is_dir() {
        return Err(OracleError::MissingInput(input_dir.to_path_buf()));
    }

    let escaped_dir = glob::Pattern::escape(&input_dir.to_string_lossy());
    let mut paths = Vec::new();
    for pattern in SOURCE_PATTERNS {
        let pattern = format!("{escaped_dir}/{pattern}");
        paths.extend(glob::glob(&pattern)?.filter_map(|entry| entry.ok()));
    }
    paths.retain(|path| path.is_file());
    paths.sort();
    paths.dedup();

    if paths.is_empty() {
        return Err(OracleError::NoSources(input_dir.to_path_buf()));
    }
    Ok(paths)
}

/// File name of the source, as reported in its document.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `games.pgn` and `games.pgn.zst` both become `games.json`.
pub fn document_name(path: &Path) -> String {
    let name = source_name(path);
    let stem = name.strip_suffix(".zst").unwrap_or(&name);
    let stem = stem.strip_suffix(".pgn").unwrap_or(stem);
    format!("{stem}.json")
}

fn open_input_stream(path: &Path, compression: CompressionMode) -> Result<PgnInput, OracleError> {
    let file = File::open(path).map_err(|e| OracleError::io(path, e))?;

    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as PgnInput)
            .map_err(|e| OracleError::io(path, e)),
    }
}

/// Reads every game of one source into a batch document.
///
/// pgn-reader buffers the input itself, so no `BufReader` is added.
pub fn read_source<E: PositionEngine>(
    path: &Path,
    emitter: &ReferenceEmitter<'_, E>,
) -> Result<(BatchDocument, FailureLog), OracleError> {
    let input = open_input_stream(path, CompressionMode::from_path(path))?;
    let mut pgn_reader = Reader::new(input);
    let mut visitor = GameVisitor::new();
    let mut batch = emitter.batch(source_name(path));

    loop {
        match pgn_reader.read_game(&mut visitor) {
            Ok(Some(parsed)) => batch.push(parsed),
            Ok(None) => break,
            Err(e) => {
                warn!(
                    file = %path.display(),
                    game_index = batch.games_seen(),
                    "Parser-stage error"
                );
                return Err(OracleError::io(path, e));
            }
        }
    }

    Ok(batch.finish())
}

pub fn write_document(
    path: &Path,
    document: &BatchDocument,
    config: &Config,
) -> Result<PathBuf, OracleError> {
    let output_path = config.output_dir.join(document_name(path));
    let file = File::create(&output_path).map_err(|e| OracleError::io(&output_path, e))?;

    let mut writer = BufWriter::new(file);
    write_json(&mut writer, document, config.json)?;
    writer
        .flush()
        .map_err(|e| OracleError::io(&output_path, e))?;

    Ok(output_path)
}

fn convert_source(path: &Path, config: &Config) -> Result<(usize, FailureLog), OracleError> {
    let engine = ShakmatyEngine;
    let emitter = ReferenceEmitter::new(&engine, config.walk);

    let (document, failures) = read_source(path, &emitter)?;
    let output_path = write_document(path, &document, config)?;

    info!(
        file = %source_name(path),
        games = document.games_count,
        skipped = failures.len(),
        output = %output_path.display(),
        "Wrote reference document"
    );
    Ok((document.games_count, failures))
}

/// Outcome of a run across all sources.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files_written: usize,
    pub files_failed: usize,
    pub games_written: usize,
    pub failures: FailureLog,
}

impl RunSummary {
    fn record(&mut self, path: &Path, outcome: Result<(usize, FailureLog), OracleError>) {
        match outcome {
            Ok((games, failures)) => {
                self.files_written += 1;
                self.games_written += games;
                self.failures.extend(failures);
            }
            Err(e) => {
                error!(file = %source_name(path), error = %e, "Failed to convert source");
                self.files_failed += 1;
            }
        }
    }

    /// Skipped games do not count against success; unreadable or unwritable
    /// sources do.
    pub fn is_success(&self) -> bool {
        self.files_failed == 0
    }
}

struct SharedState {
    next_path_idx: usize,
    summary: RunSummary,
}

fn run_worker(state: &Mutex<SharedState>, sources: &[PathBuf], config: &Config) {
    loop {
        let path_idx = {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.next_path_idx >= sources.len() {
                return;
            }
            let path_idx = state.next_path_idx;
            state.next_path_idx += 1;
            path_idx
        };

        let path = &sources[path_idx];
        let outcome = convert_source(path, config);

        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        state.summary.record(path, outcome);
    }
}

/// Converts every source in `config.input_dir` into a document in
/// `config.output_dir`.
///
/// Fails only when the input directory is unusable or the output directory
/// cannot be created. Per-source failures are counted in the summary.
pub fn run(config: &Config) -> Result<RunSummary, OracleError> {
    let sources = discover_sources(&config.input_dir)?;
    fs::create_dir_all(&config.output_dir).map_err(|e| OracleError::io(&config.output_dir, e))?;

    let jobs = config.jobs.clamp(1, sources.len());
    info!(
        sources = sources.len(),
        jobs,
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        "Generating reference documents"
    );

    let state = Mutex::new(SharedState {
        next_path_idx: 0,
        summary: RunSummary::default(),
    });

    thread::scope(|scope| {
        let mut spawned = 0;
        for worker_idx in 0..jobs {
            let worker = thread::Builder::new()
                .name(format!("pgn-oracle-{worker_idx}"))
                .stack_size(WORKER_STACK_SIZE)
                .spawn_scoped(scope, || run_worker(&state, &sources, config));
            match worker {
                Ok(_) => spawned += 1,
                Err(e) => warn!(worker_idx, error = %e, "Failed to spawn worker"),
            }
        }
        if spawned == 0 {
            warn!("No worker thread available, converting on the calling thread");
            run_worker(&state, &sources, config);
        }
    });

    let summary = state
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .summary;
    info!(
        files_written = summary.files_written,
        files_failed = summary.files_failed,
        games = summary.games_written,
        skipped_games = summary.failures.len(),
        "Done"
    );
    Ok(summary)
}
