use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure scoped to a single game. Aborts that game's record, never the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Malformed game: {0}")]
    Malformed(String),

    #[error("Illegal move: san='{san}'; ply={ply}; fen='{fen}'; error={reason}")]
    IllegalMove {
        san: String,
        ply: u32,
        fen: String,
        reason: String,
    },
}

/// Failure of the whole run (or of one source unit for `Io`).
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Input directory not found: '{}'", .0.display())]
    MissingInput(PathBuf),

    #[error("No PGN files found in '{}'", .0.display())]
    NoSources(PathBuf),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid source pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl OracleError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One skipped game, identified the way the batch log reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameFailure {
    pub source_file: String,
    pub game_index: usize,
    pub message: String,
}

/// Collects per-game failures of a batch.
#[derive(Debug, Clone, Default)]
pub struct FailureLog(Vec<GameFailure>);

impl FailureLog {
    pub fn push(&mut self, source_file: &str, game_index: usize, error: &GameError) {
        self.0.push(GameFailure {
            source_file: source_file.to_string(),
            game_index,
            message: error.to_string(),
        });
    }

    pub fn extend(&mut self, other: FailureLog) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameFailure> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{FailureLog, GameError, OracleError};
    use std::io;
    use std::path::Path;

    #[test]
    fn test_push_records_source_and_index() {
        let mut log = FailureLog::default();
        log.push("a.pgn", 3, &GameError::Malformed("bad FEN".to_string()));

        let failure = log.iter().next().expect("one failure");
        assert_eq!(failure.source_file, "a.pgn");
        assert_eq!(failure.game_index, 3);
        assert_eq!(failure.message, "Malformed game: bad FEN");
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut first = FailureLog::default();
        first.push("a.pgn", 0, &GameError::Malformed("x".to_string()));
        let mut second = FailureLog::default();
        second.push("b.pgn", 1, &GameError::Malformed("y".to_string()));

        first.extend(second);

        let files: Vec<&str> = first.iter().map(|f| f.source_file.as_str()).collect();
        assert_eq!(files, vec!["a.pgn", "b.pgn"]);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(FailureLog::default().is_empty());
    }

    #[test]
    fn test_illegal_move_message_names_ply_and_fen() {
        let error = GameError::IllegalMove {
            san: "Ke4".to_string(),
            ply: 1,
            fen: "8/8/8/8/8/8/8/K6k w - - 0 1".to_string(),
            reason: "illegal san".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("san='Ke4'"));
        assert!(message.contains("ply=1"));
    }

    #[test]
    fn test_io_error_names_path() {
        let error = OracleError::io(
            Path::new("missing.pgn"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(error.to_string(), "I/O error on 'missing.pgn': gone");
    }
}
