pub mod annotation;
pub mod config;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod log;
pub mod reader;
pub mod record;
pub mod types;
pub mod visitor;
pub mod walker;

pub use annotation::{CommentCommands, WalkOptions};
pub use config::Config;
pub use emitter::{Batch, JsonStyle, ReferenceEmitter, to_json_string, write_json};
pub use engine::{Board, PositionEngine, ShakmatyEngine};
pub use error::{FailureLog, GameError, GameFailure, OracleError};
pub use reader::{CompressionMode, RunSummary, discover_sources, document_name, read_source, run};
pub use record::{Arrow, BatchDocument, GameRecord, MainlineEntry, MoveRecord, NodeRecord};
pub use types::{Annotations, GameTree, Headers, Node, ParsedGame};
pub use visitor::GameVisitor;
pub use walker::TreeWalker;
