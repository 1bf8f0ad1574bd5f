//! Reference JSON documents for PGN game trees.
//!
//! Each source file becomes one document listing, per game, the headers, the
//! full variation tree with positions and move details, and the mainline.

pub mod chess;

pub use chess::{
    BatchDocument, Config, GameError, GameRecord, GameTree, GameVisitor, OracleError,
    PositionEngine, ReferenceEmitter, RunSummary, ShakmatyEngine, TreeWalker, run,
};
