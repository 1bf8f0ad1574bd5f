//! Canonical, serializable output of a walk.
//!
//! Field names and declaration order are the document layout; reordering a
//! field changes every generated file.

use super::types::Headers;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub uci: String,
    pub san: String,
    pub from: u8,
    pub to: u8,
    pub promotion: Option<u8>,
    pub drop: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrow {
    pub color: &'static str,
    pub tail: u8,
    pub head: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    #[serde(rename = "move")]
    pub mv: MoveRecord,
    pub fen: String,
    pub comment: Option<String>,
    pub starting_comment: Option<String>,
    pub nags: Vec<u8>,
    pub clock: Option<f64>,
    pub eval: Option<f64>,
    pub arrows: Vec<Arrow>,
    /// Always empty: no supported comment command produces shapes.
    pub shapes: Vec<Arrow>,
    pub is_end: bool,
    pub is_mainline: bool,
    pub is_main_variation: bool,
    pub variations: Vec<NodeRecord>,
    pub variation_index: usize,
}

impl NodeRecord {
    /// Nodes in this subtree, this node included.
    pub fn count(&self) -> usize {
        1 + self.variations.iter().map(NodeRecord::count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainlineEntry {
    pub uci: String,
    pub san: String,
    pub fen_after: String,
}

/// Canonical record of one game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub headers: Headers,
    pub starting_fen: String,
    pub comment: Option<String>,
    pub starting_comment: Option<String>,
    pub nags: Vec<u8>,
    pub is_end: bool,
    pub variations: Vec<NodeRecord>,
    pub mainline: Vec<MainlineEntry>,
    pub total_nodes: usize,
}

/// All successfully walked games of one source unit, in encounter order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchDocument {
    pub source_file: String,
    pub games_count: usize,
    pub games: Vec<GameRecord>,
}
