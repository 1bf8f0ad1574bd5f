use super::engine::PositionEngine;
use super::error::GameError;
use pgn_reader::SanPlus;
use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;

/// The Seven Tag Roster, emitted ahead of every other tag.
pub const TAG_ROSTER: [&str; 7] = ["Event", "Site", "Date", "Round", "White", "Black", "Result"];

/// Values of the roster tags before any tag is read.
const ROSTER_DEFAULTS: [&str; 7] = ["?", "?", "????.??.??", "?", "?", "?", "*"];

pub type NagSet = SmallVec<[u8; 4]>;

/// Game headers. Keys are unique: a repeated tag keeps its first position and
/// its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Headers of a game that has not read any tag yet: the full roster with
    /// placeholder values.
    pub fn with_roster_defaults() -> Self {
        Self(
            TAG_ROSTER
                .iter()
                .zip(ROSTER_DEFAULTS)
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    pub fn insert(&mut self, name: String, value: String) {
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Roster tags in roster order, then the others in encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let roster = TAG_ROSTER
            .iter()
            .filter_map(|tag| self.get(tag).map(|value| (*tag, value)));
        let others = self
            .0
            .iter()
            .filter(|(key, _)| !TAG_ROSTER.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()));
        roster.chain(others)
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Comment and glyph annotations of one node, as written in the movetext.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub comment: Option<String>,
    pub starting_comment: Option<String>,
    pub nags: NagSet,
}

impl Annotations {
    pub fn push_comment(&mut self, text: &str) {
        append_comment(&mut self.comment, text);
    }

    /// NAGs form a set; repeats are dropped.
    pub fn add_nag(&mut self, nag: u8) {
        if !self.nags.contains(&nag) {
            self.nags.push(nag);
        }
    }

    pub fn sorted_nags(&self) -> Vec<u8> {
        let mut nags = self.nags.to_vec();
        nags.sort_unstable();
        nags
    }
}

/// Appends trimmed `text` on a new line. Blank text is ignored.
pub(crate) fn append_comment(slot: &mut Option<String>, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match slot {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *slot = Some(text.to_string()),
    }
}

/// A move node. Every `Node` carries a move; the moveless root is `GameTree`.
#[derive(Debug, Clone)]
pub struct Node {
    pub san: SanPlus,
    pub annotations: Annotations,
    pub variations: Vec<Node>,
}

impl Node {
    pub fn new(san: SanPlus) -> Self {
        Self {
            san,
            annotations: Annotations::default(),
            variations: Vec::new(),
        }
    }

    pub fn is_end(&self) -> bool {
        self.variations.is_empty()
    }

    /// Nodes in this subtree, this node included.
    pub fn count(&self) -> usize {
        1 + self.variations.iter().map(Node::count).sum::<usize>()
    }
}

/// One game as produced by the PGN visitor, before a starting position exists.
#[derive(Debug, Clone, Default)]
pub struct ParsedGame {
    pub headers: Headers,
    pub annotations: Annotations,
    pub variations: Vec<Node>,
}

/// Read-only view over one parsed game rooted at a resolved starting position.
#[derive(Debug, Clone)]
pub struct GameTree<P> {
    headers: Headers,
    starting_position: P,
    annotations: Annotations,
    variations: Vec<Node>,
}

impl<P> GameTree<P> {
    /// Resolves the starting position through `engine`. Fails with
    /// `GameError::Malformed` when the headers do not describe a usable one.
    pub fn from_parsed<E>(parsed: ParsedGame, engine: &E) -> Result<Self, GameError>
    where
        E: PositionEngine<Position = P>,
    {
        let starting_position = engine.setup(&parsed.headers)?;
        Ok(Self {
            headers: parsed.headers,
            starting_position,
            annotations: parsed.annotations,
            variations: parsed.variations,
        })
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn root_annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn starting_position(&self) -> &P {
        &self.starting_position
    }

    pub fn variations(&self) -> &[Node] {
        &self.variations
    }

    /// Nodes in the whole tree, the root included.
    pub fn count(&self) -> usize {
        1 + self.variations.iter().map(Node::count).sum::<usize>()
    }
}
