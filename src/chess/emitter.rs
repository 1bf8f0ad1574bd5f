use super::annotation::WalkOptions;
use super::engine::PositionEngine;
use super::error::{FailureLog, GameError};
use super::record::{BatchDocument, GameRecord};
use super::types::{GameTree, ParsedGame};
use super::walker::TreeWalker;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use std::io::{self, Write};
use tracing::{debug, warn};

/// Turns parsed games into canonical records, one batch per source unit.
pub struct ReferenceEmitter<'e, E> {
    engine: &'e E,
    walker: TreeWalker<'e, E>,
}

impl<'e, E: PositionEngine> ReferenceEmitter<'e, E> {
    pub fn new(engine: &'e E, options: WalkOptions) -> Self {
        Self {
            engine,
            walker: TreeWalker::new(engine, options),
        }
    }

    pub fn record(&self, parsed: ParsedGame) -> Result<GameRecord, GameError> {
        let tree = GameTree::from_parsed(parsed, self.engine)?;
        self.walker.walk(&tree)
    }

    pub fn batch(&self, source_file: impl Into<String>) -> Batch<'_, 'e, E> {
        Batch {
            emitter: self,
            source_file: source_file.into(),
            next_game_index: 0,
            games: Vec::new(),
            failures: FailureLog::default(),
        }
    }
}

/// Games of one source unit, accumulated in encounter order. A game that
/// fails is logged with its 0-based index and left out.
pub struct Batch<'a, 'e, E> {
    emitter: &'a ReferenceEmitter<'e, E>,
    source_file: String,
    next_game_index: usize,
    games: Vec<GameRecord>,
    failures: FailureLog,
}

impl<E: PositionEngine> Batch<'_, '_, E> {
    pub fn push(&mut self, parsed: ParsedGame) {
        let game_index = self.next_game_index;
        self.next_game_index += 1;

        match self.emitter.record(parsed) {
            Ok(record) => {
                debug!(file = %self.source_file, game_index, nodes = record.total_nodes, "Walked game");
                self.games.push(record);
            }
            Err(error) => {
                warn!(file = %self.source_file, game_index, %error, "Skipping game");
                self.failures.push(&self.source_file, game_index, &error);
            }
        }
    }

    /// Games seen so far, skipped ones included.
    pub fn games_seen(&self) -> usize {
        self.next_game_index
    }

    pub fn finish(self) -> (BatchDocument, FailureLog) {
        let document = BatchDocument {
            source_file: self.source_file,
            games_count: self.games.len(),
            games: self.games,
        };
        (document, self.failures)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonStyle {
    /// Escape every non-ASCII character as `\uXXXX`.
    pub ascii_escape: bool,
}

impl Default for JsonStyle {
    fn default() -> Self {
        Self { ascii_escape: true }
    }
}

/// Two-space pretty printing with optional `\uXXXX` escaping of non-ASCII text.
struct DocumentFormatter {
    pretty: PrettyFormatter<'static>,
    ascii_escape: bool,
}

impl DocumentFormatter {
    fn new(style: JsonStyle) -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"  "),
            ascii_escape: style.ascii_escape,
        }
    }
}

impl Formatter for DocumentFormatter {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if !self.ascii_escape || fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units).iter() {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Writes `value` in document layout. No trailing newline is added.
pub fn write_json<W: Write, T: Serialize + ?Sized>(
    writer: W,
    value: &T,
    style: JsonStyle,
) -> Result<(), serde_json::Error> {
    let mut serializer = Serializer::with_formatter(writer, DocumentFormatter::new(style));
    value.serialize(&mut serializer)
}

pub fn to_json_string<T: Serialize + ?Sized>(
    value: &T,
    style: JsonStyle,
) -> Result<String, serde_json::Error> {
    let mut buffer = Vec::with_capacity(4096);
    write_json(&mut buffer, value, style)?;
    Ok(String::from_utf8(buffer).expect("JSON serializer emits UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::engine::ShakmatyEngine;
    use crate::chess::visitor::GameVisitor;
    use pgn_reader::Reader;
    use serde_json::json;

    fn batch_from_pgn(pgn: &str) -> (BatchDocument, FailureLog) {
        let engine = ShakmatyEngine;
        let emitter = ReferenceEmitter::new(&engine, WalkOptions::default());
        let mut batch = emitter.batch("games.pgn");

        let mut reader = Reader::new(pgn.as_bytes());
        let mut visitor = GameVisitor::new();
        while let Some(parsed) = reader.read_game(&mut visitor).unwrap() {
            batch.push(parsed);
        }
        batch.finish()
    }

    #[test]
    fn test_batch_keeps_encounter_order() {
        let pgn = "[Event \"A\"]\n\n1. e4 *\n\n[Event \"B\"]\n\n1. d4 *\n\n[Event \"C\"]\n\n1. c4 *\n";
        let (document, failures) = batch_from_pgn(pgn);

        assert!(failures.is_empty());
        assert_eq!(document.source_file, "games.pgn");
        assert_eq!(document.games_count, 3);
        let events: Vec<&str> = document
            .games
            .iter()
            .map(|game| game.headers.get("Event").unwrap())
            .collect();
        assert_eq!(events, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_batch_skips_illegal_game_and_continues() {
        let pgn = "[Event \"A\"]\n\n1. e4 *\n\n[Event \"Bad\"]\n\n1. e4 e5 2. Ke4 *\n\n[Event \"C\"]\n\n1. c4 *\n";
        let (document, failures) = batch_from_pgn(pgn);

        assert_eq!(document.games_count, 2);
        assert_eq!(document.games.len(), 2);
        assert_eq!(document.games[1].headers.get("Event"), Some("C"));

        let failure = failures.iter().next().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failure.source_file, "games.pgn");
        assert_eq!(failure.game_index, 1);
        assert!(failure.message.contains("Ke4"));
    }

    #[test]
    fn test_batch_skips_malformed_fen_game() {
        let pgn = "[FEN \"8/8/8/8 w - - 0 1\"]\n\n1. e4 *\n\n[Event \"Ok\"]\n\n1. e4 *\n";
        let (document, failures) = batch_from_pgn(pgn);

        assert_eq!(document.games_count, 1);
        let failure = failures.iter().next().unwrap();
        assert_eq!(failure.game_index, 0);
        assert!(failure.message.starts_with("Malformed game"));
    }

    #[test]
    fn test_games_seen_counts_skipped_games() {
        let engine = ShakmatyEngine;
        let emitter = ReferenceEmitter::new(&engine, WalkOptions::default());
        let mut batch = emitter.batch("x.pgn");
        let mut reader = Reader::new("1. Ke2 *\n\n1. e4 *\n".as_bytes());
        let mut visitor = GameVisitor::new();
        while let Some(parsed) = reader.read_game(&mut visitor).unwrap() {
            batch.push(parsed);
        }
        assert_eq!(batch.games_seen(), 2);
        assert_eq!(batch.finish().0.games_count, 1);
    }

    #[test]
    fn test_json_layout() {
        let value = json!({"a": [], "b": [1, 2], "c": {"d": null}});
        let text = to_json_string(&value, JsonStyle::default()).unwrap();
        assert_eq!(
            text,
            "{\n  \"a\": [],\n  \"b\": [\n    1,\n    2\n  ],\n  \"c\": {\n    \"d\": null\n  }\n}"
        );
    }

    #[test]
    fn test_json_escapes_non_ascii() {
        let text = to_json_string("Café ♞ 𝄞", JsonStyle::default()).unwrap();
        assert_eq!(text, "\"Caf\\u00e9 \\u265e \\ud834\\udd1e\"");
    }

    #[test]
    fn test_json_raw_utf8_when_escaping_disabled() {
        let style = JsonStyle {
            ascii_escape: false,
        };
        assert_eq!(to_json_string("Café", style).unwrap(), "\"Café\"");
    }

    #[test]
    fn test_json_control_characters_still_escaped() {
        let text = to_json_string("a\"b\nc", JsonStyle::default()).unwrap();
        assert_eq!(text, "\"a\\\"b\\nc\"");
    }

    #[test]
    fn test_document_field_order() {
        let (document, _) = batch_from_pgn("[Event \"E\"]\n\n1. e4 { [%clk 0:01:00] } *\n");
        let text = to_json_string(&document, JsonStyle::default()).unwrap();

        let order = [
            "\"source_file\"",
            "\"games_count\"",
            "\"games\"",
            "\"headers\"",
            "\"starting_fen\"",
            "\"variations\"",
            "\"move\"",
            "\"uci\"",
            "\"promotion\"",
            "\"drop\"",
            "\"fen\"",
            "\"clock\": 60.0",
            "\"eval\": null",
            "\"shapes\": []",
            "\"is_main_variation\"",
            "\"variation_index\": 0",
            "\"mainline\"",
            "\"fen_after\"",
            "\"total_nodes\": 2",
        ];
        let mut cursor = 0;
        for key in order {
            let found = text[cursor..]
                .find(key)
                .unwrap_or_else(|| panic!("{key} missing or out of order"));
            cursor += found + key.len();
        }
    }
}
