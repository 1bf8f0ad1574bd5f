use super::error::GameError;
use super::record::MoveRecord;
use super::types::Headers;
use pgn_reader::SanPlus;
use shakmaty::{
    CastlingMode, Chess, EnPassantMode, Move, Position,
    fen::Fen,
    san::San,
    uci::UciMove,
};

/// The chess-rules capabilities the walker relies on. Any backend that can set
/// up a position, apply a move and render FEN and SAN can drive a walk.
pub trait PositionEngine {
    type Position: Clone;
    type Move;

    /// Starting position described by the game headers (`FEN`, `Variant`).
    fn setup(&self, headers: &Headers) -> Result<Self::Position, GameError>;

    /// Resolves a movetext token against `position`. The error is the reason
    /// the move cannot be played there.
    fn resolve(&self, position: &Self::Position, san: &SanPlus) -> Result<Self::Move, String>;

    fn apply_move(&self, position: &Self::Position, mv: &Self::Move) -> Self::Position;

    fn to_fen(&self, position: &Self::Position) -> String;

    /// SAN of `mv` played from `position`, with check or mate suffix.
    fn to_san(&self, position: &Self::Position, mv: &Self::Move) -> String;

    fn describe(&self, position: &Self::Position, mv: &Self::Move) -> MoveRecord;
}

/// A shakmaty position plus the castling notation its game uses.
#[derive(Debug, Clone)]
pub struct Board {
    pos: Chess,
    mode: CastlingMode,
}

impl Board {
    pub fn new(pos: Chess, mode: CastlingMode) -> Self {
        Self { pos, mode }
    }

    pub fn position(&self) -> &Chess {
        &self.pos
    }

    pub fn castling_mode(&self) -> CastlingMode {
        self.mode
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(Chess::default(), CastlingMode::Standard)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyEngine;

fn variant_castling_mode(variant: &str) -> Option<CastlingMode> {
    match variant.trim().to_lowercase().as_str() {
        "" | "standard" | "chess" | "normal" | "from position" | "fromposition" => {
            Some(CastlingMode::Standard)
        }
        "chess960" | "chess 960" | "fischerandom" | "fischer random" | "960" => {
            Some(CastlingMode::Chess960)
        }
        _ => None,
    }
}

impl PositionEngine for ShakmatyEngine {
    type Position = Board;
    type Move = Move;

    fn setup(&self, headers: &Headers) -> Result<Board, GameError> {
        let mode = match headers.get("Variant") {
            Some(variant) => variant_castling_mode(variant).ok_or_else(|| {
                GameError::Malformed(format!("Unsupported variant: Variant='{variant}'"))
            })?,
            None => CastlingMode::Standard,
        };

        let Some(raw) = headers.get("FEN") else {
            return Ok(Board::new(Chess::default(), mode));
        };

        let fen = Fen::from_ascii(raw.trim().as_bytes())
            .map_err(|e| GameError::Malformed(format!("Invalid FEN header: FEN='{raw}' ({e})")))?;

        // Castling rights in any notation (KQkq, Shredder, X-FEN) are accepted.
        let pos: Chess = fen
            .into_position(CastlingMode::Chess960)
            .map_err(|e| GameError::Malformed(format!("Invalid FEN position: FEN='{raw}' ({e})")))?;

        Ok(Board::new(pos, mode))
    }

    fn resolve(&self, position: &Board, san: &SanPlus) -> Result<Move, String> {
        san.san.to_move(&position.pos).map_err(|e| e.to_string())
    }

    fn apply_move(&self, position: &Board, mv: &Move) -> Board {
        let mut next = position.clone();
        next.pos.play_unchecked(mv.clone());
        next
    }

    fn to_fen(&self, position: &Board) -> String {
        Fen::from_position(&position.pos, EnPassantMode::Legal).to_string()
    }

    fn to_san(&self, position: &Board, mv: &Move) -> String {
        let mut san = San::from_move(&position.pos, mv.clone()).to_string();

        let mut after = position.pos.clone();
        after.play_unchecked(mv.clone());
        if after.is_checkmate() {
            san.push('#');
        } else if after.is_check() {
            san.push('+');
        }
        san
    }

    fn describe(&self, position: &Board, mv: &Move) -> MoveRecord {
        let uci = mv.to_uci(position.mode);

        // Squares follow the UCI form, so castling reports the king's
        // destination in standard notation.
        let (from, to, promotion, drop) = match &uci {
            UciMove::Normal {
                from,
                to,
                promotion,
            } => (
                *from as u8,
                *to as u8,
                promotion.map(|role| role as u8),
                None,
            ),
            UciMove::Put { role, to } => (*to as u8, *to as u8, None, Some(*role as u8)),
            UciMove::Null => (0, 0, None, None),
        };

        MoveRecord {
            uci: uci.to_string(),
            san: self.to_san(position, mv),
            from,
            to,
            promotion,
            drop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn san(text: &str) -> SanPlus {
        text.parse().expect("valid san")
    }

    fn play(engine: &ShakmatyEngine, board: &Board, text: &str) -> (Board, MoveRecord) {
        let mv = engine.resolve(board, &san(text)).expect("legal move");
        let record = engine.describe(board, &mv);
        (engine.apply_move(board, &mv), record)
    }

    #[test]
    fn test_setup_without_fen_is_standard_start() {
        let engine = ShakmatyEngine;
        let board = engine.setup(&Headers::default()).unwrap();
        assert_eq!(engine.to_fen(&board), STARTING_FEN);
        assert_eq!(board.castling_mode(), CastlingMode::Standard);
    }

    #[test]
    fn test_setup_from_fen_header() {
        let engine = ShakmatyEngine;
        let mut headers = Headers::default();
        headers.insert("SetUp".to_string(), "1".to_string());
        headers.insert("FEN".to_string(), "4k3/8/8/8/8/8/8/4K2R w K - 0 1".to_string());

        let board = engine.setup(&headers).unwrap();
        assert_eq!(engine.to_fen(&board), "4k3/8/8/8/8/8/8/4K2R w K - 0 1");
    }

    #[test]
    fn test_setup_rejects_invalid_fen() {
        let engine = ShakmatyEngine;
        let mut headers = Headers::default();
        headers.insert("FEN".to_string(), "not a fen".to_string());

        let err = engine.setup(&headers).unwrap_err();
        assert!(matches!(err, GameError::Malformed(_)));
    }

    #[test]
    fn test_setup_rejects_unsupported_variant() {
        let engine = ShakmatyEngine;
        let mut headers = Headers::default();
        headers.insert("Variant".to_string(), "Crazyhouse".to_string());

        let err = engine.setup(&headers).unwrap_err();
        assert!(err.to_string().contains("Crazyhouse"));
    }

    #[test]
    fn test_describe_plain_move() {
        let engine = ShakmatyEngine;
        let (after, record) = play(&engine, &Board::default(), "e4");

        assert_eq!(record.uci, "e2e4");
        assert_eq!(record.san, "e4");
        assert_eq!(record.from, 12);
        assert_eq!(record.to, 28);
        assert_eq!(record.promotion, None);
        assert_eq!(record.drop, None);
        assert_eq!(
            engine.to_fen(&after),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_describe_castling_uses_king_destination() {
        let engine = ShakmatyEngine;
        let mut headers = Headers::default();
        headers.insert("FEN".to_string(), "4k3/8/8/8/8/8/8/4K2R w K - 0 1".to_string());
        let board = engine.setup(&headers).unwrap();

        let (_, record) = play(&engine, &board, "O-O");
        assert_eq!(record.uci, "e1g1");
        assert_eq!(record.san, "O-O");
        assert_eq!(record.from, 4);
        assert_eq!(record.to, 6);
    }

    #[test]
    fn test_describe_promotion() {
        let engine = ShakmatyEngine;
        let mut headers = Headers::default();
        headers.insert("FEN".to_string(), "8/P6k/8/8/8/8/8/K7 w - - 0 1".to_string());
        let board = engine.setup(&headers).unwrap();

        let (_, record) = play(&engine, &board, "a8=Q");
        assert_eq!(record.uci, "a7a8q");
        assert_eq!(record.promotion, Some(5));
        assert_eq!(record.to, 56);
    }

    #[test]
    fn test_to_san_marks_mate() {
        let engine = ShakmatyEngine;
        let mut board = Board::default();
        for text in ["f3", "e5", "g4"] {
            board = play(&engine, &board, text).0;
        }
        let (_, record) = play(&engine, &board, "Qh4");
        assert_eq!(record.san, "Qh4#");
    }

    #[test]
    fn test_resolve_rejects_illegal_move() {
        let engine = ShakmatyEngine;
        assert!(engine.resolve(&Board::default(), &san("e5")).is_err());
        assert!(engine.resolve(&Board::default(), &san("Nf6")).is_err());
    }

    #[test]
    fn test_en_passant_square_only_when_legal() {
        let engine = ShakmatyEngine;
        let mut board = Board::default();
        for text in ["e4", "a6", "e5", "d5"] {
            board = play(&engine, &board, text).0;
        }
        assert!(engine.to_fen(&board).contains(" w KQkq d6 "));
    }
}
