use super::record::Arrow;
use regex::Regex;
use std::sync::LazyLock;

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[%clk\s(\d+):(\d+):(\d+(?:\.\d*)?)\]").expect("valid clock command regex")
});

static EVAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[%eval\s(?:#([+-]?\d+)|([+-]?(?:\d{0,10}\.\d{1,2}|\d{1,10}\.?)))(?:,(\d+))?\]")
        .expect("valid eval command regex")
});

static ARROWS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[%(?:csl|cal)\s([RGYB][a-h][1-8](?:[a-h][1-8])?(?:,[RGYB][a-h][1-8](?:[a-h][1-8])?)*)\]",
    )
    .expect("valid arrows command regex")
});

/// Which comment commands a walk interprets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Parse `[%eval]`. When off, `eval` is always null.
    pub evaluations: bool,
}

/// Commands embedded in a move comment (`[%clk]`, `[%eval]`, `[%cal]`, `[%csl]`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentCommands {
    pub clock: Option<f64>,
    pub eval: Option<f64>,
    pub arrows: Vec<Arrow>,
}

impl CommentCommands {
    pub fn parse(comment: Option<&str>, options: WalkOptions) -> Self {
        let Some(comment) = comment else {
            return Self::default();
        };

        Self {
            clock: parse_clock(comment),
            eval: if options.evaluations {
                parse_eval(comment)
            } else {
                None
            },
            arrows: parse_arrows(comment),
        }
    }
}

/// First `[%clk H:MM:SS(.f)]`, in seconds.
pub fn parse_clock(comment: &str) -> Option<f64> {
    let caps = CLOCK_RE.captures(comment)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// First `[%eval]` as pawns from White's point of view. Mate scores have no
/// pawn value.
pub fn parse_eval(comment: &str) -> Option<f64> {
    let caps = EVAL_RE.captures(comment)?;
    if caps.get(1).is_some() {
        return None;
    }
    caps.get(2)?.as_str().parse().ok()
}

/// Every `[%cal]` arrow and `[%csl]` highlight, in comment order.
pub fn parse_arrows(comment: &str) -> Vec<Arrow> {
    ARROWS_RE
        .captures_iter(comment)
        .flat_map(|caps| {
            caps[1]
                .split(',')
                .filter_map(parse_arrow)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn parse_arrow(token: &str) -> Option<Arrow> {
    let bytes = token.as_bytes();
    let color = match bytes.first()? {
        b'R' => "red",
        b'G' => "green",
        b'Y' => "yellow",
        b'B' => "blue",
        _ => return None,
    };
    let tail = square_index(bytes.get(1..3)?)?;
    let head = match bytes.get(3..5) {
        Some(square) => square_index(square)?,
        None => tail,
    };
    Some(Arrow { color, tail, head })
}

fn square_index(square: &[u8]) -> Option<u8> {
    let [file, rank] = square else {
        return None;
    };
    if !(b'a'..=b'h').contains(file) || !(b'1'..=b'8').contains(rank) {
        return None;
    }
    Some((rank - b'1') * 8 + (file - b'a'))
}
