use super::types::{Annotations, Headers, Node, ParsedGame, append_comment};
use pgn_reader::{Nag, RawComment, RawTag, SanPlus, Skip, Visitor};
use std::mem;
use std::ops::ControlFlow;

const ROOT: usize = 0;

/// Arena slot used while the movetext is still being read. Slot 0 is the root.
#[derive(Debug, Default)]
struct RawNode {
    san: Option<SanPlus>,
    parent: Option<usize>,
    annotations: Annotations,
    children: Vec<usize>,
}

/// Movetext state of the game being read.
///
/// `stack` holds the current node of every open variation, innermost last.
/// `(` re-opens the parent of the current node, `)` returns to where the
/// enclosing line stopped.
#[derive(Debug)]
pub struct MovetextBuilder {
    headers: Headers,
    nodes: Vec<RawNode>,
    stack: Vec<usize>,
    in_variation: bool,
    starting_comment: Option<String>,
}

impl MovetextBuilder {
    fn new(headers: Headers) -> Self {
        Self {
            headers,
            nodes: vec![RawNode::default()],
            stack: vec![ROOT],
            in_variation: false,
            starting_comment: None,
        }
    }

    fn current(&self) -> usize {
        self.stack.last().copied().unwrap_or(ROOT)
    }

    fn play(&mut self, san: SanPlus) {
        let parent = self.current();
        let idx = self.nodes.len();

        let mut node = RawNode {
            san: Some(san),
            parent: Some(parent),
            ..RawNode::default()
        };
        node.annotations.starting_comment = self.starting_comment.take();

        self.nodes.push(node);
        self.nodes[parent].children.push(idx);
        if let Some(top) = self.stack.last_mut() {
            *top = idx;
        }
        self.in_variation = true;
    }

    fn open_variation(&mut self) -> Skip {
        match self.nodes[self.current()].parent {
            Some(parent) => {
                self.stack.push(parent);
                self.in_variation = false;
                Skip(false)
            }
            // No move to be an alternative to. The matching `end_variation`
            // still arrives, so keep the stack balanced.
            None => {
                self.stack.push(self.current());
                Skip(true)
            }
        }
    }

    fn close_variation(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    fn comment(&mut self, text: &str) {
        let current = self.current();
        let before_first_move = current == ROOT && self.nodes[ROOT].children.is_empty();

        if self.in_variation || before_first_move {
            self.nodes[current].annotations.push_comment(text);
        } else {
            append_comment(&mut self.starting_comment, text);
        }
    }

    fn nag(&mut self, nag: u8) {
        let current = self.current();
        self.nodes[current].annotations.add_nag(nag);
    }

    fn finish(mut self) -> ParsedGame {
        let annotations = mem::take(&mut self.nodes[ROOT].annotations);
        let variations = take_children(&mut self.nodes, ROOT);
        ParsedGame {
            headers: self.headers,
            annotations,
            variations,
        }
    }
}

fn take_children(nodes: &mut [RawNode], idx: usize) -> Vec<Node> {
    let children = mem::take(&mut nodes[idx].children);
    children
        .into_iter()
        .filter_map(|child| {
            let san = nodes[child].san.take()?;
            let annotations = mem::take(&mut nodes[child].annotations);
            let variations = take_children(nodes, child);
            Some(Node {
                san,
                annotations,
                variations,
            })
        })
        .collect()
}

/// Streaming PGN visitor (pgn-reader) producing one `ParsedGame` per game.
///
/// Moves are kept as SAN tokens; resolving them against positions is the
/// walker's job, so an illegal move never stops the reader.
#[derive(Debug, Default)]
pub struct GameVisitor;

impl GameVisitor {
    pub fn new() -> Self {
        Self
    }
}

impl Visitor for GameVisitor {
    type Tags = Headers;
    type Movetext = MovetextBuilder;
    type Output = ParsedGame;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(Headers::with_roster_defaults())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let key = String::from_utf8_lossy(key).into_owned();
        let value = String::from_utf8_lossy(&value.decode()).into_owned();
        tags.insert(key, value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(MovetextBuilder::new(tags))
    }

    fn begin_variation(
        &mut self,
        movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(movetext.open_variation())
    }

    fn end_variation(&mut self, movetext: &mut Self::Movetext) -> ControlFlow<Self::Output> {
        movetext.close_variation();
        ControlFlow::Continue(())
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        movetext.play(san);
        ControlFlow::Continue(())
    }

    fn nag(&mut self, movetext: &mut Self::Movetext, nag: Nag) -> ControlFlow<Self::Output> {
        movetext.nag(nag.0);
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        movetext: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        movetext.comment(&String::from_utf8_lossy(comment.as_bytes()));
        ControlFlow::Continue(())
    }

    fn partial_comment(
        &mut self,
        movetext: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        movetext.comment(&String::from_utf8_lossy(comment.as_bytes()));
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        movetext.finish()
    }
}
