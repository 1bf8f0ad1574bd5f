use super::annotation::{CommentCommands, WalkOptions};
use super::engine::PositionEngine;
use super::error::GameError;
use super::record::{GameRecord, MainlineEntry, NodeRecord};
use super::types::{GameTree, Node};

/// Depth-first, declaration-ordered walk of a `GameTree` into a `GameRecord`.
///
/// Every child is played from its parent's position; siblings never see each
/// other's moves. Any move the engine refuses fails the whole game.
pub struct TreeWalker<'e, E> {
    engine: &'e E,
    options: WalkOptions,
}

impl<'e, E: PositionEngine> TreeWalker<'e, E> {
    pub fn new(engine: &'e E, options: WalkOptions) -> Self {
        Self { engine, options }
    }

    pub fn walk(&self, tree: &GameTree<E::Position>) -> Result<GameRecord, GameError> {
        let start = tree.starting_position();
        let root = tree.root_annotations();

        let variations = self.walk_children(tree.variations(), start, true, 1)?;
        let mainline = self.mainline(tree)?;

        Ok(GameRecord {
            headers: tree.headers().clone(),
            starting_fen: self.engine.to_fen(start),
            comment: root.comment.clone(),
            starting_comment: root.starting_comment.clone(),
            nags: root.sorted_nags(),
            is_end: tree.variations().is_empty(),
            variations,
            mainline,
            total_nodes: tree.count(),
        })
    }

    fn walk_children(
        &self,
        children: &[Node],
        parent: &E::Position,
        parent_on_mainline: bool,
        ply: u32,
    ) -> Result<Vec<NodeRecord>, GameError> {
        children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                self.walk_node(child, parent, index, parent_on_mainline && index == 0, ply)
            })
            .collect()
    }

    fn walk_node(
        &self,
        node: &Node,
        parent: &E::Position,
        variation_index: usize,
        is_mainline: bool,
        ply: u32,
    ) -> Result<NodeRecord, GameError> {
        let mv = self.resolve(parent, node, ply)?;
        let mv_record = self.engine.describe(parent, &mv);
        let position = self.engine.apply_move(parent, &mv);

        let annotations = &node.annotations;
        let commands = CommentCommands::parse(annotations.comment.as_deref(), self.options);
        let variations = self.walk_children(&node.variations, &position, is_mainline, ply + 1)?;

        Ok(NodeRecord {
            mv: mv_record,
            fen: self.engine.to_fen(&position),
            comment: annotations.comment.clone(),
            starting_comment: annotations.starting_comment.clone(),
            nags: annotations.sorted_nags(),
            clock: commands.clock,
            eval: commands.eval,
            arrows: commands.arrows,
            shapes: Vec::new(),
            is_end: node.is_end(),
            is_mainline,
            is_main_variation: variation_index == 0,
            variations,
            variation_index,
        })
    }

    /// Replays `variations[0]` from the starting position until a leaf.
    fn mainline(&self, tree: &GameTree<E::Position>) -> Result<Vec<MainlineEntry>, GameError> {
        let mut position = tree.starting_position().clone();
        let mut entries = Vec::new();
        let mut next = tree.variations().first();
        let mut ply = 1;

        while let Some(node) = next {
            let mv = self.resolve(&position, node, ply)?;
            let uci = self.engine.describe(&position, &mv).uci;
            let san = self.engine.to_san(&position, &mv);
            position = self.engine.apply_move(&position, &mv);

            entries.push(MainlineEntry {
                uci,
                san,
                fen_after: self.engine.to_fen(&position),
            });

            next = node.variations.first();
            ply += 1;
        }

        Ok(entries)
    }

    fn resolve(&self, position: &E::Position, node: &Node, ply: u32) -> Result<E::Move, GameError> {
        self.engine
            .resolve(position, &node.san)
            .map_err(|reason| GameError::IllegalMove {
                san: node.san.to_string(),
                ply,
                fen: self.engine.to_fen(position),
                reason,
            })
    }
}
