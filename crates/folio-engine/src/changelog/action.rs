use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{ArticleId, BlockId, BlockRecord, Fields};
use crate::sequence::Position;

/// Replacement values for some of a block's fields.
///
/// Merging two patches is shallow: a field set in the later patch replaces
/// the earlier value wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Fields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<Fields>,
}

impl BlockPatch {
    pub fn data(data: Fields) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.data.is_none() && self.extension.is_none()
    }

    /// `self` followed by `later`.
    pub fn merged(mut self, later: BlockPatch) -> Self {
        if later.kind.is_some() {
            self.kind = later.kind;
        }
        if later.data.is_some() {
            self.data = later.data;
        }
        if later.extension.is_some() {
            self.extension = later.extension;
        }
        self
    }
}

/// A recorded mutation of an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    /// New records spliced into `parent_id`'s children. Each record already
    /// carries its id, parent and sequence.
    Insert {
        parent_id: Option<BlockId>,
        after_id: Option<BlockId>,
        position: Position,
        records: Vec<BlockRecord>,
    },
    Update {
        id: BlockId,
        patch: BlockPatch,
    },
    Delete {
        id: BlockId,
    },
    Reorder {
        id: BlockId,
        new_sequence: f64,
    },
    TitleUpdate {
        article_id: ArticleId,
        title: String,
    },
}

impl Action {
    /// Id of the block this action targets, if it targets exactly one.
    pub fn target(&self) -> Option<&BlockId> {
        match self {
            Action::Update { id, .. } | Action::Delete { id } | Action::Reorder { id, .. } => Some(id),
            Action::Insert { .. } | Action::TitleUpdate { .. } => None,
        }
    }

    pub fn is_title(&self) -> bool {
        matches!(self, Action::TitleUpdate { .. })
    }

    /// Rewrite every block id found in `map`.
    pub fn remap(&mut self, map: &HashMap<BlockId, BlockId>) {
        match self {
            Action::Insert {
                parent_id,
                after_id,
                records,
                ..
            } => {
                remap_option(parent_id, map);
                remap_option(after_id, map);
                for record in records {
                    remap_record(record, map);
                }
            }
            Action::Update { id, .. } | Action::Delete { id } | Action::Reorder { id, .. } => {
                remap_id(id, map)
            }
            Action::TitleUpdate { .. } => {}
        }
    }
}

fn remap_id(id: &mut BlockId, map: &HashMap<BlockId, BlockId>) {
    if let Some(new) = map.get(id) {
        *id = new.clone();
    }
}

fn remap_option(id: &mut Option<BlockId>, map: &HashMap<BlockId, BlockId>) {
    if let Some(id) = id {
        remap_id(id, map);
    }
}

pub(crate) fn remap_record(record: &mut BlockRecord, map: &HashMap<BlockId, BlockId>) {
    remap_option(&mut record.id, map);
    remap_option(&mut record.parent_id, map);
    for child in &mut record.children {
        remap_record(child, map);
    }
}

/// An action together with what reverts it.
///
/// The inverse is itself a list of actions, so the pair can be stored in the
/// durable buffer and replayed or reverted after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub action: Action,
    #[serde(default)]
    pub inverse: Vec<Action>,
    /// Pending actions this one made redundant (updates dropped by a delete).
    /// Undoing this action puts them back.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superseded: Vec<PendingAction>,
}

impl PendingAction {
    pub fn new(action: Action, inverse: Vec<Action>) -> Self {
        Self {
            action,
            inverse,
            superseded: Vec::new(),
        }
    }

    pub fn remap(&mut self, map: &HashMap<BlockId, BlockId>) {
        self.action.remap(map);
        for inverse in &mut self.inverse {
            inverse.remap(map);
        }
        for superseded in &mut self.superseded {
            superseded.remap(map);
        }
    }
}

/// Append `next` to `queue`, folding it into an already queued action where
/// that keeps the queue equivalent.
///
/// - an `Update` merges into the queued `Update` for the same block;
/// - a `Reorder` replaces the queued `Reorder` for the same block;
/// - a `Delete` drops queued `Update`s and `Reorder`s of every block in
///   `deleted_subtree` before being appended.
pub fn coalesce(queue: &mut Vec<PendingAction>, mut next: PendingAction, deleted_subtree: &[BlockId]) {
    match &next.action {
        Action::Update { id, patch } => {
            let existing = queue
                .iter_mut()
                .find(|p| matches!(&p.action, Action::Update { id: queued, .. } if queued == id));
            if let Some(existing) = existing {
                if let Action::Update { patch: queued, .. } = &mut existing.action {
                    *queued = std::mem::take(queued).merged(patch.clone());
                }
                existing.inverse = merge_update_inverses(&next.inverse, &existing.inverse);
                return;
            }
        }
        Action::Reorder { id, new_sequence } => {
            let existing = queue
                .iter_mut()
                .find(|p| matches!(&p.action, Action::Reorder { id: queued, .. } if queued == id));
            if let Some(existing) = existing {
                if let Action::Reorder { new_sequence: queued, .. } = &mut existing.action {
                    *queued = *new_sequence;
                }
                return;
            }
        }
        Action::Delete { .. } => {
            let (dropped, kept): (Vec<_>, Vec<_>) =
                std::mem::take(queue).into_iter().partition(|p| {
                    matches!(p.action, Action::Update { .. } | Action::Reorder { .. })
                        && p.action.target().is_some_and(|id| deleted_subtree.contains(id))
                });
            *queue = kept;
            next.superseded = dropped;
        }
        Action::Insert { .. } | Action::TitleUpdate { .. } => {}
    }
    queue.push(next);
}

/// Inverse of two merged updates: the earlier inverse wins for every field it
/// restores, the later one fills in the fields only it touched.
fn merge_update_inverses(later: &[Action], earlier: &[Action]) -> Vec<Action> {
    match (later, earlier) {
        (
            [Action::Update { id, patch: later }],
            [Action::Update { patch: earlier, .. }],
        ) => vec![Action::Update {
            id: id.clone(),
            patch: later.clone().merged(earlier.clone()),
        }],
        _ => earlier.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap_or_default()
    }

    fn update(id: i64, patch: BlockPatch, before: BlockPatch) -> PendingAction {
        PendingAction::new(
            Action::Update {
                id: BlockId::Remote(id),
                patch,
            },
            vec![Action::Update {
                id: BlockId::Remote(id),
                patch: before,
            }],
        )
    }

    #[test]
    fn serializes_with_op_tag() {
        let action = Action::Reorder {
            id: BlockId::Remote(3),
            new_sequence: 1.5,
        };
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"op": "reorder", "id": 3, "new_sequence": 1.5})
        );
    }

    #[test]
    fn updates_for_same_block_merge() {
        // Given a queued data update
        let mut queue = Vec::new();
        let first = BlockPatch::data(fields(json!({"text": "a"})));
        let original = BlockPatch::data(fields(json!({"text": "orig"})));
        coalesce(&mut queue, update(1, first, original.clone()), &[]);

        // When a kind change follows for the same block
        let second = BlockPatch {
            kind: Some("heading".to_string()),
            data: Some(fields(json!({"text": "b", "level": 1}))),
            ..Default::default()
        };
        let before_second = BlockPatch {
            kind: Some("paragraph".to_string()),
            data: Some(fields(json!({"text": "a"}))),
            ..Default::default()
        };
        coalesce(&mut queue, update(1, second, before_second), &[]);

        // Then one action carries both, and undo restores the original
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue[0].action,
            Action::Update {
                id: BlockId::Remote(1),
                patch: BlockPatch {
                    kind: Some("heading".to_string()),
                    data: Some(fields(json!({"text": "b", "level": 1}))),
                    extension: None,
                }
            }
        );
        assert_eq!(
            queue[0].inverse,
            vec![Action::Update {
                id: BlockId::Remote(1),
                patch: BlockPatch {
                    kind: Some("paragraph".to_string()),
                    data: Some(fields(json!({"text": "orig"}))),
                    extension: None,
                }
            }]
        );
    }

    #[test]
    fn updates_for_different_blocks_do_not_merge() {
        let mut queue = Vec::new();
        coalesce(&mut queue, update(1, BlockPatch::default(), BlockPatch::default()), &[]);
        coalesce(&mut queue, update(2, BlockPatch::default(), BlockPatch::default()), &[]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn delete_drops_pending_updates_of_subtree() {
        // Given updates for a block, its child, and an unrelated block
        let mut queue = Vec::new();
        coalesce(&mut queue, update(1, BlockPatch::default(), BlockPatch::default()), &[]);
        coalesce(&mut queue, update(2, BlockPatch::default(), BlockPatch::default()), &[]);
        coalesce(&mut queue, update(3, BlockPatch::default(), BlockPatch::default()), &[]);

        // When block 1 (parent of 2) is deleted
        let delete = PendingAction::new(Action::Delete { id: BlockId::Remote(1) }, vec![]);
        coalesce(
            &mut queue,
            delete,
            &[BlockId::Remote(1), BlockId::Remote(2)],
        );

        // Then
        let targets: Vec<_> = queue.iter().map(|p| p.action.target().cloned()).collect();
        assert_eq!(
            targets,
            vec![Some(BlockId::Remote(3)), Some(BlockId::Remote(1))]
        );
        assert_eq!(queue[1].superseded.len(), 2);
    }

    #[test]
    fn reorders_for_same_block_keep_latest_sequence() {
        let mut queue = Vec::new();
        let reorder = |seq: f64, old: f64| {
            PendingAction::new(
                Action::Reorder {
                    id: BlockId::Remote(5),
                    new_sequence: seq,
                },
                vec![Action::Reorder {
                    id: BlockId::Remote(5),
                    new_sequence: old,
                }],
            )
        };
        coalesce(&mut queue, reorder(2.0, 1.0), &[]);
        coalesce(&mut queue, reorder(3.0, 2.0), &[]);

        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue[0].action,
            Action::Reorder {
                id: BlockId::Remote(5),
                new_sequence: 3.0
            }
        );
        assert_eq!(
            queue[0].inverse,
            vec![Action::Reorder {
                id: BlockId::Remote(5),
                new_sequence: 1.0
            }]
        );
    }

    #[test]
    fn remap_rewrites_nested_record_ids() {
        let local = BlockId::new_local();
        let child = BlockId::new_local();
        let mut record = BlockRecord::new("list").with_children(vec![BlockRecord::new("item")]);
        record.id = Some(local.clone());
        record.children[0].id = Some(child.clone());
        record.children[0].parent_id = Some(local.clone());
        let mut action = Action::Insert {
            parent_id: None,
            after_id: None,
            position: Position::After,
            records: vec![record],
        };
        let map = HashMap::from([
            (local, BlockId::Remote(40)),
            (child, BlockId::Remote(41)),
        ]);

        action.remap(&map);

        let Action::Insert { records, .. } = action else {
            unreachable!()
        };
        assert_eq!(records[0].id, Some(BlockId::Remote(40)));
        assert_eq!(records[0].children[0].id, Some(BlockId::Remote(41)));
        assert_eq!(records[0].children[0].parent_id, Some(BlockId::Remote(40)));
    }
}
