use std::collections::HashMap;

use futures::future::join_all;

use super::action::{Action, PendingAction};
use crate::model::{ArticleId, BlockId, BlockRecord};
use crate::remote::{ArticlePatch, BlockFields, NewBlock, PatchRequest, RemoteError, RemoteStore};
use crate::sequence::Position;

/// Pending actions captured for one flush.
///
/// Sending borrows only the batch, so the article keeps accepting edits while
/// the remote calls are in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushBatch {
    article_id: ArticleId,
    actions: Vec<PendingAction>,
}

/// Summary of a successful flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub created: usize,
    pub deleted: usize,
    pub patched: usize,
    pub title_updated: bool,
}

/// What a flush attempt produced.
///
/// `id_map` and `deleted` record what the remote store carried out before
/// the attempt finished, whether or not it succeeded.
#[derive(Debug)]
pub struct FlushOutcome {
    /// Store-assigned ids of the created blocks, keyed by the id they had.
    pub id_map: HashMap<BlockId, BlockId>,
    /// Store ids of the blocks that are gone remotely.
    pub deleted: Vec<BlockId>,
    pub result: Result<FlushReport, RemoteError>,
}

impl FlushBatch {
    pub(crate) fn new(article_id: ArticleId, actions: Vec<PendingAction>) -> Self {
        Self {
            article_id,
            actions,
        }
    }

    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    pub fn actions(&self) -> &[PendingAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub(crate) fn into_actions(self) -> Vec<PendingAction> {
        self.actions
    }

    /// Send the batch: creations first (parents before children), then all
    /// deletes concurrently, then one batched update, then the last title.
    pub async fn send(&self, remote: &dyn RemoteStore) -> FlushOutcome {
        let mut id_map = HashMap::new();
        let mut deleted = Vec::new();
        let result = self.send_all(remote, &mut id_map, &mut deleted).await;
        FlushOutcome {
            id_map,
            deleted,
            result,
        }
    }

    async fn send_all(
        &self,
        remote: &dyn RemoteStore,
        id_map: &mut HashMap<BlockId, BlockId>,
        deleted: &mut Vec<BlockId>,
    ) -> Result<FlushReport, RemoteError> {
        let mut report = FlushReport::default();

        for record in self.created_records() {
            let block = NewBlock {
                parent_id: record.parent_id.as_ref().map(|parent| mapped(parent, id_map)),
                sequence: record.sequence,
                kind: record.kind.clone(),
                data: record.data.clone(),
                extension: record.extension.clone(),
            };
            let created = remote.create_article_block(self.article_id, block).await?;
            if let (Some(local), Some(assigned)) = (&record.id, created.id) {
                id_map.insert(local.clone(), assigned);
            }
            report.created += 1;
        }

        let deletes: Vec<BlockId> = self
            .actions
            .iter()
            .filter_map(|pending| match &pending.action {
                Action::Delete { id } => Some(mapped(id, id_map)),
                _ => None,
            })
            .collect();
        if !deletes.is_empty() {
            let results = join_all(deletes.iter().cloned().map(|id| remote.delete_block(id))).await;
            let mut failure = None;
            for (id, result) in deletes.into_iter().zip(results) {
                match result {
                    Ok(()) => {}
                    // Already gone, e.g. deleted by an attempt that failed later on.
                    Err(RemoteError::NotFound(message)) => {
                        log::warn!("Block {id} was already deleted remotely: {message}");
                    }
                    Err(err) => {
                        failure.get_or_insert(err);
                        continue;
                    }
                }
                deleted.push(id);
                report.deleted += 1;
            }
            if let Some(err) = failure {
                return Err(err);
            }
        }

        let patches = self.patches(id_map);
        if !patches.is_empty() {
            report.patched = patches.len();
            remote.update_blocks_batch(patches).await?;
        }

        if let Some(title) = self.last_title() {
            let patch = ArticlePatch {
                title: Some(title.to_string()),
                ..Default::default()
            };
            remote.update_article(self.article_id, patch).await?;
            report.title_updated = true;
        }

        log::debug!("Flushed article {}: {report:?}", self.article_id);
        Ok(report)
    }

    /// Every inserted record in creation order, parents before children.
    fn created_records(&self) -> Vec<&BlockRecord> {
        let mut out = Vec::new();
        for pending in &self.actions {
            if let Action::Insert { records, .. } = &pending.action {
                for record in records {
                    preorder(record, &mut out);
                }
            }
        }
        out
    }

    /// Updates and reorders merged into one patch per block, in order of
    /// first appearance.
    fn patches(&self, id_map: &HashMap<BlockId, BlockId>) -> Vec<PatchRequest> {
        let mut order: Vec<BlockId> = Vec::new();
        let mut merged: HashMap<BlockId, BlockFields> = HashMap::new();
        for pending in &self.actions {
            let (id, fields) = match &pending.action {
                Action::Update { id, patch } => (
                    id,
                    BlockFields {
                        kind: patch.kind.clone(),
                        data: patch.data.clone(),
                        extension: patch.extension.clone(),
                        sequence: None,
                    },
                ),
                Action::Reorder { id, new_sequence } => (
                    id,
                    BlockFields {
                        sequence: Some(*new_sequence),
                        ..Default::default()
                    },
                ),
                _ => continue,
            };
            let id = mapped(id, id_map);
            let entry = merged.entry(id.clone()).or_insert_with(|| {
                order.push(id);
                BlockFields::default()
            });
            merge_fields(entry, fields);
        }
        order
            .into_iter()
            .filter_map(|id| {
                let fields = merged.remove(&id)?;
                (!fields.is_empty()).then_some(PatchRequest { id, fields })
            })
            .collect()
    }

    /// Title updates collapse to the last one queued.
    fn last_title(&self) -> Option<&str> {
        self.actions
            .iter()
            .rev()
            .find_map(|pending| match &pending.action {
                Action::TitleUpdate { title, .. } => Some(title.as_str()),
                _ => None,
            })
    }
}

impl FlushBatch {
    /// Split the actions of a failed attempt into those the remote store
    /// already carried out and those that still have to be sent.
    ///
    /// A partly created insert counts as carried out; each subtree it still
    /// lacks is queued again as its own insert under its (created) parent.
    /// Ids are left as they were; remapping is up to the caller.
    pub(crate) fn split_failed(
        self,
        outcome: &FlushOutcome,
    ) -> (Vec<PendingAction>, Vec<PendingAction>) {
        let mut done = Vec::new();
        let mut retry = Vec::new();
        for pending in self.actions {
            match &pending.action {
                Action::Delete { id } if outcome.deleted.contains(&mapped(id, &outcome.id_map)) => {
                    done.push(pending)
                }
                Action::Insert { records, .. }
                    if records.iter().any(|r| is_created(r, &outcome.id_map)) =>
                {
                    let mut missing = Vec::new();
                    for record in records {
                        uncreated(record, &outcome.id_map, &mut missing);
                    }
                    retry.extend(missing.into_iter().map(|record| {
                        let inverse = record
                            .id
                            .iter()
                            .map(|id| Action::Delete { id: id.clone() })
                            .collect();
                        PendingAction::new(
                            Action::Insert {
                                parent_id: record.parent_id.clone(),
                                after_id: None,
                                position: Position::After,
                                records: vec![record],
                            },
                            inverse,
                        )
                    }));
                    done.push(pending);
                }
                _ => retry.push(pending),
            }
        }
        (done, retry)
    }
}

fn is_created(record: &BlockRecord, id_map: &HashMap<BlockId, BlockId>) -> bool {
    record.id.as_ref().is_some_and(|id| id_map.contains_key(id))
}

/// Collect the topmost records of `record`'s subtree that were not created.
fn uncreated(record: &BlockRecord, id_map: &HashMap<BlockId, BlockId>, out: &mut Vec<BlockRecord>) {
    if is_created(record, id_map) {
        for child in &record.children {
            uncreated(child, id_map, out);
        }
    } else {
        out.push(record.clone());
    }
}

fn preorder<'a>(record: &'a BlockRecord, out: &mut Vec<&'a BlockRecord>) {
    out.push(record);
    for child in &record.children {
        preorder(child, out);
    }
}

fn mapped(id: &BlockId, id_map: &HashMap<BlockId, BlockId>) -> BlockId {
    id_map.get(id).cloned().unwrap_or_else(|| id.clone())
}

fn merge_fields(into: &mut BlockFields, later: BlockFields) {
    if later.kind.is_some() {
        into.kind = later.kind;
    }
    if later.data.is_some() {
        into.data = later.data;
    }
    if later.extension.is_some() {
        into.extension = later.extension;
    }
    if later.sequence.is_some() {
        into.sequence = later.sequence;
    }
}
