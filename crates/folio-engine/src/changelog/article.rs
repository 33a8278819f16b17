use std::sync::Arc;
use std::time::{Duration, Instant};

use super::action::{Action, BlockPatch, PendingAction, coalesce};
use super::flush::{FlushBatch, FlushOutcome, FlushReport};
use super::timer::FlushTimer;
use super::tree::ArticleTree;
use crate::blocks::{Block, BlockRegistry};
use crate::error::EngineError;
use crate::markdown;
use crate::model::{ArticleDef, ArticleId, BlockId, BlockRecord};
use crate::remote::RemoteStore;
use crate::sequence::{InsertTarget, Position, allocate, fix_nested, renormalized};
use crate::storage::PendingStore;

/// Notification sent to subscribers of an [`ArticleInstance`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleEvent {
    /// The block tree or the title changed.
    Changed,
    Flushed(FlushReport),
    /// A flush was rejected; the actions are queued again.
    FlushFailed(String),
}

type Listener = Box<dyn Fn(&ArticleEvent) + Send + Sync>;

/// One opened article: the live block tree, the durable queue of actions not
/// yet sent to the remote store, and the history of sent ones.
///
/// Every mutation is applied to the tree right away, queued as an [`Action`],
/// mirrored to the [`PendingStore`] and announced to subscribers.
pub struct ArticleInstance {
    tree: ArticleTree,
    pending: Vec<PendingAction>,
    /// Stored actions that did not apply on replay. Kept in the durable
    /// mirror, never sent.
    unapplied: Vec<PendingAction>,
    in_flight: Option<Vec<PendingAction>>,
    history: Vec<PendingAction>,
    store: Arc<dyn PendingStore>,
    listeners: Vec<Listener>,
    timer: FlushTimer,
}

impl ArticleInstance {
    /// Build the tree for `article` and replay the actions left in `store`
    /// by a previous session.
    ///
    /// Actions that no longer apply to the tree are set aside in
    /// [`Self::unapplied`] and stay in the store until discarded.
    pub fn new(
        article: ArticleDef,
        registry: Arc<BlockRegistry>,
        store: Arc<dyn PendingStore>,
    ) -> Self {
        let mut tree = ArticleTree::new(article, registry);
        let stored = store.load().unwrap_or_else(|err| {
            log::warn!("Could not load pending actions, starting empty: {err}");
            Vec::new()
        });

        let mut pending = Vec::with_capacity(stored.len());
        let mut unapplied = Vec::new();
        for queued in stored {
            match tree.apply(&queued.action) {
                Ok(inverse) => pending.push(PendingAction {
                    action: queued.action,
                    inverse,
                    superseded: queued.superseded,
                }),
                Err(err) => {
                    log::warn!("Stored action no longer applies, keeping it aside: {err}");
                    unapplied.push(queued);
                }
            }
        }

        let mut timer = FlushTimer::default();
        if !pending.is_empty() {
            log::info!(
                "Replayed {} pending action(s) for article {}",
                pending.len(),
                tree.article().id
            );
            timer.touch(Instant::now());
        }

        Self {
            tree,
            pending,
            unapplied,
            in_flight: None,
            history: Vec::new(),
            store,
            listeners: Vec::new(),
            timer,
        }
    }

    pub fn with_flush_delay(mut self, delay: Duration) -> Self {
        let armed = self.timer.is_armed();
        self.timer = FlushTimer::new(delay);
        if armed {
            self.timer.touch(Instant::now());
        }
        self
    }

    pub fn id(&self) -> ArticleId {
        self.tree.article().id
    }

    pub fn title(&self) -> &str {
        &self.tree.article().title
    }

    /// Article metadata without blocks.
    pub fn article(&self) -> &ArticleDef {
        self.tree.article()
    }

    pub fn roots(&self) -> &[Block] {
        self.tree.roots()
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        self.tree.registry()
    }

    pub fn find(&self, id: &BlockId) -> Option<&Block> {
        self.tree.find(id)
    }

    /// Parent id and index of block `id`.
    pub fn locate(&self, id: &BlockId) -> Option<(Option<BlockId>, usize)> {
        self.tree.locate(id)
    }

    pub fn children_of(&self, parent: Option<&BlockId>) -> Result<&[Block], EngineError> {
        self.tree.children_of(parent)
    }

    /// Actions not yet handed to a flush.
    pub fn pending(&self) -> &[PendingAction] {
        &self.pending
    }

    /// Stored actions that could not be replayed on construction.
    pub fn unapplied(&self) -> &[PendingAction] {
        &self.unapplied
    }

    /// Drop the actions set aside on replay, also from the durable store.
    /// Returns how many were dropped.
    pub fn discard_unapplied(&mut self) -> usize {
        let dropped = std::mem::take(&mut self.unapplied);
        if !dropped.is_empty() {
            log::info!("Discarding {} unapplied action(s)", dropped.len());
            self.persist();
        }
        dropped.len()
    }

    /// Flushed actions, oldest first.
    pub fn history(&self) -> &[PendingAction] {
        &self.history
    }

    pub fn is_flushing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn timer(&self) -> &FlushTimer {
        &self.timer
    }

    pub fn to_def(&self) -> ArticleDef {
        self.tree.to_def()
    }

    /// The whole article as canonical markdown.
    pub fn markdown(&self) -> String {
        markdown::serialize_all(self.tree.roots())
    }

    pub fn subscribe(&mut self, listener: impl Fn(&ArticleEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Insert `records` as new children of `parent` next to `target`.
    ///
    /// Every record (nested ones included) gets a fresh local id. Returns the
    /// ids of the top-level inserted records in order.
    pub fn insert_blocks(
        &mut self,
        parent: Option<&BlockId>,
        target: &InsertTarget,
        position: Position,
        mut records: Vec<BlockRecord>,
    ) -> Result<Vec<BlockId>, EngineError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let siblings = self.tree.children_of(parent)?;
        let allocation = allocate(siblings, target, position, records.len())?;
        let after_id = match target {
            InsertTarget::Start => None,
            InsertTarget::Block(id) => Some(id.clone()),
            InsertTarget::End => siblings.last().and_then(|last| last.id().cloned()),
        };

        fix_nested(&mut records);
        let page = self.id();
        let mut ids = Vec::with_capacity(records.len());
        for (record, sequence) in records.iter_mut().zip(allocation.values()) {
            record.sequence = sequence;
            let id = assign_ids(record, parent, page);
            ids.push(id);
        }

        self.commit(Action::Insert {
            parent_id: parent.cloned(),
            after_id,
            position,
            records,
        })?;
        Ok(ids)
    }

    pub fn update_block(&mut self, id: &BlockId, patch: BlockPatch) -> Result<(), EngineError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.commit(Action::Update {
            id: id.clone(),
            patch,
        })
    }

    /// Delete `id` and its subtree. Queued updates of the subtree are dropped.
    pub fn delete_block(&mut self, id: &BlockId) -> Result<(), EngineError> {
        self.commit(Action::Delete { id: id.clone() })
    }

    pub fn update_title(&mut self, title: impl Into<String>) -> Result<(), EngineError> {
        self.commit(Action::TitleUpdate {
            article_id: self.id(),
            title: title.into(),
        })
    }

    /// Move `id` next to `target` among its current siblings and return its
    /// new sequence.
    pub fn reorder_block(
        &mut self,
        id: &BlockId,
        target: &InsertTarget,
        position: Position,
    ) -> Result<f64, EngineError> {
        let (parent, _) = self
            .tree
            .locate(id)
            .ok_or_else(|| EngineError::BlockNotFound(id.clone()))?;
        let siblings: Vec<&Block> = self
            .tree
            .children_of(parent.as_ref())?
            .iter()
            .filter(|sibling| sibling.id() != Some(id))
            .collect();
        let allocation = allocate(siblings.as_slice(), target, position, 1)?;
        let sequence = allocation.start + allocation.step();

        self.commit(Action::Reorder {
            id: id.clone(),
            new_sequence: sequence,
        })?;
        Ok(sequence)
    }

    /// Rewrite the children of `parent` to sequences `1..=n`, keeping their
    /// order. Returns how many blocks moved.
    pub fn renormalize_children(&mut self, parent: Option<&BlockId>) -> Result<usize, EngineError> {
        let siblings = self.tree.children_of(parent)?;
        let changes: Vec<(BlockId, f64)> = siblings
            .iter()
            .zip(renormalized(siblings.len()))
            .filter(|(block, sequence)| block.sequence() != *sequence)
            .filter_map(|(block, sequence)| block.id().cloned().map(|id| (id, sequence)))
            .collect();
        for (id, new_sequence) in &changes {
            self.commit(Action::Reorder {
                id: id.clone(),
                new_sequence: *new_sequence,
            })?;
        }
        Ok(changes.len())
    }

    /// Revert the most recent action.
    ///
    /// A queued action is reverted locally and dropped from the queue. Once
    /// everything was flushed, the last flushed action is reverted and its
    /// inverse queued so the remote store follows. Returns `false` when
    /// there is nothing to undo. Fails with [`EngineError::FlushInFlight`]
    /// when the most recent actions are being sent.
    pub fn undo_last(&mut self) -> Result<bool, EngineError> {
        if let Some(last) = self.pending.pop() {
            for inverse in &last.inverse {
                if let Err(err) = self.tree.apply(inverse) {
                    log::warn!("Undo could not fully revert {:?}: {err}", last.action);
                }
            }
            self.pending.extend(last.superseded);
            if self.pending.is_empty() {
                self.timer.cancel();
            }
            self.persist();
            self.emit(&ArticleEvent::Changed);
            return Ok(true);
        }

        if self.in_flight.is_some() {
            return Err(EngineError::FlushInFlight);
        }
        let Some(last) = self.history.pop() else {
            return Ok(false);
        };
        for inverse in last.inverse.iter().cloned() {
            self.commit(inverse)?;
        }
        Ok(true)
    }

    /// Capture everything queued for sending.
    ///
    /// Returns `None` when nothing is queued or a flush is already running.
    /// The captured actions stay in the durable mirror until
    /// [`Self::finish_flush`] confirms them.
    pub fn begin_flush(&mut self) -> Option<FlushBatch> {
        if self.in_flight.is_some() || self.pending.is_empty() {
            return None;
        }
        self.timer.cancel();
        let actions = std::mem::take(&mut self.pending);
        self.in_flight = Some(actions.clone());
        self.persist();
        Some(FlushBatch::new(self.id(), actions))
    }

    /// Settle a flush started by [`Self::begin_flush`].
    ///
    /// Store-assigned ids replace local ones everywhere, whether or not the
    /// flush succeeded. On success the batch moves to the history. On failure
    /// the parts the remote store already carried out move to the history
    /// and the rest goes back to the front of the queue.
    pub fn finish_flush(
        &mut self,
        batch: FlushBatch,
        outcome: FlushOutcome,
    ) -> Result<FlushReport, EngineError> {
        self.in_flight = None;
        let (mut done, mut retry) = match &outcome.result {
            Ok(_) => (batch.into_actions(), Vec::new()),
            Err(_) => batch.split_failed(&outcome),
        };

        let id_map = &outcome.id_map;
        if !id_map.is_empty() {
            self.tree.remap(id_map);
            for pending in self
                .pending
                .iter_mut()
                .chain(self.history.iter_mut())
                .chain(done.iter_mut())
                .chain(retry.iter_mut())
            {
                pending.remap(id_map);
            }
        }
        self.history.append(&mut done);

        match outcome.result {
            Ok(report) => {
                self.persist();
                log::debug!("Flush of article {} succeeded: {report:?}", self.id());
                self.emit(&ArticleEvent::Flushed(report.clone()));
                Ok(report)
            }
            Err(err) => {
                log::error!(
                    "Flush of article {} failed, {} action(s) queued again: {err}",
                    self.id(),
                    retry.len()
                );
                retry.append(&mut self.pending);
                self.pending = retry;
                self.persist();
                self.emit(&ArticleEvent::FlushFailed(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Send all queued actions to `remote`. `Ok(None)` when nothing was queued.
    pub async fn flush(
        &mut self,
        remote: &dyn RemoteStore,
    ) -> Result<Option<FlushReport>, EngineError> {
        if self.in_flight.is_some() {
            return Err(EngineError::FlushInFlight);
        }
        let Some(batch) = self.begin_flush() else {
            return Ok(None);
        };
        let outcome = batch.send(remote).await;
        self.finish_flush(batch, outcome).map(Some)
    }

    /// Flush when the quiescence delay has passed since the last edit.
    pub async fn flush_if_due(
        &mut self,
        now: Instant,
        remote: &dyn RemoteStore,
    ) -> Result<Option<FlushReport>, EngineError> {
        if !self.timer.is_due(now) || self.in_flight.is_some() {
            return Ok(None);
        }
        self.flush(remote).await
    }

    /// Apply `action`, queue it and tell everyone.
    fn commit(&mut self, action: Action) -> Result<(), EngineError> {
        let deleted = match &action {
            Action::Delete { id } => self
                .tree
                .find(id)
                .map(Block::subtree_ids)
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        let inverse = self.tree.apply(&action)?;
        log::debug!("Applied {action:?}");
        coalesce(&mut self.pending, PendingAction::new(action, inverse), &deleted);
        self.persist();
        self.timer.touch(Instant::now());
        self.emit(&ArticleEvent::Changed);
        Ok(())
    }

    /// Mirror in-flight and queued actions to the durable store. A failing
    /// store leaves the in-memory queue authoritative.
    fn persist(&self) {
        let mut buffer = self.unapplied.clone();
        buffer.extend(self.in_flight.iter().flatten().cloned());
        buffer.extend(self.pending.iter().cloned());
        if let Err(err) = self.store.save(&buffer) {
            log::warn!("Could not mirror pending actions: {err}");
        }
    }

    fn emit(&self, event: &ArticleEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

/// Give `record` and its descendants fresh local ids and parent links.
fn assign_ids(record: &mut BlockRecord, parent: Option<&BlockId>, page: ArticleId) -> BlockId {
    let id = BlockId::new_local();
    record.id = Some(id.clone());
    record.parent_id = parent.cloned();
    record.page_id = Some(page);
    for child in &mut record.children {
        assign_ids(child, Some(&id), page);
    }
    id
}
