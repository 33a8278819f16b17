use std::collections::HashMap;
use std::sync::Arc;

use super::kinds;
use super::{Block, BlockBehavior};
use crate::model::BlockRecord;

/// Maps a kind tag to the behavior its blocks carry.
///
/// The registry is an ordinary value: build one (usually with
/// [`BlockRegistry::with_builtin`]), extend it and share it behind an `Arc`.
pub struct BlockRegistry {
    behaviors: HashMap<String, Arc<dyn BlockBehavior>>,
    unknown: Arc<dyn BlockBehavior>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl BlockRegistry {
    /// A registry with no kinds at all. Every record becomes an unknown block.
    pub fn empty() -> Self {
        Self {
            behaviors: HashMap::new(),
            unknown: Arc::new(kinds::Unknown),
        }
    }

    /// A registry holding every built-in kind.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        for behavior in kinds::builtin() {
            registry.register(behavior);
        }
        registry
    }

    /// Register `behavior` under its kind tag.
    ///
    /// Registering the same kind twice is tolerated: the later registration
    /// replaces the earlier one and a warning is logged.
    pub fn register(&mut self, behavior: Arc<dyn BlockBehavior>) {
        let kind = behavior.kind();
        if self.behaviors.insert(kind.to_string(), behavior).is_some() {
            log::warn!("Block kind '{kind}' registered twice, replacing the earlier registration");
        }
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.behaviors.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.behaviors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub(crate) fn behavior_for(&self, kind: &str) -> Arc<dyn BlockBehavior> {
        match self.behaviors.get(kind) {
            Some(behavior) => Arc::clone(behavior),
            None => {
                log::warn!("Unknown block kind '{kind}', keeping the record as-is");
                Arc::clone(&self.unknown)
            }
        }
    }

    /// Build a [`Block`] tree from `record`.
    ///
    /// Children are built recursively through the same registry. Kinds
    /// without a registration become unknown blocks that keep the record
    /// unmodified; this never fails.
    pub fn create(&self, mut record: BlockRecord) -> Block {
        let children = std::mem::take(&mut record.children)
            .into_iter()
            .map(|child| self.create(child))
            .collect();
        let behavior = self.behavior_for(&record.kind);
        Block {
            record,
            children,
            behavior,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::MarkdownContext;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Shout;

    impl BlockBehavior for Shout {
        fn kind(&self) -> &'static str {
            "paragraph"
        }

        fn to_markdown(&self, block: &Block, _ctx: &MarkdownContext) -> String {
            block.text_field("text").unwrap_or_default().to_uppercase()
        }
    }

    #[test]
    fn creates_registered_kinds_recursively() {
        // Given a list record with nested items
        let registry = BlockRegistry::with_builtin();
        let record = BlockRecord::new("list").with_children(vec![
            BlockRecord::new("item").with_children(vec![BlockRecord::new("text").with("text", "a")]),
        ]);

        // When
        let block = registry.create(record);

        // Then every node resolved to its own behavior
        assert_eq!(block.behavior_kind(), "list");
        assert_eq!(block.children()[0].behavior_kind(), "item");
        assert_eq!(block.children()[0].children()[0].behavior_kind(), "text");
        assert!(block.record().children.is_empty());
    }

    #[test]
    fn unknown_kind_preserves_record() {
        // Given a kind nobody registered
        let registry = BlockRegistry::with_builtin();
        let record = BlockRecord::new("recipe-card")
            .with("servings", 4)
            .with("nested", json!({"a": [1, 2]}))
            .with_children(vec![BlockRecord::new("text").with("text", "x")]);

        // When
        let block = registry.create(record.clone());

        // Then it loads and round-trips verbatim
        assert_eq!(block.behavior_kind(), "unknown");
        assert_eq!(block.kind(), "recipe-card");
        assert!(!block.is_markdown_representable());
        assert_eq!(block.to_record(), record);
    }

    #[test]
    fn re_registration_replaces_previous_behavior() {
        let mut registry = BlockRegistry::with_builtin();
        registry.register(Arc::new(Shout));

        let block = registry.create(BlockRecord::new("paragraph").with("text", "hi"));

        assert_eq!(block.to_markdown(&MarkdownContext::new()), "HI");
    }

    #[test]
    fn empty_registry_falls_back_for_everything() {
        let registry = BlockRegistry::empty();
        let block = registry.create(BlockRecord::new("heading"));
        assert_eq!(block.behavior_kind(), "unknown");
        assert!(registry.kinds().is_empty());
    }
}
