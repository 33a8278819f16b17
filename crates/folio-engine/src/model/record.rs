use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ArticleId, BlockId};

/// Free-form JSON object used for block `data` and `extension`.
pub type Fields = Map<String, Value>;

/// Persisted, serializable node of an article's block tree.
///
/// `sequence` orders siblings sharing the same parent. It has no fixed scale,
/// only relative order matters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BlockId>,
    #[serde(default, alias = "pageId", skip_serializing_if = "Option::is_none")]
    pub page_id: Option<ArticleId>,
    #[serde(default, alias = "parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BlockId>,
    #[serde(default)]
    pub sequence: f64,
    pub kind: String,
    #[serde(default)]
    pub data: Fields,
    #[serde(default)]
    pub extension: Fields,
    #[serde(default)]
    pub children: Vec<BlockRecord>,
}

impl BlockRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for a single `data` field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<BlockRecord>) -> Self {
        self.children = children;
        self
    }

    /// Read a string field from `data`.
    pub fn text_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Visit this record and every descendant, parents before children.
    pub fn walk(&self, visit: &mut impl FnMut(&BlockRecord)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// An article together with its top-level blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDef {
    pub id: ArticleId,
    #[serde(default, alias = "rootId", skip_serializing_if = "Option::is_none")]
    pub root_id: Option<ArticleId>,
    #[serde(default, alias = "parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ArticleId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub tags: Value,
    #[serde(default)]
    pub extension: Fields,
    #[serde(default)]
    pub blocks: Vec<BlockRecord>,
}

impl ArticleDef {
    pub fn new(id: ArticleId, title: impl Into<String>) -> Self {
        Self {
            id,
            root_id: None,
            parent_id: None,
            title: title.into(),
            namespace: String::new(),
            tags: Value::Null,
            extension: Fields::new(),
            blocks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn accepts_camel_and_snake_case_wire_names() {
        let snake: BlockRecord = serde_json::from_value(json!({
            "id": 3, "page_id": 1, "parent_id": 2, "sequence": 1.5,
            "kind": "paragraph", "data": {}, "extension": {}
        }))
        .unwrap();
        let camel: BlockRecord = serde_json::from_value(json!({
            "id": 3, "pageId": 1, "parentId": 2, "sequence": 1.5,
            "kind": "paragraph", "data": {}, "extension": {}
        }))
        .unwrap();
        assert_eq!(snake, camel);
        assert_eq!(snake.parent_id, Some(BlockId::Remote(2)));
    }

    #[test]
    fn missing_fields_default() {
        let record: BlockRecord = serde_json::from_value(json!({"kind": "hr"})).unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.sequence, 0.0);
        assert!(record.children.is_empty());
    }

    #[test]
    fn walk_visits_parents_first() {
        let record = BlockRecord::new("list").with_children(vec![
            BlockRecord::new("item").with_children(vec![BlockRecord::new("text")]),
            BlockRecord::new("item"),
        ]);
        let mut kinds = Vec::new();
        record.walk(&mut |r| kinds.push(r.kind.clone()));
        assert_eq!(kinds, vec!["list", "item", "text", "item"]);
    }
}
