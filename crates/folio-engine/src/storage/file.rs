use std::fs;
use std::path::{Path, PathBuf};

use relative_path::{RelativePath, RelativePathBuf};

use super::{DEFAULT_STORAGE_KEY, PendingStore, StorageError};
use crate::changelog::PendingAction;

/// Pending buffer kept as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    key: RelativePathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, key: impl AsRef<str>) -> Self {
        Self {
            root: root.into(),
            key: RelativePath::new(key.as_ref()).with_extension("json"),
        }
    }

    pub fn with_default_key(root: impl Into<PathBuf>) -> Self {
        Self::new(root, DEFAULT_STORAGE_KEY)
    }

    pub fn path(&self) -> PathBuf {
        self.key.to_path(&self.root)
    }

    fn ensure_parent(path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl PendingStore for FileStore {
    fn load(&self) -> Result<Vec<PendingAction>, StorageError> {
        let path = self.path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, actions: &[PendingAction]) -> Result<(), StorageError> {
        let path = self.path();
        Self::ensure_parent(&path)?;
        let content = serde_json::to_string_pretty(actions)?;
        // Write then rename so a crash never leaves a truncated buffer.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::{Action, PendingAction};
    use crate::model::ArticleId;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn title_action(title: &str) -> PendingAction {
        PendingAction::new(
            Action::TitleUpdate {
                article_id: ArticleId(1),
                title: title.to_string(),
            },
            vec![],
        )
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::with_default_key(dir.path());
        assert!(store.load().unwrap().is_empty());
        assert!(store.path().ends_with("articleBlockActions.json"));
    }

    #[test]
    fn save_then_load_returns_same_actions() {
        // Given
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested"), "buffer");
        let actions = vec![title_action("one"), title_action("two")];

        // When
        store.save(&actions).unwrap();

        // Then
        assert_eq!(store.load().unwrap(), actions);
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::with_default_key(dir.path());
        store.save(&[title_action("x")]).unwrap();

        store.clear().unwrap();

        assert!(!store.path().exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::with_default_key(dir.path());
        fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.load(), Err(StorageError::Json(_))));
    }
}
