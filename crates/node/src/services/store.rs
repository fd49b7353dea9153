//! Key-value persistence.
//!
//! Keys are `/`-separated paths into one JSON tree. Reading a prefix returns
//! everything stored beneath it as a single merged object.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Errors from a store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A value to write contains a null leaf and deletion was not allowed.
    #[error("Refusing to write null value under {key}")]
    NullValue {
        /// Key of the offending pair.
        key: String,
    },

    /// A path segment runs through a non-object value.
    #[error("Path {key} passes through a non-object value")]
    NotAnObject {
        /// Key of the offending pair.
        key: String,
    },

    /// The key has no segments.
    #[error("Empty store key")]
    EmptyKey,

    /// Backend-specific failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Persistence used by the engine.
#[async_trait]
pub trait StoreService: Send + Sync {
    /// Value at `key`, or the merged subtree if `key` is a prefix.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write all pairs, or none of them.
    ///
    /// Pairs whose value contains a null leaf are rejected unless
    /// `allow_delete` is set, in which case a null value deletes the key.
    async fn set(&self, pairs: Vec<(String, Value)>, allow_delete: bool) -> Result<(), StoreError>;
}

fn segments(key: &str) -> Result<Vec<&str>, StoreError> {
    let parts: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
    if parts.is_empty() {
        return Err(StoreError::EmptyKey);
    }
    Ok(parts)
}

fn has_null_leaf(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(has_null_leaf),
        Value::Object(map) => map.values().any(has_null_leaf),
        _ => false,
    }
}

/// In-memory store backed by a single JSON tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    root: Arc<RwLock<Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn insert(root: &mut Map<String, Value>, key: &str, value: Value) -> Result<(), StoreError> {
    let parts = segments(key)?;
    let (last, parents) = parts.split_last().ok_or(StoreError::EmptyKey)?;

    let mut node = root;
    for part in parents {
        let child = node
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        node = child.as_object_mut().ok_or_else(|| StoreError::NotAnObject {
            key: key.to_string(),
        })?;
    }
    node.insert(last.to_string(), value);
    Ok(())
}

fn remove(root: &mut Map<String, Value>, key: &str) -> Result<(), StoreError> {
    let parts = segments(key)?;
    let (last, parents) = parts.split_last().ok_or(StoreError::EmptyKey)?;

    let mut node = root;
    for part in parents {
        match node.get_mut(*part).and_then(Value::as_object_mut) {
            Some(child) => node = child,
            None => return Ok(()),
        }
    }
    node.remove(*last);
    Ok(())
}

#[async_trait]
impl StoreService for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let root = self.root.read().await;
        let mut node: Option<&Value> = None;
        for (i, part) in segments(key)?.into_iter().enumerate() {
            let next = if i == 0 {
                root.get(part)
            } else {
                node.and_then(|v| v.get(part))
            };
            match next {
                Some(v) => node = Some(v),
                None => return Ok(None),
            }
        }
        Ok(node.cloned())
    }

    async fn set(&self, pairs: Vec<(String, Value)>, allow_delete: bool) -> Result<(), StoreError> {
        if !allow_delete {
            if let Some((key, _)) = pairs.iter().find(|(_, v)| has_null_leaf(v)) {
                return Err(StoreError::NullValue { key: key.clone() });
            }
        }

        let mut root = self.root.write().await;
        // Stage on a copy so a failing pair leaves the store untouched.
        let mut staged = root.clone();
        for (key, value) in pairs {
            if value.is_null() {
                remove(&mut staged, &key)?;
            } else {
                insert(&mut staged, &key, value)?;
            }
        }
        *root = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        store
            .set(vec![("/channels/0xabc".to_string(), json!({"nonce": 1}))], false)
            .await
            .unwrap();

        assert_eq!(
            store.get("/channels/0xabc").await.unwrap(),
            Some(json!({"nonce": 1}))
        );
        assert_eq!(store.get("/channels/0xdef").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prefix_get_returns_merged_subtree() {
        let store = MemoryStore::new();
        store
            .set(
                vec![
                    ("/channels/a".to_string(), json!({"x": 1})),
                    ("/channels/b".to_string(), json!(2)),
                ],
                false,
            )
            .await
            .unwrap();
        store
            .set(vec![("/channels/a/y".to_string(), json!(3))], false)
            .await
            .unwrap();

        assert_eq!(
            store.get("channels").await.unwrap(),
            Some(json!({"a": {"x": 1, "y": 3}, "b": 2}))
        );
    }

    #[tokio::test]
    async fn test_null_leaf_rejected_without_delete() {
        let store = MemoryStore::new();
        let err = store
            .set(vec![("/a".to_string(), json!({"b": null}))], false)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NullValue { key: "/a".to_string() });
        assert_eq!(store.get("/a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_null_with_delete_removes_key() {
        let store = MemoryStore::new();
        store
            .set(vec![("/a/b".to_string(), json!(1)), ("/a/c".to_string(), json!(2))], false)
            .await
            .unwrap();
        store
            .set(vec![("/a/b".to_string(), Value::Null)], true)
            .await
            .unwrap();

        assert_eq!(store.get("/a").await.unwrap(), Some(json!({"c": 2})));
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let store = MemoryStore::new();
        store.set(vec![("/a".to_string(), json!(1))], false).await.unwrap();

        let err = store
            .set(
                vec![
                    ("/b".to_string(), json!(2)),
                    ("/a/nested".to_string(), json!(3)),
                ],
                false,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotAnObject { .. }));
        assert_eq!(store.get("/b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let store = MemoryStore::new();
        assert_eq!(store.get("/").await, Err(StoreError::EmptyKey));
    }
}
