//! In-process remote store
//!
//! Keeps the whole tree as one JSON value and pushes a fresh snapshot to
//! every subscriber whose path overlaps a write. Delivery is synchronous with
//! the write, so subscribers observe writes in the order they were applied.

use crate::error::StoreError;
use crate::path::StorePath;
use crate::snapshot::{Snapshot, SnapshotStream};
use crate::RemoteStore;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

type Sender = mpsc::UnboundedSender<Result<Snapshot, StoreError>>;

#[derive(Debug, Default)]
struct Inner {
    root: Map<String, Value>,
    subscribers: Vec<(StorePath, Sender)>,
    offline: Option<String>,
}

/// Shared in-memory tree; clones share state
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `root`; anything but an object yields an empty tree
    #[must_use]
    pub fn with_root(root: Value) -> Self {
        let root = match root {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            inner: Arc::new(Mutex::new(Inner {
                root,
                ..Inner::default()
            })),
        }
    }

    /// Current value at `path`
    #[must_use]
    pub fn get(&self, path: &StorePath) -> Option<Value> {
        lookup(&self.inner.lock().root, path).cloned()
    }

    /// Whole tree
    #[must_use]
    pub fn root(&self) -> Value {
        Value::Object(self.inner.lock().root.clone())
    }

    /// Make every subsequent write fail with [`StoreError::Unavailable`], or
    /// clear that state with `None`
    pub fn set_offline(&self, reason: Option<&str>) {
        self.inner.lock().offline = reason.map(str::to_string);
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|(_, tx)| !tx.is_closed());
        inner.subscribers.len()
    }

    fn write(&self, path: &StorePath, value: Option<Value>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some(reason) = &inner.offline {
            return Err(StoreError::Unavailable(reason.clone()));
        }

        match value.filter(|v| !v.is_null()) {
            Some(value) => insert(&mut inner.root, path, value),
            None => remove(&mut inner.root, path),
        }

        let Inner {
            root, subscribers, ..
        } = &mut *inner;
        subscribers.retain(|(watched, tx)| {
            if !(watched.is_ancestor_of(path) || path.is_ancestor_of(watched)) {
                return !tx.is_closed();
            }
            let snapshot = Snapshot::new(lookup(root, watched).cloned());
            tx.unbounded_send(Ok(snapshot)).is_ok()
        });
        tracing::trace!(%path, subscribers = subscribers.len(), "memory store write applied");
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn subscribe(&self, path: &StorePath) -> SnapshotStream {
        let (tx, rx) = mpsc::unbounded();
        let mut inner = self.inner.lock();
        let current = Snapshot::new(lookup(&inner.root, path).cloned());
        // Receiver is alive, the first send cannot fail
        let _ = tx.unbounded_send(Ok(current));
        inner.subscribers.push((path.clone(), tx));
        tracing::debug!(%path, "memory store subscription opened");
        rx.boxed()
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        self.write(path, Some(value))
    }

    async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        self.write(path, None)
    }
}

fn lookup<'a>(root: &'a Map<String, Value>, path: &StorePath) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    rest.iter()
        .try_fold(root.get(first)?, |node, segment| node.as_object()?.get(segment))
}

fn insert(root: &mut Map<String, Value>, path: &StorePath, value: Value) {
    let Some((last, parents)) = path.segments().split_last() else {
        return;
    };
    let mut node = root;
    for segment in parents {
        let entry = node
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(map) = entry else {
            return;
        };
        node = map;
    }
    node.insert(last.clone(), value);
}

/// Remove the value at `path` and prune parents left empty
fn remove(root: &mut Map<String, Value>, path: &StorePath) {
    fn walk(node: &mut Map<String, Value>, segments: &[String]) {
        let Some((first, rest)) = segments.split_first() else {
            return;
        };
        if rest.is_empty() {
            node.remove(first);
            return;
        }
        if let Some(Value::Object(child)) = node.get_mut(first) {
            walk(child, rest);
            if child.is_empty() {
                node.remove(first);
            }
        }
    }
    walk(root, path.segments());
}
