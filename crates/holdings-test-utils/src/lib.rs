//! Testing utilities for the holdings workspace
//!
//! Shared fixtures: seeded stores, marker builders, and a store wrapper that
//! records every write it is asked to perform.

#![allow(missing_docs)]

use async_trait::async_trait;
use holdings_model::{Holder, MarkerFields, Position};
use holdings_store::{MemoryStore, RemoteStore, SnapshotStream, StoreError, StorePath};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

pub fn fields(name: &str, latitude: f64, longitude: f64) -> MarkerFields {
    MarkerFields::at(Position::new(latitude, longitude)).with_name(name)
}

pub fn owned_fields(name: &str, latitude: f64, longitude: f64, holder: &str) -> MarkerFields {
    fields(name, latitude, longitude).with_holder(holder)
}

/// Builder for the initial remote tree
#[derive(Debug, Default, Clone)]
pub struct Seed {
    holders: Map<String, Value>,
    holdings: Map<String, Value>,
}

impl Seed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(mut self, key: &str, name: &str, color: &str) -> Self {
        let record = Holder::new(name, color).to_record().unwrap();
        self.holders.insert(key.to_string(), record);
        self
    }

    pub fn marker(mut self, key: &str, fields: &MarkerFields) -> Self {
        self.holdings.insert(key.to_string(), fields.to_record().unwrap());
        self
    }

    pub fn raw_marker(mut self, key: &str, value: Value) -> Self {
        self.holdings.insert(key.to_string(), value);
        self
    }

    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        if !self.holders.is_empty() {
            root.insert("holders".to_string(), Value::Object(self.holders.clone()));
        }
        if !self.holdings.is_empty() {
            root.insert("holdings".to_string(), Value::Object(self.holdings.clone()));
        }
        Value::Object(root)
    }

    pub fn into_store(self) -> MemoryStore {
        MemoryStore::with_root(self.to_json())
    }
}

pub fn acme_seed() -> Seed {
    Seed::new()
        .holder("h1", "Acme", "#ff0000")
        .holder("h2", "Globex", "#00ff00")
}

/// One call made against a [`RecordingStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Set { path: String, value: Value },
    Remove { path: String },
}

/// Memory store that logs every write and remove before applying it
#[derive(Debug, Clone)]
pub struct RecordingStore {
    inner: MemoryStore,
    ops: Arc<Mutex<Vec<StoreOp>>>,
}

impl RecordingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ops: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().clone()
    }

    pub fn sets(&self) -> Vec<(String, Value)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                StoreOp::Set { path, value } => Some((path, value)),
                StoreOp::Remove { .. } => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.ops.lock().clear();
    }
}

#[async_trait]
impl RemoteStore for RecordingStore {
    fn subscribe(&self, path: &StorePath) -> SnapshotStream {
        self.inner.subscribe(path)
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        self.ops.lock().push(StoreOp::Set {
            path: path.to_string(),
            value: value.clone(),
        });
        self.inner.set(path, value).await
    }

    async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        self.ops.lock().push(StoreOp::Remove {
            path: path.to_string(),
        });
        self.inner.remove(path).await
    }
}
