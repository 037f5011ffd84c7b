#![allow(dead_code)]

//! In-session batch retention.
//!
//! Computed batches are kept in memory so a failed export can be retried, or
//! the CSV downloaded, without re-running extraction. Bounded: once `capacity`
//! batches are held, the oldest is evicted. Nothing is persisted.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::candidate::CandidateRecord;

pub type BatchId = Uuid;

/// One summarized batch. Records are never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBatch {
    pub id: BatchId,
    pub created_at: DateTime<Utc>,
    pub job_description: Option<String>,
    pub records: Vec<CandidateRecord>,
}

impl StoredBatch {
    pub fn new(job_description: Option<String>, records: Vec<CandidateRecord>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            job_description,
            records,
        }
    }
}

#[derive(Default)]
struct Inner {
    batches: HashMap<BatchId, Arc<StoredBatch>>,
    order: VecDeque<BatchId>,
}

#[derive(Clone)]
pub struct BatchStore {
    inner: Arc<RwLock<Inner>>,
    capacity: usize,
}

impl BatchStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            capacity: capacity.max(1),
        }
    }

    /// Stores `batch`, evicting the oldest batches beyond capacity.
    pub async fn insert(&self, batch: StoredBatch) -> Arc<StoredBatch> {
        let batch = Arc::new(batch);
        let mut inner = self.inner.write().await;
        inner.order.push_back(batch.id);
        inner.batches.insert(batch.id, batch.clone());

        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.batches.remove(&evicted);
                debug!(batch_id = %evicted, "Evicted retained batch");
            }
        }
        batch
    }

    pub async fn get(&self, id: BatchId) -> Option<Arc<StoredBatch>> {
        self.inner.read().await.batches.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.batches.len()
    }
}
