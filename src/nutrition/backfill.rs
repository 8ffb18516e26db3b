// ABOUTME: Fire-and-forget cache backfill over a bounded channel
// ABOUTME: Resolvers enqueue entries without waiting; a spawned worker appends them to the store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Cache Backfill
//!
//! Every successful database or generative lookup is written back to the
//! nutrition cache so the next request for that food is a cache hit. The write
//! must never slow down or fail an analysis, so resolvers hand entries to a
//! bounded queue with `try_send` and a background worker owns the writes.
//! A full queue drops the entry with a warning.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::NutritionCacheStore;
use crate::models::NutritionCacheEntry;

/// Producer side of the backfill channel
#[derive(Debug, Clone)]
pub struct BackfillQueue {
    sender: mpsc::Sender<NutritionCacheEntry>,
}

impl BackfillQueue {
    /// Offer an entry to the worker without waiting
    ///
    /// Returns `false` when the entry was dropped because the queue is full
    /// or the worker has stopped.
    pub fn enqueue(&self, entry: NutritionCacheEntry) -> bool {
        match self.sender.try_send(entry) {
            Ok(()) => true,
            Err(TrySendError::Full(entry)) => {
                warn!(
                    food = %entry.food_name,
                    "Backfill queue full, dropping cache entry"
                );
                false
            }
            Err(TrySendError::Closed(entry)) => {
                warn!(
                    food = %entry.food_name,
                    "Backfill worker stopped, dropping cache entry"
                );
                false
            }
        }
    }

    /// Free slots left in the queue
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        self.sender.capacity()
    }
}

/// Totals reported when a worker drains and exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillStats {
    /// Entries appended to the store
    pub written: usize,
    /// Entries the store rejected
    pub failed: usize,
}

/// Consumer side of the backfill channel
pub struct BackfillWorker {
    receiver: mpsc::Receiver<NutritionCacheEntry>,
    store: Arc<dyn NutritionCacheStore>,
}

/// Create a connected queue and worker
///
/// A capacity of zero is raised to one.
#[must_use]
pub fn backfill_channel(
    capacity: usize,
    store: Arc<dyn NutritionCacheStore>,
) -> (BackfillQueue, BackfillWorker) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (BackfillQueue { sender }, BackfillWorker { receiver, store })
}

impl BackfillWorker {
    /// Append entries until every queue handle has been dropped
    pub async fn run(mut self) -> BackfillStats {
        let mut stats = BackfillStats::default();
        while let Some(entry) = self.receiver.recv().await {
            let food = entry.food_name.clone();
            let source = entry.source;
            match self.store.append(entry).await {
                Ok(()) => {
                    stats.written += 1;
                    debug!(food = %food, source = ?source, "Backfilled nutrition cache");
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(food = %food, error = %e, "Nutrition cache backfill failed");
                }
            }
        }
        info!(
            written = stats.written,
            failed = stats.failed,
            "Backfill worker stopped"
        );
        stats
    }

    /// Run on the tokio runtime
    ///
    /// The task outlives any analysis that enqueued work; awaiting the handle
    /// after dropping every [`BackfillQueue`] waits for the queue to drain.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<BackfillStats> {
        tokio::spawn(self.run())
    }
}
