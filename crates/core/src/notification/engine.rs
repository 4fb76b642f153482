use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::cascade::{self, ReadOutcome};
use super::types::Notification;
use crate::model::{EventId, RawEvent};
use crate::pipeline::{self, PipelineOptions};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("notification not found: {0}")]
    NotFound(String),
}

/// How fresh poll results are reconciled with optimistic local reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadReconciliation {
    /// The latest poll result wins, even over a read not yet recorded upstream.
    #[default]
    ServerWins,
    /// Events marked read locally stay read until a poll confirms them.
    MergePending,
}

impl FromStr for ReadReconciliation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "server-wins" | "server_wins" | "" => Ok(ReadReconciliation::ServerWins),
            "merge-pending" | "merge_pending" => Ok(ReadReconciliation::MergePending),
            other => Err(format!("unknown read reconciliation: {other}")),
        }
    }
}

/// In-memory notification state between poll cycles.
///
/// The list is replaced wholesale on every ingest. The unread count is always
/// derived from the list.
#[derive(Debug, Default)]
pub struct NotificationEngine {
    notifications: Vec<Notification>,
    options: PipelineOptions,
    reconciliation: ReadReconciliation,
    pending_reads: HashSet<EventId>,
    last_refreshed: Option<DateTime<Utc>>,
}

impl NotificationEngine {
    pub fn new(options: PipelineOptions, reconciliation: ReadReconciliation) -> Self {
        Self {
            options,
            reconciliation,
            ..Default::default()
        }
    }

    /// Run the pipeline over a fresh feed snapshot and replace the output.
    /// Returns the number of notifications produced.
    pub fn ingest(&mut self, mut raw: Vec<RawEvent>) -> usize {
        if self.reconciliation == ReadReconciliation::MergePending {
            self.merge_pending(&mut raw);
        }
        let notifications = pipeline::run(raw, &self.options);
        self.replace(notifications);
        self.notifications.len()
    }

    fn merge_pending(&mut self, raw: &mut [RawEvent]) {
        // Events gone from the feed can never confirm their read.
        let present: HashSet<&EventId> = raw.iter().map(|event| &event.id).collect();
        self.pending_reads.retain(|id| present.contains(id));

        for event in raw.iter_mut() {
            if !self.pending_reads.contains(&event.id) {
                continue;
            }
            if event.read {
                self.pending_reads.remove(&event.id);
            } else {
                event.read = true;
            }
        }
    }

    pub fn replace(&mut self, notifications: Vec<Notification>) {
        self.notifications = notifications;
        self.last_refreshed = Some(Utc::now());
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        cascade::unread_count(&self.notifications)
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id() == id)
    }

    /// Notification with backfilled change times.
    pub fn details(&self, id: &str) -> Result<Notification, EngineError> {
        self.get(id)
            .map(pipeline::backfill)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    /// Mark a notification read locally and report the upstream requests it
    /// still needs.
    pub fn mark_read(&mut self, id: &str) -> Result<ReadOutcome, EngineError> {
        let notification = self
            .notifications
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;

        let pending_requests = cascade::mark_read(notification);
        if self.reconciliation == ReadReconciliation::MergePending {
            self.pending_reads.extend(pending_requests.iter().cloned());
        }

        Ok(ReadOutcome {
            pending_requests,
            unread_count: self.unread_count(),
        })
    }

    /// Stop holding optimistic reads whose upstream request failed, so the
    /// next poll decides their state.
    pub fn forget_pending(&mut self, ids: &[EventId]) {
        for id in ids {
            self.pending_reads.remove(id);
        }
    }

    pub fn pending_reads(&self) -> usize {
        self.pending_reads.len()
    }
}
