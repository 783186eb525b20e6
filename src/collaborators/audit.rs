//! In-process audit trail
//!
//! Bounded ring of audit entries, mirrored into `tracing` at a level derived
//! from each entry's severity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::AuditSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Registration,
    Metrics,
    Selection,
    Epoch,
    Slashing,
    GovernanceReview,
    Appeal,
    Rewards,
    Voting,
    Fraud,
    Configuration,
}

impl AuditCategory {
    pub fn severity(&self) -> AuditSeverity {
        match self {
            AuditCategory::Registration
            | AuditCategory::Metrics
            | AuditCategory::Selection
            | AuditCategory::Epoch
            | AuditCategory::Appeal
            | AuditCategory::Rewards
            | AuditCategory::Voting => AuditSeverity::Info,
            AuditCategory::Configuration | AuditCategory::Slashing => AuditSeverity::Warning,
            AuditCategory::GovernanceReview => AuditSeverity::Error,
            AuditCategory::Fraud => AuditSeverity::Critical,
        }
    }
}

/// Severity levels for audit events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuditSeverity {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub category: AuditCategory,
    pub severity: AuditSeverity,
    pub message: String,
    pub amount: u64,
    pub subject: String,
}

impl AuditEntry {
    pub fn new(category: AuditCategory, message: &str, amount: u64, subject: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            category,
            severity: category.severity(),
            message: message.to_string(),
            amount,
            subject: subject.to_string(),
        }
    }
}

/// Audit logger for engine state transitions
#[derive(Clone)]
pub struct AuditLog {
    entries: Arc<RwLock<VecDeque<AuditEntry>>>,
    max_entries: usize,
    min_severity: AuditSeverity,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl AuditLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            max_entries,
            min_severity: AuditSeverity::Debug,
        }
    }

    pub fn with_min_severity(mut self, severity: AuditSeverity) -> Self {
        self.min_severity = severity;
        self
    }

    pub async fn log(&self, entry: AuditEntry) {
        if entry.severity < self.min_severity {
            return;
        }

        match entry.severity {
            AuditSeverity::Debug => tracing::debug!(subject = %entry.subject, amount = entry.amount, "AUDIT {:?}: {}", entry.category, entry.message),
            AuditSeverity::Info => tracing::info!(subject = %entry.subject, amount = entry.amount, "AUDIT {:?}: {}", entry.category, entry.message),
            AuditSeverity::Warning => tracing::warn!(subject = %entry.subject, amount = entry.amount, "AUDIT {:?}: {}", entry.category, entry.message),
            AuditSeverity::Error => tracing::error!(subject = %entry.subject, amount = entry.amount, "AUDIT {:?}: {}", entry.category, entry.message),
            AuditSeverity::Critical => tracing::error!(subject = %entry.subject, amount = entry.amount, "AUDIT CRITICAL {:?}: {}", entry.category, entry.message),
        }

        let mut entries = self.entries.write().await;
        entries.push_back(entry);

        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    /// Most recent entries first
    pub async fn get_recent(&self, count: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(count).cloned().collect()
    }

    pub async fn get_by_category(&self, category: AuditCategory) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect()
    }

    pub async fn get_for_subject(&self, subject: &str) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.subject == subject)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for AuditLog {
    async fn record(&self, category: AuditCategory, message: &str, amount: u64, subject: &str) {
        self.log(AuditEntry::new(category, message, amount, subject))
            .await;
    }
}
