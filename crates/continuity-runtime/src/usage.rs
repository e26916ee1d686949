//! Reasoning-service usage accounting.
//!
//! A fresh [`UsageTracker`] is created for every pipeline run and shared by
//! the claim extractor and all chunk evaluations of that run.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::providers::TokenUsage;

/// Accumulated usage for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmUsage {
    /// Successful model calls
    pub llm_calls: u32,

    /// Model calls that failed or timed out
    pub failed_calls: u32,

    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,

    /// Model reported by the last successful call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl LlmUsage {
    /// Add token usage from a provider response.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total();
        self.llm_calls += 1;
        self.model = Some(model.to_string());
    }

    /// Total calls attempted, failed ones included.
    pub fn attempted_calls(&self) -> u32 {
        self.llm_calls + self.failed_calls
    }
}

/// Thread-safe usage tracker.
#[derive(Debug, Default)]
pub struct UsageTracker {
    usage: RwLock<LlmUsage>,
    failed_calls: AtomicU32,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful call.
    pub fn record(&self, usage: &TokenUsage, model: &str) {
        self.usage.write().add(usage, model);
    }

    /// Record a call that produced no usable response.
    pub fn record_failure(&self) {
        self.failed_calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Snapshot of the usage so far.
    pub fn snapshot(&self) -> LlmUsage {
        let mut usage = self.usage.read().clone();
        usage.failed_calls = self.failed_calls.load(Ordering::SeqCst);
        usage
    }
}
