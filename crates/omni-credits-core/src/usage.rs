//! Usage log types for omni-credits.
//!
//! A usage log records one metered operation for audit and analytics. It is
//! stored separately from the financial transaction record; the
//! caller-supplied event ID also serves as the duplicate-charge guard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ToolKind, UserId};

/// An audit record of one metered operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLog {
    /// Unique event ID, supplied by the calling service, for idempotency.
    pub event_id: String,

    /// The user being charged.
    pub user_id: UserId,

    /// Which tool was used.
    pub tool: ToolKind,

    /// Measured work quantity in the tool's unit (words, seconds, pages...).
    pub quantity: f64,

    /// Input size in bytes.
    pub input_size: u64,

    /// Output size in bytes.
    pub output_size: u64,

    /// Credits charged for this operation.
    pub credits_charged: i64,

    /// Additional context (source language, model, request id, etc.).
    pub metadata: serde_json::Value,

    /// When the usage occurred.
    pub created_at: DateTime<Utc>,
}

impl UsageLog {
    /// Create a new usage log entry timestamped now.
    #[must_use]
    pub fn new(
        event_id: String,
        user_id: UserId,
        tool: ToolKind,
        quantity: f64,
        credits_charged: i64,
    ) -> Self {
        Self {
            event_id,
            user_id,
            tool,
            quantity,
            input_size: 0,
            output_size: 0,
            credits_charged,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Set the input/output sizes.
    #[must_use]
    pub fn with_sizes(mut self, input_size: u64, output_size: u64) -> Self {
        self.input_size = input_size;
        self.output_size = output_size;
        self
    }

    /// Set metadata on the log entry.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
