//! Request and response types for the omni-credits API.

use serde::{Deserialize, Serialize};

/// Tool kinds known to the pricing engine, as wire strings.
///
/// The server validates these; the client passes them through.
pub mod tools {
    /// Text translation, metered per word.
    pub const TRANSLATION: &str = "translation";
    /// Audio transcription, metered per audio-second.
    pub const TRANSCRIPTION: &str = "transcription";
    /// Image text recognition, metered per page.
    pub const OCR: &str = "ocr";
    /// Document conversion, metered per page.
    pub const PDF_CONVERSION: &str = "pdf_conversion";
    /// Image generation, metered per image.
    pub const IMAGE_GENERATION: &str = "image_generation";
    /// Video generation, metered per video-second.
    pub const VIDEO_GENERATION: &str = "video_generation";
}

/// Charge request for a completed metered operation.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    /// Unique event ID for idempotency.
    pub event_id: String,
    /// User ID being charged.
    pub user_id: String,
    /// Tool kind (see [`tools`]).
    pub tool: String,
    /// Final measured quantity in the tool's unit.
    pub quantity: f64,
    /// Input size in bytes.
    pub input_size: u64,
    /// Output size in bytes.
    pub output_size: u64,
    /// Additional metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Charge response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeResponse {
    /// Whether the charge was recorded.
    pub success: bool,
    /// Credits deducted.
    pub credits_used: i64,
    /// New balance after deduction.
    pub balance_credits: i64,
    /// Transaction ID.
    pub transaction_id: String,
}

/// Balance check request.
#[derive(Debug, Clone, Serialize)]
pub struct CheckCreditsRequest {
    /// User ID to check.
    pub user_id: String,
    /// Required amount in credits.
    pub required_credits: i64,
}

/// Balance check response.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckCreditsResponse {
    /// Whether the user has sufficient balance.
    pub sufficient: bool,
    /// Current balance.
    pub balance_credits: i64,
    /// Required amount.
    pub required_credits: i64,
}

/// Balance response for user-facing calls.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    /// Current balance in credits.
    pub balance_credits: i64,
}

/// API error envelope returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Stable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Structured details, when present.
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
