//! Pricing configuration for omni-credits.
//!
//! This module defines per-tool credit rates and the quote calculation used
//! by both the pre-flight estimate and the final charge. The two must go
//! through the same `quote` call so a user is never charged a different
//! amount than previewed for the same measured quantity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ratio of the base cost added as a service fee.
pub const SERVICE_FEE_RATIO: f64 = 0.10;

/// A metered tool kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Text translation, metered per word.
    Translation,
    /// Audio transcription, metered per audio-second.
    Transcription,
    /// Image text recognition, metered per page.
    Ocr,
    /// Document conversion, metered per page.
    PdfConversion,
    /// Image generation, metered per image.
    ImageGeneration,
    /// Video generation, metered per video-second.
    VideoGeneration,
}

impl ToolKind {
    /// Stable snake_case name, used in API payloads and usage logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Transcription => "transcription",
            Self::Ocr => "ocr",
            Self::PdfConversion => "pdf_conversion",
            Self::ImageGeneration => "image_generation",
            Self::VideoGeneration => "video_generation",
        }
    }

    /// The unit the tool's quantity is measured in.
    #[must_use]
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Translation => "word",
            Self::Transcription => "audio_second",
            Self::Ocr | Self::PdfConversion => "page",
            Self::ImageGeneration => "image",
            Self::VideoGeneration => "video_second",
        }
    }
}

/// Linear rate for one tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToolRate {
    /// Credits per unit of quantity.
    pub credits_per_unit: f64,
    /// Units processed per second, for duration estimates.
    pub units_per_second: f64,
    /// Fixed startup overhead added to duration estimates, in seconds.
    pub overhead_seconds: u64,
}

/// A priced operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostQuote {
    /// Base cost before fees.
    pub base_credits: i64,
    /// Service fee on top of the base cost.
    pub service_fee_credits: i64,
    /// Total to charge.
    pub total_credits: i64,
}

/// Pricing configuration for all metered tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Rates by tool kind.
    pub rates: HashMap<ToolKind, ToolRate>,

    /// Fallback rate for a kind missing from the table.
    pub default_rate: ToolRate,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let mut rates = HashMap::new();

        rates.insert(
            ToolKind::Translation,
            ToolRate {
                credits_per_unit: 0.0001,
                units_per_second: 500.0,
                overhead_seconds: 2,
            },
        );
        rates.insert(
            ToolKind::Transcription,
            ToolRate {
                credits_per_unit: 0.01,
                units_per_second: 10.0,
                overhead_seconds: 5,
            },
        );
        rates.insert(
            ToolKind::Ocr,
            ToolRate {
                credits_per_unit: 0.5,
                units_per_second: 0.5,
                overhead_seconds: 2,
            },
        );
        rates.insert(
            ToolKind::PdfConversion,
            ToolRate {
                credits_per_unit: 0.2,
                units_per_second: 1.0,
                overhead_seconds: 2,
            },
        );
        rates.insert(
            ToolKind::ImageGeneration,
            ToolRate {
                credits_per_unit: 5.0,
                units_per_second: 0.1,
                overhead_seconds: 5,
            },
        );
        rates.insert(
            ToolKind::VideoGeneration,
            ToolRate {
                credits_per_unit: 2.0,
                units_per_second: 0.05,
                overhead_seconds: 15,
            },
        );

        Self {
            rates,
            default_rate: ToolRate {
                credits_per_unit: 1.0,
                units_per_second: 1.0,
                overhead_seconds: 2,
            },
        }
    }
}

impl PricingConfig {
    fn rate(&self, tool: ToolKind) -> &ToolRate {
        self.rates.get(&tool).unwrap_or(&self.default_rate)
    }

    /// Price a metered operation.
    ///
    /// `base = ceil(quantity * rate)`, fee is 10% of the base rounded half
    /// up, total is the sum. Non-positive quantities price to zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn quote(&self, tool: ToolKind, quantity: f64) -> CostQuote {
        if quantity <= 0.0 {
            return CostQuote {
                base_credits: 0,
                service_fee_credits: 0,
                total_credits: 0,
            };
        }

        let rate = self.rate(tool);
        let base_credits = (quantity * rate.credits_per_unit).ceil() as i64;
        let service_fee_credits = (base_credits as f64 * SERVICE_FEE_RATIO).round() as i64;

        CostQuote {
            base_credits,
            service_fee_credits,
            total_credits: base_credits + service_fee_credits,
        }
    }

    /// Rough wall-clock estimate for an operation, in seconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn estimate_seconds(&self, tool: ToolKind, quantity: f64) -> u64 {
        let rate = self.rate(tool);
        if quantity <= 0.0 {
            return rate.overhead_seconds;
        }
        rate.overhead_seconds + (quantity / rate.units_per_second).ceil() as u64
    }
}
