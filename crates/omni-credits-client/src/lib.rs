//! Omni-Credits Client SDK.
//!
//! This crate provides a client library for tool backends to interact with
//! the omni-credits API: check a user's balance before an operation, charge
//! the measured usage after it completes.
//!
//! # Example
//!
//! ```no_run
//! use omni_credits_client::{ChargeRequest, CreditsClient, tools};
//!
//! # async fn example() -> Result<(), omni_credits_client::ClientError> {
//! let client = CreditsClient::new(
//!     "http://omni-credits.billing.svc:8080",
//!     "your-service-api-key",
//! );
//!
//! // Gate: can the user afford roughly this much?
//! let check = client.check_credits("user-uuid", 17).await?;
//! if !check.sufficient {
//!     return Ok(());
//! }
//!
//! // ... run the AI operation, then charge the measured quantity
//! let response = client.charge_usage(ChargeRequest {
//!     event_id: "evt_123".to_string(),
//!     user_id: "user-uuid".to_string(),
//!     tool: tools::TRANSCRIPTION.to_string(),
//!     quantity: 1500.0,
//!     input_size: 1_048_576,
//!     output_size: 8_192,
//!     metadata: None,
//! }).await?;
//!
//! println!("New balance: {} credits", response.balance_credits);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, CreditsClient};
pub use error::ClientError;
pub use types::*;
