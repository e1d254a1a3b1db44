//! Stripe API client.
//!
//! Form-encoded calls against the two endpoints this service needs
//! (customers, checkout sessions) plus webhook signature verification.
//! Nothing here touches the ledger; the webhook handler owns that.

use std::time::Duration;

use reqwest::Client;

use omni_credits_core::CreditPackage;

use super::types::{CheckoutSession, Customer, StripeErrorResponse};
use crate::crypto::SignatureHeader;

const STRIPE_API: &str = "https://api.stripe.com/v1";

/// Errors from talking to Stripe or verifying its webhooks.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// The HTTP request itself failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe rejected the call.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Coarse category from Stripe.
        error_type: String,
        /// Stripe's message.
        message: String,
        /// Machine-readable code, when present.
        code: Option<String>,
    },

    /// No candidate signature in the webhook header verified.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// The client is missing required configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    webhook_secret: Option<String>,
}

impl StripeClient {
    /// Build a client from the secret API key and, when webhook deliveries
    /// should be verified, the signing secret (`whsec_...`).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed.
    pub fn new(api_key: impl Into<String>, webhook_secret: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            webhook_secret,
        }
    }

    /// Create a Stripe customer carrying our user id as metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_customer(
        &self,
        user_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Customer, StripeError> {
        let mut form = vec![("metadata[user_id]", user_id.to_string())];
        if let Some(email) = email {
            form.push(("email", email.to_string()));
        }
        if let Some(name) = name {
            form.push(("name", name.to_string()));
        }

        self.post_form("/customers", &form).await
    }

    /// Open a Checkout session for one credit package.
    ///
    /// The session metadata carries `{user_id, credits, package_id}`; the
    /// completion webhook reads exactly these fields back to attribute the
    /// purchase, so their names are part of the wire contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_checkout_session(
        &self,
        customer_id: Option<&str>,
        user_id: &str,
        package: &CreditPackage,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let product_name = format!("{} credit package", package.name);
        let product_description = format!("{} Omnitool credits", package.credits);

        let mut form = vec![
            ("mode", "payment".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
            ("client_reference_id", user_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "line_items[0][price_data][currency]",
                package.currency.to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                package.price_cents.to_string(),
            ),
            ("line_items[0][price_data][product_data][name]", product_name),
            (
                "line_items[0][price_data][product_data][description]",
                product_description,
            ),
            ("metadata[user_id]", user_id.to_string()),
            ("metadata[credits]", package.credits.to_string()),
            ("metadata[package_id]", package.id.to_string()),
        ];
        if let Some(customer_id) = customer_id {
            form.push(("customer", customer_id.to_string()));
        }

        tracing::debug!(
            user_id = %user_id,
            package_id = %package.id,
            amount_cents = %package.price_cents,
            "Creating Stripe checkout session"
        );

        self.post_form("/checkout/sessions", &form).await
    }

    /// Verify a `stripe-signature` header against the raw request body.
    ///
    /// # Errors
    ///
    /// `StripeError::InvalidSignature` when the header is malformed or no
    /// candidate signature matches; `StripeError::Configuration` when called
    /// without a webhook secret.
    pub fn verify_webhook_signature(
        &self,
        payload: &str,
        signature: &str,
    ) -> Result<(), StripeError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or_else(|| StripeError::Configuration("Webhook secret not configured".into()))?;

        let header: SignatureHeader = signature
            .parse()
            .map_err(|_| StripeError::InvalidSignature)?;

        if header.matches(secret, payload) {
            Ok(())
        } else {
            Err(StripeError::InvalidSignature)
        }
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, StripeError> {
        let response = self
            .client
            .post(format!("{STRIPE_API}{path}"))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        match response.json::<StripeErrorResponse>().await {
            Ok(body) => Err(StripeError::Api {
                error_type: body.error.error_type,
                message: body.error.message,
                code: body.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}
