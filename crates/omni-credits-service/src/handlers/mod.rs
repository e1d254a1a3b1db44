//! API handlers.

pub mod accounts;
pub mod credits;
pub mod health;
pub mod promo;
pub mod referrals;
pub mod usage;
pub mod webhooks;
