//! Static credit package catalog.
//!
//! Packages are immutable configuration; the webhook attributes purchases
//! back to a package id for audit.

use serde::Serialize;

/// A purchasable credit package.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CreditPackage {
    /// Stable package id, carried through checkout metadata.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Credits granted on purchase.
    pub credits: i64,
    /// Price in minor currency units.
    pub price_cents: i64,
    /// ISO currency code.
    pub currency: &'static str,
    /// Highlighted in the UI.
    pub popular: bool,
}

/// The package catalog.
pub const CREDIT_PACKAGES: &[CreditPackage] = &[
    CreditPackage {
        id: "starter",
        name: "Starter",
        credits: 100,
        price_cents: 499,
        currency: "usd",
        popular: false,
    },
    CreditPackage {
        id: "standard",
        name: "Standard",
        credits: 500,
        price_cents: 1999,
        currency: "usd",
        popular: true,
    },
    CreditPackage {
        id: "pro",
        name: "Pro",
        credits: 1200,
        price_cents: 3999,
        currency: "usd",
        popular: false,
    },
    CreditPackage {
        id: "max",
        name: "Max",
        credits: 3000,
        price_cents: 8999,
        currency: "usd",
        popular: false,
    },
];

/// Look up a package by id.
#[must_use]
pub fn find_package(id: &str) -> Option<&'static CreditPackage> {
    CREDIT_PACKAGES.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_known_package() {
        let package = find_package("standard").unwrap();
        assert_eq!(package.credits, 500);
        assert!(package.popular);
    }

    #[test]
    fn unknown_package_is_none() {
        assert!(find_package("mega").is_none());
    }

    #[test]
    fn package_ids_are_unique() {
        for (i, a) in CREDIT_PACKAGES.iter().enumerate() {
            for b in &CREDIT_PACKAGES[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn exactly_one_popular_package() {
        let popular = CREDIT_PACKAGES.iter().filter(|p| p.popular).count();
        assert_eq!(popular, 1);
    }
}
