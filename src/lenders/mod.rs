//! Lender integrations.
//!
//! Defines the `LenderService` trait and provides implementations for:
//! - Honestfund: paginated holdings, HTML-embedded eligibility preload
//! - Peoplefund: composite product ids, cash/capacity eligibility check
//!
//! Each lender module owns an adapter (`api.rs`) with the raw wire shapes
//! and a service that normalises them into the common `Product` model.

pub mod honestfund;
pub mod peoplefund;

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;

use crate::config::LenderEndpoints;
use crate::gateway::HttpGateway;
use crate::types::{Company, InvestError, LendError, Product, Session};

/// Capability interface over P2P lending marketplaces.
#[async_trait]
pub trait LenderService: Send + Sync {
    fn company(&self) -> Company;

    /// Fetch the currently open products, normalised.
    async fn list_products(&self) -> Result<Vec<Product>, LendError>;

    /// Exchange credentials for a session token.
    async fn login(&self, username: &str, password: &str) -> Result<Session, LendError>;

    /// Normalised titles of the account's current holdings.
    async fn list_invested_product_titles(
        &self,
        session: &Session,
    ) -> Result<HashSet<String>, LendError>;

    /// Run the eligibility check and, if it passes, submit the order.
    ///
    /// Rejections come back as `LendError::Invest`.
    async fn check_and_invest(
        &self,
        session: &Session,
        product_id: &str,
        amount: i64,
    ) -> Result<(), LendError>;

    /// Dedup key for a title, using the lender's suffix pattern.
    fn normalize_title(&self, title: &str) -> String;

    /// Whether an already-held title may be invested in again.
    fn allows_reinvestment(&self, _title: &str) -> bool {
        false
    }
}

/// Build the service for `company`, wired to the shared gateway.
pub fn build_service(
    company: Company,
    gateway: HttpGateway,
    endpoints: &LenderEndpoints,
) -> Box<dyn LenderService> {
    match company {
        Company::Honestfund => Box::new(honestfund::HonestfundService::new(
            honestfund::api::HonestfundHttpApi::new(gateway, &endpoints.honestfund),
        )),
        Company::Peoplefund => Box::new(peoplefund::PeoplefundService::new(
            peoplefund::api::PeoplefundHttpApi::new(
                gateway,
                &endpoints.peoplefund,
                &endpoints.peoplefund_static,
            ),
        )),
    }
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// Structured result of a lender's pre-investment check.
///
/// `None` means the lender does not report that constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Eligibility {
    pub invested_amount: i64,
    pub balance: Option<i64>,
    pub max_investable: Option<i64>,
}

impl Eligibility {
    /// Apply the checks in order: duplicate, balance, capacity.
    pub fn evaluate(&self, amount: i64) -> Result<(), InvestError> {
        if self.invested_amount != 0 {
            return Err(InvestError::Duplicated);
        }
        if self.balance.is_some_and(|cash| cash < amount) {
            return Err(InvestError::InsufficientBalance);
        }
        if self.max_investable.is_some_and(|max| max < amount) {
            return Err(InvestError::InsufficientCapacity);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Title normalisation
// ---------------------------------------------------------------------------

/// Strips a lender's trailing installment/sequence suffix from titles.
pub struct TitleNormalizer {
    suffix: Regex,
}

impl TitleNormalizer {
    /// `suffix` must be anchored at `$`.
    pub fn new(suffix: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            suffix: Regex::new(suffix)?,
        })
    }

    pub fn normalize(&self, title: &str) -> String {
        self.suffix.replace(title.trim(), "").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicated_wins_over_everything() {
        let e = Eligibility {
            invested_amount: 400_000,
            balance: Some(0),
            max_investable: Some(0),
        };
        assert_eq!(e.evaluate(10_000), Err(InvestError::Duplicated));
    }

    #[test]
    fn test_balance_checked_before_capacity() {
        let e = Eligibility {
            invested_amount: 0,
            balance: Some(9_999),
            max_investable: Some(0),
        };
        assert_eq!(e.evaluate(10_000), Err(InvestError::InsufficientBalance));
    }

    #[test]
    fn test_capacity() {
        let e = Eligibility {
            invested_amount: 0,
            balance: Some(100_000),
            max_investable: Some(5_000),
        };
        assert_eq!(e.evaluate(10_000), Err(InvestError::InsufficientCapacity));
    }

    #[test]
    fn test_exact_amounts_pass() {
        let e = Eligibility {
            invested_amount: 0,
            balance: Some(10_000),
            max_investable: Some(10_000),
        };
        assert_eq!(e.evaluate(10_000), Ok(()));
    }

    #[test]
    fn test_unreported_constraints_pass() {
        assert_eq!(Eligibility::default().evaluate(10_000), Ok(()));
    }

    #[test]
    fn test_normalizer_without_suffix_trims() {
        let n = TitleNormalizer::new(r"(?:\s+\d+호)*$").unwrap();
        assert_eq!(n.normalize("  plain title "), "plain title");
    }
}
