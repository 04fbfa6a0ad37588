//! Mock lender for integration testing.
//!
//! Provides a deterministic `LenderService` implementation whose listing,
//! holdings and per-product investment outcomes are scripted by the test.
//! Every investment attempt is recorded in order.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use autolend::config::Setting;
use autolend::lenders::{LenderService, TitleNormalizer};
use autolend::types::*;

/// What `check_and_invest` does for a given product id.
#[derive(Debug, Clone)]
pub enum Scripted {
    Invest,
    Reject(InvestError),
    Fail(String),
}

pub struct MockLender {
    company: Company,
    products: Vec<Product>,
    held_titles: HashSet<String>,
    outcomes: HashMap<String, Scripted>,
    reinvestable_prefix: Option<&'static str>,
    login_error: Option<String>,
    normalizer: TitleNormalizer,
    attempts: Arc<Mutex<Vec<(String, i64)>>>,
}

impl MockLender {
    pub fn new(company: Company) -> Self {
        Self {
            company,
            products: Vec::new(),
            held_titles: HashSet::new(),
            outcomes: HashMap::new(),
            reinvestable_prefix: None,
            login_error: None,
            normalizer: TitleNormalizer::new(r"(?:\s+\d+(?:호|차))*$").unwrap(),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_held(mut self, titles: &[&str]) -> Self {
        self.held_titles = titles.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_outcome(mut self, product_id: &str, outcome: Scripted) -> Self {
        self.outcomes.insert(product_id.to_string(), outcome);
        self
    }

    pub fn with_reinvestable_prefix(mut self, prefix: &'static str) -> Self {
        self.reinvestable_prefix = Some(prefix);
        self
    }

    pub fn failing_login(mut self, msg: &str) -> Self {
        self.login_error = Some(msg.to_string());
        self
    }

    /// Shared handle to the recorded `(product_id, amount)` attempts.
    pub fn attempts(&self) -> Arc<Mutex<Vec<(String, i64)>>> {
        Arc::clone(&self.attempts)
    }
}

#[async_trait]
impl LenderService for MockLender {
    fn company(&self) -> Company {
        self.company
    }

    async fn list_products(&self) -> Result<Vec<Product>, LendError> {
        Ok(self.products.clone())
    }

    async fn login(&self, username: &str, _password: &str) -> Result<Session, LendError> {
        match &self.login_error {
            Some(msg) => Err(LendError::Auth(msg.clone())),
            None => Ok(Session::new(format!("TOKEN#{username}"))),
        }
    }

    async fn list_invested_product_titles(
        &self,
        _session: &Session,
    ) -> Result<HashSet<String>, LendError> {
        Ok(self.held_titles.clone())
    }

    async fn check_and_invest(
        &self,
        _session: &Session,
        product_id: &str,
        amount: i64,
    ) -> Result<(), LendError> {
        self.attempts
            .lock()
            .unwrap()
            .push((product_id.to_string(), amount));

        match self.outcomes.get(product_id).cloned().unwrap_or(Scripted::Invest) {
            Scripted::Invest => Ok(()),
            Scripted::Reject(e) => Err(LendError::Invest(e)),
            Scripted::Fail(code) => Err(LendError::UnrecognizedCode {
                code,
                message: "scripted failure".to_string(),
            }),
        }
    }

    fn normalize_title(&self, title: &str) -> String {
        self.normalizer.normalize(title)
    }

    fn allows_reinvestment(&self, title: &str) -> bool {
        self.reinvestable_prefix
            .is_some_and(|prefix| title.starts_with(prefix))
    }
}

/// A setting that accepts `product()` with a 10,000 bid.
pub fn setting(company: Company, username: &str) -> Setting {
    Setting {
        username: username.to_string(),
        password: Some(SecretString::new("1234password!@#$".to_string())),
        password_env: None,
        company,
        amount: 10_000,
        period_min: 0,
        period_max: 12,
        rate_min: dec!(0),
        rate_max: dec!(15),
        categories: [Category::PF, Category::CorporateCredit].into_iter().collect(),
    }
}

/// A product matching `setting()`.
pub fn product(id: &str, title: &str) -> Product {
    Product {
        id: id.to_string(),
        company: Company::Honestfund,
        title: title.to_string(),
        rate: dec!(8.5),
        period: 6,
        remain_amount: 1_000_000,
        category: Category::PF,
    }
}
