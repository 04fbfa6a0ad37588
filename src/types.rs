//! Shared types for the AUTOLEND pipeline.
//!
//! These types form the data model used across all modules: lender
//! services produce `Product`s, the policy matcher consumes them, and the
//! runner reports a `RunReport` per account.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lending marketplace an account and its products belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Company {
    Honestfund,
    Peoplefund,
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Company::Honestfund => write!(f, "Honestfund"),
            Company::Peoplefund => write!(f, "Peoplefund"),
        }
    }
}

/// Case-insensitive parse, used by the `--company` CLI filter.
impl std::str::FromStr for Company {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "honestfund" => Ok(Company::Honestfund),
            "peoplefund" => Ok(Company::Peoplefund),
            _ => Err(anyhow::anyhow!("Unknown company: {s}")),
        }
    }
}

/// Loan category in the common model.
///
/// Lender-specific codes are mapped by each lender module; anything
/// unrecognised lands in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    MortgageRealEstate,
    CorporateCredit,
    PersonalCredit,
    #[serde(alias = "ProjectFinance")]
    PF,
    #[serde(alias = "UNKNOWN")]
    Unknown,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::MortgageRealEstate => write!(f, "MortgageRealEstate"),
            Category::CorporateCredit => write!(f, "CorporateCredit"),
            Category::PersonalCredit => write!(f, "PersonalCredit"),
            Category::PF => write!(f, "PF"),
            Category::Unknown => write!(f, "Unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A fundable loan listing normalised to the common model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Opaque per-lender identifier. May be composite (e.g. `uri-loanId`).
    pub id: String,
    pub company: Company,
    pub title: String,
    /// Annual interest rate in percent.
    pub rate: Decimal,
    /// Duration in months.
    pub period: u32,
    /// Remaining fundable amount in minor currency units.
    pub remain_amount: i64,
    pub category: Category,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}% | {}m | remain {} | {})",
            self.company, self.title, self.rate, self.period, self.remain_amount, self.category,
        )
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Authenticated session token for one account, obtained once per run.
pub struct Session {
    token: SecretString,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
        }
    }

    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session([REDACTED])")
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Outcome of one account's list → filter → invest pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub company: Company,
    pub username: String,
    pub candidates: usize,
    pub invested: usize,
    pub total_amount: i64,
    pub skipped_duplicated: usize,
    pub skipped_capacity: usize,
    pub stopped_on_balance: bool,
    pub dry_run: bool,
}

impl RunReport {
    pub fn new(company: Company, username: &str, dry_run: bool) -> Self {
        Self {
            company,
            username: username.to_string(),
            candidates: 0,
            invested: 0,
            total_amount: 0,
            skipped_duplicated: 0,
            skipped_capacity: 0,
            stopped_on_balance: false,
            dry_run,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            return write!(
                f,
                "{} {} [dry run] {} candidates",
                self.company, self.username, self.candidates
            );
        }
        write!(
            f,
            "{} {} invested {} products, total amount {}",
            self.company, self.username, self.invested, self.total_amount
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Expected rejection of an investment attempt by the eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvestError {
    #[error("duplicated investment")]
    Duplicated,

    #[error("insufficient residual capacity")]
    InsufficientCapacity,

    #[error("insufficient balance")]
    InsufficientBalance,
}

/// Failures surfaced by gateways, adapters and services.
#[derive(Debug, thiserror::Error)]
pub enum LendError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unrecognized response code {code}: {message}")]
    UnrecognizedCode { code: String, message: String },

    #[error(transparent)]
    Invest(#[from] InvestError),

    /// A fatal error after some orders in the loop already went through.
    #[error("{source} (after {invested} orders, total amount {total_amount})")]
    Interrupted {
        invested: usize,
        total_amount: i64,
        source: Box<LendError>,
    },
}

impl From<serde_json::Error> for LendError {
    fn from(e: serde_json::Error) -> Self {
        LendError::Decode(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
