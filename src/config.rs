//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Passwords may be written inline or referenced by env-var name
//! (`password_env`), in which case they are resolved at load time.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;

use crate::types::{Category, Company};

pub const HONESTFUND_BASE_URL: &str = "https://www.honestfund.kr";
pub const PEOPLEFUND_BASE_URL: &str = "https://www.peoplefund.co.kr";
pub const PEOPLEFUND_STATIC_URL: &str = "https://static.peoplefund.co.kr";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub endpoints: LenderEndpoints,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout. Absent means requests may block indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

fn default_user_agent() -> String {
    "AUTOLEND/0.1.0".to_string()
}

/// Base URLs per lender. Overridable for staging or local fakes.
#[derive(Debug, Deserialize, Clone)]
pub struct LenderEndpoints {
    #[serde(default = "default_honestfund")]
    pub honestfund: String,
    #[serde(default = "default_peoplefund")]
    pub peoplefund: String,
    #[serde(default = "default_peoplefund_static")]
    pub peoplefund_static: String,
}

impl Default for LenderEndpoints {
    fn default() -> Self {
        Self {
            honestfund: default_honestfund(),
            peoplefund: default_peoplefund(),
            peoplefund_static: default_peoplefund_static(),
        }
    }
}

fn default_honestfund() -> String {
    HONESTFUND_BASE_URL.to_string()
}

fn default_peoplefund() -> String {
    PEOPLEFUND_BASE_URL.to_string()
}

fn default_peoplefund_static() -> String {
    PEOPLEFUND_STATIC_URL.to_string()
}

/// Investment policy and credentials for one account.
#[derive(Deserialize, Clone)]
pub struct Setting {
    pub username: String,
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Name of the env var holding the password, used when `password` is absent.
    #[serde(default)]
    pub password_env: Option<String>,
    pub company: Company,
    /// Fixed bid per matching product.
    pub amount: i64,
    #[serde(alias = "periodMin")]
    pub period_min: u32,
    #[serde(alias = "periodMax")]
    pub period_max: u32,
    #[serde(alias = "rateMin")]
    pub rate_min: Decimal,
    #[serde(alias = "rateMax")]
    pub rate_max: Decimal,
    pub categories: HashSet<Category>,
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("username", &self.username)
            .field("company", &self.company)
            .field("amount", &self.amount)
            .field("period", &(self.period_min..=self.period_max))
            .field("rate", &(self.rate_min..=self.rate_max))
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, resolve secrets and validate.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to load config file: {path}"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: AppConfig =
            toml::from_str(contents).context("Failed to parse config TOML")?;
        for setting in &mut config.settings {
            setting.resolve_password()?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check every setting for internally consistent bounds.
    pub fn validate(&self) -> Result<()> {
        if self.settings.is_empty() {
            bail!("No settings configured");
        }
        for (i, s) in self.settings.iter().enumerate() {
            if s.username.trim().is_empty() {
                bail!("settings[{i}] ({}): username must not be blank", s.company);
            }
            if s.amount <= 0 {
                bail!("{} ({}): amount must be > 0, got {}", s.username, s.company, s.amount);
            }
            if s.period_min > s.period_max {
                bail!(
                    "{} ({}): period_min {} exceeds period_max {}",
                    s.username, s.company, s.period_min, s.period_max
                );
            }
            if s.rate_min > s.rate_max {
                bail!(
                    "{} ({}): rate_min {} exceeds rate_max {}",
                    s.username, s.company, s.rate_min, s.rate_max
                );
            }
            if s.password.as_ref().map_or(true, |p| p.expose_secret().is_empty()) {
                bail!("{} ({}): no password configured", s.username, s.company);
            }
        }
        Ok(())
    }

    /// Settings to run, optionally restricted to one lender. Selecting
    /// nothing is an error.
    pub fn select(&self, company: Option<Company>) -> Result<Vec<Setting>> {
        let selected: Vec<Setting> = self
            .settings
            .iter()
            .filter(|s| company.map_or(true, |c| s.company == c))
            .cloned()
            .collect();
        if selected.is_empty() {
            if let Some(c) = company {
                bail!("No settings configured for {c}");
            }
            bail!("No settings configured");
        }
        Ok(selected)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

impl Setting {
    fn resolve_password(&mut self) -> Result<()> {
        if self.password.is_some() {
            return Ok(());
        }
        if let Some(env_name) = &self.password_env {
            let value = AppConfig::resolve_env(env_name)?;
            self.password = Some(SecretString::new(value));
        }
        Ok(())
    }
}
