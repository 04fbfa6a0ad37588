//! Per-account runner.
//!
//! Logs in once on construction, then lists, deduplicates against current
//! holdings, filters by policy and invests the fixed amount in each
//! candidate in listing order.

use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use crate::config::Setting;
use crate::lenders::LenderService;
use crate::policy::filter_candidates;
use crate::types::{InvestError, LendError, Product, RunReport, Session};

pub struct Runner<'a> {
    setting: &'a Setting,
    service: &'a dyn LenderService,
    session: Session,
}

impl<'a> Runner<'a> {
    /// Log in with the setting's credentials. Failure aborts this account.
    pub async fn new(
        setting: &'a Setting,
        service: &'a dyn LenderService,
    ) -> Result<Runner<'a>, LendError> {
        let password = setting.password.as_ref().ok_or_else(|| {
            LendError::Auth(format!("no password configured for {}", setting.username))
        })?;
        let session = service
            .login(&setting.username, password.expose_secret())
            .await?;

        info!(
            company = %service.company(),
            username = %setting.username,
            "Logged in"
        );

        Ok(Self {
            setting,
            service,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Open products whose normalised title is not already held, unless
    /// the lender allows re-investing in that title.
    pub async fn list_products(&self) -> Result<Vec<Product>, LendError> {
        let invested = self
            .service
            .list_invested_product_titles(&self.session)
            .await?;
        let products = self.service.list_products().await?;
        let listed = products.len();

        let fresh: Vec<Product> = products
            .into_iter()
            .filter(|p| {
                !invested.contains(&self.service.normalize_title(&p.title))
                    || self.service.allows_reinvestment(&p.title)
            })
            .collect();

        debug!(
            listed = listed,
            held = invested.len(),
            fresh = fresh.len(),
            "Products deduplicated against holdings"
        );
        Ok(fresh)
    }

    /// Fresh products that also match the setting's policy.
    pub async fn candidates(&self) -> Result<Vec<Product>, LendError> {
        let products = self.list_products().await?;
        Ok(filter_candidates(products, self.setting))
    }

    /// Invest `setting.amount` in each candidate in order.
    ///
    /// Duplicated and InsufficientCapacity skip the product;
    /// InsufficientBalance ends the loop; anything else is returned,
    /// wrapped in `Interrupted` once at least one order went through.
    pub async fn invest(&self, candidates: &[Product]) -> Result<RunReport, LendError> {
        let amount = self.setting.amount;
        let mut report = RunReport::new(self.service.company(), &self.setting.username, false);
        report.candidates = candidates.len();

        for product in candidates {
            match self
                .service
                .check_and_invest(&self.session, &product.id, amount)
                .await
            {
                Ok(()) => {
                    report.invested += 1;
                    info!(product = %product, amount = amount, "Invested");
                }
                Err(LendError::Invest(InvestError::Duplicated)) => {
                    report.skipped_duplicated += 1;
                    debug!(product_id = %product.id, "Skipped: already invested");
                }
                Err(LendError::Invest(InvestError::InsufficientCapacity)) => {
                    report.skipped_capacity += 1;
                    debug!(product_id = %product.id, "Skipped: insufficient capacity");
                }
                Err(LendError::Invest(InvestError::InsufficientBalance)) => {
                    report.stopped_on_balance = true;
                    warn!(
                        product_id = %product.id,
                        amount = amount,
                        "Insufficient balance, stopping this account"
                    );
                    break;
                }
                Err(e) => {
                    let total_amount = report.invested as i64 * amount;
                    error!(
                        product_id = %product.id,
                        invested = report.invested,
                        total_amount = total_amount,
                        error = %e,
                        "Invest loop aborted"
                    );
                    if report.invested == 0 {
                        return Err(e);
                    }
                    return Err(LendError::Interrupted {
                        invested: report.invested,
                        total_amount,
                        source: Box::new(e),
                    });
                }
            }
        }

        report.total_amount = report.invested as i64 * amount;
        Ok(report)
    }

    /// Full pass: candidates, then the invest loop (skipped in dry-run).
    pub async fn run(&self, dry_run: bool) -> Result<RunReport, LendError> {
        let candidates = self.candidates().await?;
        info!(
            company = %self.service.company(),
            username = %self.setting.username,
            candidates = candidates.len(),
            "Candidates selected"
        );

        if dry_run {
            for product in &candidates {
                info!(product = %product, amount = self.setting.amount, "[DRY RUN] Would invest");
            }
            let mut report =
                RunReport::new(self.service.company(), &self.setting.username, true);
            report.candidates = candidates.len();
            return Ok(report);
        }

        self.invest(&candidates).await
    }
}
