//! Core engine: the sequential login → list → filter → invest pass
//! over every configured account.

pub mod runner;

use tracing::{error, info};

use crate::config::Setting;
use crate::lenders::LenderService;
use crate::types::{Company, LendError, RunReport};
use self::runner::Runner;

/// Result of one account's pass, successful or not.
#[derive(Debug)]
pub struct AccountOutcome {
    pub company: Company,
    pub username: String,
    pub result: Result<RunReport, LendError>,
}

/// Run a single account to completion.
pub async fn run_account(
    setting: &Setting,
    service: &dyn LenderService,
    dry_run: bool,
) -> Result<RunReport, LendError> {
    let runner = Runner::new(setting, service).await?;
    runner.run(dry_run).await
}

/// Run every account in order. A failed account is logged and does not
/// stop the ones after it.
pub async fn run_accounts<F>(
    settings: &[Setting],
    mut service_for: F,
    dry_run: bool,
) -> Vec<AccountOutcome>
where
    F: FnMut(Company) -> Box<dyn LenderService>,
{
    let mut outcomes = Vec::with_capacity(settings.len());

    for setting in settings {
        let service = service_for(setting.company);
        let result = run_account(setting, service.as_ref(), dry_run).await;

        match &result {
            Ok(report) => info!(
                company = %report.company,
                username = %report.username,
                invested = report.invested,
                total_amount = report.total_amount,
                "Account run complete"
            ),
            Err(e) => error!(
                company = %setting.company,
                username = %setting.username,
                error = %e,
                "Account run failed"
            ),
        }

        outcomes.push(AccountOutcome {
            company: setting.company,
            username: setting.username.clone(),
            result,
        });
    }

    outcomes
}
