//! Peoplefund lender service.
//!
//! Product ids are composite (`<showcase uri>-<loan application id>`).
//! Holdings titles carry a `-N` tranche suffix, and closed holdings
//! (sold, settled, repaid) no longer count as invested.

pub mod api;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info};

use self::api::{ListProductResponse, PeoplefundApi};
use super::{Eligibility, LenderService, TitleNormalizer};
use crate::types::{Category, Company, LendError, Product, Session};

const OPEN_STATUS: &str = "투자모집중";
const SUCCESS_STATUS: &str = "success";
const CLOSED_STATUSES: &[&str] = &["매각완료", "채권종결", "상환완료"];

static TITLE_SUFFIX: LazyLock<TitleNormalizer> = LazyLock::new(|| {
    TitleNormalizer::new(r"(?:-\d+)*$").expect("valid Peoplefund title pattern")
});

pub struct PeoplefundService<A> {
    api: A,
}

impl<A: PeoplefundApi> PeoplefundService<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

fn ensure_success(status: &str, message: &str) -> Result<(), LendError> {
    if status != SUCCESS_STATUS {
        return Err(LendError::UnrecognizedCode {
            code: status.to_string(),
            message: message.to_string(),
        });
    }
    Ok(())
}

fn convert_to_products(res: ListProductResponse) -> Vec<Product> {
    res.data
        .list
        .into_iter()
        .map(|p| Product {
            id: format!("{}-{}", p.uri, p.loan_application_id),
            company: Company::Peoplefund,
            title: p.loan_title,
            rate: p.interest_rate,
            period: p.loan_application_term,
            remain_amount: p.remain_amount,
            category: convert_category(&p.loan_type),
        })
        .collect()
}

pub fn convert_category(loan_type: &str) -> Category {
    match loan_type {
        "아파트담보" => Category::MortgageRealEstate,
        _ => Category::Unknown,
    }
}

/// Split `<uri>-<loanId>` on the last dash.
fn parse_product_id(product_id: &str) -> Result<(&str, i64), LendError> {
    product_id
        .rsplit_once('-')
        .and_then(|(uri, loan_id)| Some((uri, loan_id.parse::<i64>().ok()?)))
        .filter(|(uri, _)| !uri.is_empty())
        .ok_or_else(|| LendError::Decode(format!("invalid Peoplefund product id: {product_id}")))
}

#[async_trait]
impl<A: PeoplefundApi> LenderService for PeoplefundService<A> {
    fn company(&self) -> Company {
        Company::Peoplefund
    }

    async fn list_products(&self) -> Result<Vec<Product>, LendError> {
        let resp = self.api.list_products(OPEN_STATUS).await?;
        ensure_success(&resp.status, &resp.message)?;
        let products = convert_to_products(resp);
        debug!(count = products.len(), "Peoplefund products listed");
        Ok(products)
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, LendError> {
        let session_id = self.api.login(username, password).await?;
        Ok(Session::new(session_id))
    }

    async fn list_invested_product_titles(
        &self,
        session: &Session,
    ) -> Result<HashSet<String>, LendError> {
        let resp = self.api.list_invested_products(session.token()).await?;
        ensure_success(&resp.status, &resp.message)?;

        let titles: HashSet<String> = resp
            .data
            .list
            .iter()
            .filter(|h| !CLOSED_STATUSES.contains(&h.loan_application_status.as_str()))
            .map(|h| self.normalize_title(&h.title))
            .collect();

        debug!(titles = titles.len(), "Peoplefund holdings listed");
        Ok(titles)
    }

    async fn check_and_invest(
        &self,
        session: &Session,
        product_id: &str,
        amount: i64,
    ) -> Result<(), LendError> {
        let (uri, loan_id) = parse_product_id(product_id)?;

        let info = self.api.check_investment(session.token(), loan_id).await?;
        ensure_success(&info.status, &info.message)?;
        Eligibility {
            invested_amount: 0,
            balance: Some(info.data.cash),
            max_investable: Some(info.data.max_investable_amount),
        }
        .evaluate(amount)?;

        self.api
            .invest(session.token(), uri, loan_id, amount, 0)
            .await?;

        info!(product_id = %product_id, amount = amount, "Peoplefund investment submitted");
        Ok(())
    }

    fn normalize_title(&self, title: &str) -> String {
        TITLE_SUFFIX.normalize(title)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
