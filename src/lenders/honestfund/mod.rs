//! Honestfund lender service.
//!
//! Products report progress as a percentage of the goal amount, so the
//! remaining amount is derived. Holdings are paginated; their titles carry
//! "N호" / "N차" installment suffixes. SCF (supply-chain finance) titles
//! roll over continuously and may be invested in again while held.

pub mod api;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info};

use self::api::{
    HonestfundApi, InvestRequest, ListInvestedProductsRequest, ListProductRequest,
    ListProductResponse,
};
use super::{Eligibility, LenderService, TitleNormalizer};
use crate::types::{Category, Company, LendError, Product, Session};

const LIST_PAGE_SIZE: u32 = 50;
const HOLDINGS_PAGE_SIZE: i64 = 25;
const SUCCESS_CODE: i64 = 200;
const REINVESTABLE_PREFIX: &str = "SCF";

static TITLE_SUFFIX: LazyLock<TitleNormalizer> = LazyLock::new(|| {
    TitleNormalizer::new(r"(?:\s+\d+(?:호|차))*$").expect("valid Honestfund title pattern")
});

pub struct HonestfundService<A> {
    api: A,
}

impl<A: HonestfundApi> HonestfundService<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

fn ensure_success(code: i64) -> Result<(), LendError> {
    if code != SUCCESS_CODE {
        return Err(LendError::UnrecognizedCode {
            code: code.to_string(),
            message: "Honestfund response code".to_string(),
        });
    }
    Ok(())
}

fn convert_to_products(res: ListProductResponse) -> Vec<Product> {
    res.data
        .products
        .into_iter()
        .map(|p| Product {
            id: p.uid.to_string(),
            company: Company::Honestfund,
            title: p.title_without_seq,
            rate: p.rate,
            period: p.period,
            remain_amount: remain_amount(p.goal_amount, p.progress_percentage),
            category: convert_category(p.category),
        })
        .collect()
}

/// `goal * (1 - progress/100)`, truncated, never negative.
fn remain_amount(goal_amount: i64, progress_percentage: Decimal) -> i64 {
    let remaining = Decimal::from(goal_amount) * (Decimal::ONE_HUNDRED - progress_percentage)
        / Decimal::ONE_HUNDRED;
    remaining.trunc().to_i64().unwrap_or(0).max(0)
}

pub fn convert_category(code: i64) -> Category {
    match code {
        1 => Category::PF,
        2 => Category::MortgageRealEstate,
        3 => Category::CorporateCredit,
        4 => Category::PersonalCredit,
        _ => Category::Unknown,
    }
}

#[async_trait]
impl<A: HonestfundApi> LenderService for HonestfundService<A> {
    fn company(&self) -> Company {
        Company::Honestfund
    }

    async fn list_products(&self) -> Result<Vec<Product>, LendError> {
        let resp = self
            .api
            .list_products(&ListProductRequest::open(LIST_PAGE_SIZE))
            .await?;
        ensure_success(resp.code)?;
        let products = convert_to_products(resp);
        debug!(count = products.len(), "Honestfund products listed");
        Ok(products)
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, LendError> {
        let token = self.api.login(username, password).await?;
        Ok(Session::new(token))
    }

    async fn list_invested_product_titles(
        &self,
        session: &Session,
    ) -> Result<HashSet<String>, LendError> {
        let mut titles = HashSet::new();
        let mut page_index = 0;

        loop {
            let resp = self
                .api
                .list_invested_products(
                    session.token(),
                    &ListInvestedProductsRequest::page(page_index, HOLDINGS_PAGE_SIZE),
                )
                .await?;
            ensure_success(resp.code)?;

            for investment in &resp.data.investments {
                titles.insert(self.normalize_title(&investment.title));
            }

            page_index += 1;
            if page_index * HOLDINGS_PAGE_SIZE >= resp.data.total_investments_count {
                break;
            }
        }

        debug!(pages = page_index, titles = titles.len(), "Honestfund holdings listed");
        Ok(titles)
    }

    async fn check_and_invest(
        &self,
        session: &Session,
        product_id: &str,
        amount: i64,
    ) -> Result<(), LendError> {
        let product_uid: i64 = product_id
            .parse()
            .map_err(|_| LendError::Decode(format!("invalid Honestfund product id: {product_id}")))?;

        let preload = self
            .api
            .check_eligibility(session.token(), product_uid, amount)
            .await?;
        Eligibility {
            invested_amount: preload.invest.invested_amount.unwrap_or(0),
            balance: None,
            max_investable: None,
        }
        .evaluate(amount)?;

        self.api
            .invest(
                session.token(),
                &InvestRequest {
                    product_uid,
                    invest_amount: amount,
                },
            )
            .await?;

        info!(product_id = %product_id, amount = amount, "Honestfund investment submitted");
        Ok(())
    }

    fn normalize_title(&self, title: &str) -> String {
        TITLE_SUFFIX.normalize(title)
    }

    fn allows_reinvestment(&self, title: &str) -> bool {
        title.trim_start().starts_with(REINVESTABLE_PREFIX)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
