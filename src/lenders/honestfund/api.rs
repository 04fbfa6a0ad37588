//! Honestfund wire adapter.
//!
//! Base URL: https://www.honestfund.kr
//! Auth: form login sets an `accessToken` cookie, sent back on every
//! authenticated request.
//! The invest-confirm page is HTML; its eligibility data is a JSON literal
//! passed to `app.constant('preload', ...)` in an inline script.

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::HeaderMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use crate::gateway::{find_cookie, session_cookie, HttpGateway};
use crate::types::LendError;

const TOKEN_COOKIE: &str = "accessToken";

static PRELOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"app\.constant\('preload',\s*").expect("valid preload pattern")
});

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductRequest {
    pub category: Vec<String>,
    pub page_size: u32,
    pub scroll: bool,
    pub state: Vec<i32>,
    pub tendency: Vec<String>,
    pub title_keyword: String,
}

impl ListProductRequest {
    /// Open products (state 2), first page.
    pub fn open(page_size: u32) -> Self {
        Self {
            category: Vec::new(),
            page_size,
            scroll: false,
            state: vec![2],
            tendency: Vec::new(),
            title_keyword: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListProductResponse {
    pub code: i64,
    pub data: ListProductData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListProductData {
    #[serde(default)]
    pub products: Vec<RawProduct>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    pub uid: i64,
    pub title_without_seq: String,
    pub rate: Decimal,
    pub period: u32,
    pub goal_amount: i64,
    /// 0–100.
    pub progress_percentage: Decimal,
    pub category: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestRequest {
    pub product_uid: i64,
    pub invest_amount: i64,
}

/// The `preload` literal of the invest-confirm page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreloadInvest {
    #[serde(default)]
    pub invest: PreloadInvestInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadInvestInfo {
    #[serde(default)]
    pub invested_amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvestedProductsRequest {
    pub category: i32,
    /// Offset of the first holding, not the page number.
    pub index: i64,
    pub invest_state: Option<i32>,
    pub is_ongoing: bool,
    pub page_size: i64,
    pub title_keyword: String,
}

impl ListInvestedProductsRequest {
    pub fn page(page_index: i64, page_size: i64) -> Self {
        Self {
            category: -1,
            index: page_index * page_size,
            invest_state: None,
            is_ongoing: true,
            page_size,
            title_keyword: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListInvestedProductsResponse {
    pub code: i64,
    pub data: InvestedPage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestedPage {
    #[serde(default)]
    pub investments: Vec<RawInvestment>,
    pub total_investments_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInvestment {
    pub title: String,
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HonestfundApi: Send + Sync {
    async fn list_products(&self, req: &ListProductRequest)
        -> Result<ListProductResponse, LendError>;

    /// Returns the `accessToken` cookie value.
    async fn login(&self, email: &str, password: &str) -> Result<String, LendError>;

    async fn invest(&self, access_token: &str, req: &InvestRequest) -> Result<(), LendError>;

    async fn check_eligibility(
        &self,
        access_token: &str,
        product_uid: i64,
        amount: i64,
    ) -> Result<PreloadInvest, LendError>;

    async fn list_invested_products(
        &self,
        access_token: &str,
        req: &ListInvestedProductsRequest,
    ) -> Result<ListInvestedProductsResponse, LendError>;
}

pub struct HonestfundHttpApi {
    gateway: HttpGateway,
    base_url: String,
}

impl HonestfundHttpApi {
    pub fn new(gateway: HttpGateway, base_url: &str) -> Self {
        Self {
            gateway,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl HonestfundApi for HonestfundHttpApi {
    async fn list_products(
        &self,
        req: &ListProductRequest,
    ) -> Result<ListProductResponse, LendError> {
        let resp = self
            .gateway
            .post_json(&self.url("/api/search/product/cl"), req, HeaderMap::new())
            .await?;
        HttpGateway::decode(resp).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, LendError> {
        let form = [
            ("email", email.to_string()),
            ("password", password.to_string()),
            ("deviceType", "1".to_string()),
            ("next", "/".to_string()),
            ("checkLoginKeeping", "false".to_string()),
        ];
        let resp = self
            .gateway
            .post_form(&self.url("/login"), &form, HeaderMap::new())
            .await?;
        find_cookie(resp.headers(), TOKEN_COOKIE)
            .ok_or_else(|| LendError::Auth(format!("can't find {TOKEN_COOKIE} from cookies")))
    }

    async fn invest(&self, access_token: &str, req: &InvestRequest) -> Result<(), LendError> {
        self.gateway
            .post_json(
                &self.url("/invest/confirm"),
                req,
                session_cookie(TOKEN_COOKIE, access_token)?,
            )
            .await?;
        Ok(())
    }

    async fn check_eligibility(
        &self,
        access_token: &str,
        product_uid: i64,
        amount: i64,
    ) -> Result<PreloadInvest, LendError> {
        let query = [
            ("productUid", product_uid.to_string()),
            ("investAmount", amount.to_string()),
        ];
        let resp = self
            .gateway
            .get(
                &self.url("/invest/confirm"),
                &query,
                session_cookie(TOKEN_COOKIE, access_token)?,
            )
            .await?;
        let html = HttpGateway::text(resp).await?;
        parse_preload(&html)
    }

    async fn list_invested_products(
        &self,
        access_token: &str,
        req: &ListInvestedProductsRequest,
    ) -> Result<ListInvestedProductsResponse, LendError> {
        let resp = self
            .gateway
            .post_json(
                &self.url("/mypage/investor/investments/search"),
                req,
                session_cookie(TOKEN_COOKIE, access_token)?,
            )
            .await?;
        HttpGateway::decode(resp).await
    }
}

/// Extract and decode the `preload` JSON literal from the confirm page.
///
/// Only the first JSON value after the call prefix is read, so whatever
/// follows the literal on the same line is ignored.
pub fn parse_preload(html: &str) -> Result<PreloadInvest, LendError> {
    let prefix = PRELOAD
        .find(html)
        .ok_or_else(|| LendError::Decode("preload literal not found in confirm page".into()))?;
    let rest = &html[prefix.end()..];
    debug!(offset = prefix.end(), "Found preload literal");
    serde_json::Deserializer::from_str(rest)
        .into_iter::<PreloadInvest>()
        .next()
        .ok_or_else(|| LendError::Decode("empty preload literal in confirm page".into()))?
        .map_err(LendError::from)
}
