//! Peoplefund wire adapter.
//!
//! Listing is served from the static host; everything else from www.
//! Auth: form login sets a `SESSID` cookie. Every JSON response is wrapped
//! in a `{status, message, data}` envelope.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::gateway::{find_cookie, session_cookie, HttpGateway};
use crate::types::LendError;

const SESSION_COOKIE: &str = "SESSID";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ListProductResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub data: ListProductData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListProductData {
    #[serde(default)]
    pub list: Vec<RawProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    pub uri: String,
    pub loan_application_id: i64,
    pub loan_type: String,
    #[serde(default)]
    pub detailed_loan_type: String,
    pub interest_rate: Decimal,
    pub loan_application_term: u32,
    pub remain_amount: i64,
    pub loan_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckInvestmentResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub data: CheckInvestmentData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckInvestmentData {
    pub max_investable_amount: i64,
    pub cash: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListInvestedProductsResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub data: InvestedList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvestedList {
    #[serde(default)]
    pub list: Vec<RawHolding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHolding {
    #[serde(default)]
    pub uri: String,
    pub title: String,
    #[serde(default)]
    pub loan_application_id: i64,
    #[serde(default)]
    pub loan_type: String,
    pub loan_application_status: String,
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PeoplefundApi: Send + Sync {
    async fn list_products(&self, status: &str) -> Result<ListProductResponse, LendError>;

    /// Returns the `SESSID` cookie value.
    async fn login(&self, email: &str, password: &str) -> Result<String, LendError>;

    async fn invest(
        &self,
        session_id: &str,
        uri: &str,
        loan_id: i64,
        invest_amount: i64,
        point_amount: i64,
    ) -> Result<(), LendError>;

    async fn check_investment(
        &self,
        session_id: &str,
        loan_id: i64,
    ) -> Result<CheckInvestmentResponse, LendError>;

    /// All holdings in one response; the endpoint is not paginated.
    async fn list_invested_products(
        &self,
        session_id: &str,
    ) -> Result<ListInvestedProductsResponse, LendError>;
}

pub struct PeoplefundHttpApi {
    gateway: HttpGateway,
    base_url: String,
    static_url: String,
}

impl PeoplefundHttpApi {
    pub fn new(gateway: HttpGateway, base_url: &str, static_url: &str) -> Self {
        Self {
            gateway,
            base_url: base_url.trim_end_matches('/').to_string(),
            static_url: static_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PeoplefundApi for PeoplefundHttpApi {
    async fn list_products(&self, status: &str) -> Result<ListProductResponse, LendError> {
        let url = format!("{}/showcase/newlistGetAjax/1/", self.static_url);
        let resp = self
            .gateway
            .get(&url, &[("status", status.to_string())], HeaderMap::new())
            .await?;
        HttpGateway::decode(resp).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, LendError> {
        let form = [
            ("type", "email".to_string()),
            ("email", email.to_string()),
            ("password", password.to_string()),
        ];
        let url = format!("{}/auth/loginAjax/", self.base_url);
        let resp = self.gateway.post_form(&url, &form, HeaderMap::new()).await?;
        find_cookie(resp.headers(), SESSION_COOKIE)
            .ok_or_else(|| LendError::Auth(format!("can't find {SESSION_COOKIE} from cookies")))
    }

    async fn invest(
        &self,
        session_id: &str,
        uri: &str,
        loan_id: i64,
        invest_amount: i64,
        point_amount: i64,
    ) -> Result<(), LendError> {
        let form = [
            ("showcase_uri", uri.to_string()),
            ("loan_application_id", loan_id.to_string()),
            ("invest_amount", invest_amount.to_string()),
            ("point_amount", point_amount.to_string()),
        ];
        let url = format!("{}/showcase/investSubmitAjax", self.base_url);
        self.gateway
            .post_form(&url, &form, session_cookie(SESSION_COOKIE, session_id)?)
            .await?;
        Ok(())
    }

    async fn check_investment(
        &self,
        session_id: &str,
        loan_id: i64,
    ) -> Result<CheckInvestmentResponse, LendError> {
        let url = format!(
            "{}/showcase/maxInvestableAmountGetAjax/{loan_id}/",
            self.base_url
        );
        let resp = self
            .gateway
            .get(&url, &[], session_cookie(SESSION_COOKIE, session_id)?)
            .await?;
        HttpGateway::decode(resp).await
    }

    async fn list_invested_products(
        &self,
        session_id: &str,
    ) -> Result<ListInvestedProductsResponse, LendError> {
        let url = format!("{}/mypage/investlistAjax", self.base_url);
        let resp = self
            .gateway
            .get(
                &url,
                &[("type", "showcase".to_string())],
                session_cookie(SESSION_COOKIE, session_id)?,
            )
            .await?;
        HttpGateway::decode(resp).await
    }
}
