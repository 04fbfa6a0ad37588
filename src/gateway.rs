//! HTTP gateway shared by the lender adapters.
//!
//! Wraps a `reqwest::Client`: issues requests, rejects any status >= 400
//! with the raw body as detail, decodes JSON bodies and reads response
//! cookies. One gateway is built at start-up and handed to each lender
//! adapter explicitly.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::types::LendError;

#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
}

impl HttpGateway {
    pub fn new(cfg: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(cfg.user_agent.as_str());
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .context("Failed to build HTTP client for lender gateway")?;
        Ok(Self { http })
    }

    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<Response, LendError> {
        debug!(url = %url, "GET");
        let resp = self.http.get(url).query(query).headers(headers).send().await?;
        check_status(resp).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        headers: HeaderMap,
    ) -> Result<Response, LendError> {
        debug!(url = %url, "POST json");
        let resp = self.http.post(url).json(body).headers(headers).send().await?;
        check_status(resp).await
    }

    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<Response, LendError> {
        debug!(url = %url, "POST form");
        let resp = self.http.post(url).form(form).headers(headers).send().await?;
        check_status(resp).await
    }

    /// Decode a JSON response body into `T`.
    pub async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, LendError> {
        let url = resp.url().to_string();
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| LendError::Decode(format!("{url}: {e}")))
    }

    pub async fn text(resp: Response) -> Result<String, LendError> {
        Ok(resp.text().await?)
    }
}

async fn check_status(resp: Response) -> Result<Response, LendError> {
    let status = resp.status();
    if status.as_u16() >= 400 {
        let url = resp.url().to_string();
        let body = resp.text().await.unwrap_or_default();
        return Err(LendError::HttpStatus {
            status: status.as_u16(),
            url,
            body,
        });
    }
    Ok(resp)
}

/// Headers carrying a single session cookie.
pub fn session_cookie(name: &str, token: &str) -> Result<HeaderMap, LendError> {
    let value = HeaderValue::from_str(&format!("{name}={token}"))
        .map_err(|e| LendError::Auth(format!("invalid session token: {e}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, value);
    Ok(headers)
}

/// First non-empty value of cookie `name` among the `Set-Cookie` headers.
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, v)| k.trim() == name && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
}
