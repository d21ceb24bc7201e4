//! Blocking HTTP client for the Authority.
//!
//! Every call carries the configured timeout. Decision routes answer with a
//! JSON decision under 200, 403 or 404; the body is authoritative, but an
//! "allowed" body on a non-success status is rejected as malformed.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use securewrap_types::wire::{
    DEREGISTER_PATH, DeregisterRequest, ErrorResponse, HEALTH_PATH, PRE_CHECK_PATH,
    PreCheckRequest, REGISTER_PATH, StatusResponse, VERIFY_PATH, VerifyRequest,
};
use securewrap_types::{AccessRule, Decision, DeviceFingerprint, PackageId};
use tracing::debug;

use crate::authority::Authority;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

pub struct HttpAuthority {
    base_url: String,
    client: Client,
}

impl HttpAuthority {
    /// Creates a client for the Authority at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        if timeout.is_zero() {
            return Err(ClientError::Config("request timeout must be positive".into()));
        }
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Config("authority URL must not be empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("securewrap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config(format!("http client: {e}")))?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(config.authority_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks that the Authority is up.
    pub fn health(&self) -> ClientResult<()> {
        let resp = self
            .client
            .get(self.url(HEALTH_PATH))
            .send()
            .map_err(ClientError::from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: "health check failed".into(),
            });
        }
        read_json::<StatusResponse>(resp).map(|_| ())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> ClientResult<Response> {
        debug!("POST {}", path);
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(ClientError::from_reqwest)
    }

    fn expect_status(&self, path: &str, body: &impl Serialize) -> ClientResult<()> {
        let resp = self.post(path, body)?;
        let status = resp.status();
        if status.is_success() {
            read_json::<StatusResponse>(resp)?;
            return Ok(());
        }
        let message = resp
            .text()
            .ok()
            .and_then(|text| serde_json::from_str::<ErrorResponse>(&text).ok())
            .map(|e| e.error)
            .unwrap_or_else(|| status.to_string());
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    fn decision(&self, path: &str, body: &impl Serialize) -> ClientResult<Decision> {
        let resp = self.post(path, body)?;
        let status = resp.status();
        let decision: Decision = read_json(resp)?;
        if decision.is_allowed() && !status.is_success() {
            return Err(ClientError::MalformedResponse(format!(
                "HTTP {status} with an allowed decision"
            )));
        }
        debug!("{} answered {} {:?}", path, status, decision);
        Ok(decision)
    }
}

fn read_json<T: DeserializeOwned>(resp: Response) -> ClientResult<T> {
    let status = resp.status();
    let text = resp.text().map_err(ClientError::from_reqwest)?;
    serde_json::from_str(&text)
        .map_err(|e| ClientError::MalformedResponse(format!("HTTP {status}: {e}")))
}

impl Authority for HttpAuthority {
    fn register(&self, rule: &AccessRule) -> ClientResult<()> {
        self.expect_status(REGISTER_PATH, rule)
    }

    fn deregister(&self, package_id: &PackageId) -> ClientResult<()> {
        let body = DeregisterRequest {
            package_id: package_id.clone(),
        };
        self.expect_status(DEREGISTER_PATH, &body)
    }

    fn pre_check(
        &self,
        package_id: &PackageId,
        fingerprint: &DeviceFingerprint,
    ) -> ClientResult<Decision> {
        let body = PreCheckRequest::new(package_id.clone(), fingerprint);
        self.decision(PRE_CHECK_PATH, &body)
    }

    fn verify(
        &self,
        package_id: &PackageId,
        password: &str,
        fingerprint: &DeviceFingerprint,
    ) -> ClientResult<Decision> {
        let body = VerifyRequest::new(package_id.clone(), password, fingerprint);
        self.decision(VERIFY_PATH, &body)
    }
}
