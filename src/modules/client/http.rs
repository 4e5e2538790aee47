//! reqwest-backed API Gateway with a fixed request timeout.
//! Request bodies carry passwords and codes, so only URLs and statuses are logged.

use log::{debug, error};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use super::config::AppConfig;
use super::envelope::{decode_register, decode_send_otp, decode_sign_in, decode_verify_otp};
use super::gateway::{
    ApiFailure, ApiGateway, ApiResult, ErrorClass, IssuedToken, OtpRequest, OtpSent, OtpVerified,
    RegisterRequest, SignInRequest, VerifyOtpRequest,
};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request error: {0}")]
    Serialization(String),
}

impl From<GatewayError> for ApiFailure {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(_) | GatewayError::Timeout(_) => {
                ApiFailure::transport(err.to_string())
            }
            GatewayError::Config(_) | GatewayError::Serialization(_) => {
                error!("Gateway misconfigured: {}", err);
                ApiFailure::malformed(err.to_string())
            }
        }
    }
}

/// Maps reqwest failures into gateway errors with timeout detection
fn map_request_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        GatewayError::Config(format!("Invalid request URL: {err}"))
    } else {
        GatewayError::Network(format!("Unable to reach the server: {err}"))
    }
}

pub struct HttpGateway {
    client: Client,
    config: AppConfig,
}

impl HttpGateway {
    pub fn new(config: AppConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Posts JSON and returns the raw status and body for decoding
    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(u16, String), GatewayError> {
        if self.config.api_base_url.trim().is_empty() {
            return Err(GatewayError::Config(
                "API base URL is not configured.".to_string(),
            ));
        }

        let url = self.config.endpoint(path);
        let payload = serde_json::to_string(body)
            .map_err(|e| GatewayError::Serialization(format!("Failed to encode request: {e}")))?;

        debug!("API request: POST {}", url);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_request_error)?;
        debug!("API response: POST {} -> {}", url, status);
        Ok((status, text))
    }

    async fn call<B, T>(
        &self,
        path: &str,
        body: &B,
        decode: fn(u16, &str) -> ApiResult<T>,
    ) -> ApiResult<T>
    where
        B: Serialize + Sync,
    {
        let (status, text) = self.post_json(path, body).await?;
        let result = decode(status, &text);
        if let Err(failure) = &result {
            if failure.class() == ErrorClass::Server {
                error!(
                    "API failure: path={}, status={}, message={}",
                    path, status, failure.message
                );
            }
        }
        result
    }
}

impl ApiGateway for HttpGateway {
    async fn sign_in(&self, request: &SignInRequest) -> ApiResult<IssuedToken> {
        self.call("/signin", request, decode_sign_in).await
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<IssuedToken> {
        self.call("/register", request, decode_register).await
    }

    async fn send_otp(&self, request: &OtpRequest) -> ApiResult<OtpSent> {
        self.call("/send-otp", request, decode_send_otp).await
    }

    async fn verify_otp(&self, request: &VerifyOtpRequest) -> ApiResult<OtpVerified> {
        self.call("/verify-otp", request, decode_verify_otp).await
    }
}
