//! Decoding of raw API responses into typed results.
//!
//! The API reports failures two ways: a non-2xx status with a JSON error body,
//! or a 2xx body whose envelope says it failed. Both end up in
//! [`ApiFailure::from_response`] so they are classified the same way.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use log::debug;

use super::gateway::{ApiFailure, ApiResult, IssuedToken, OtpSent, OtpVerified, UserProfile};

/// Maximum number of error body characters surfaced to the UI
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct StatusEnvelope<T> {
    #[serde(default)]
    status: Option<String>,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OtpEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    verified: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<UserProfile>,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// First non-empty of the two free-text fields
fn pick_message(primary: Option<String>, secondary: Option<String>) -> Option<String> {
    primary
        .filter(|m| !m.trim().is_empty())
        .or(secondary.filter(|m| !m.trim().is_empty()))
}

/// Trims and truncates free text before it can reach the UI
pub fn sanitize_body(body: &str) -> String {
    body.trim().chars().take(MAX_ERROR_CHARS).collect()
}

/// Failure for a non-2xx response. Bodies without an `error` or `message`
/// field yield an empty message; callers pick their own fallback text.
pub fn http_failure(status: u16, body: &str) -> ApiFailure {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = match pick_message(parsed.error, parsed.message) {
        Some(text) => sanitize_body(&text),
        None => {
            if !body.trim().is_empty() {
                debug!("HTTP {} without error text: {}", status, sanitize_body(body));
            }
            String::new()
        }
    };
    ApiFailure::from_response(Some(status), message)
}

fn decode_status_envelope<T: DeserializeOwned>(status: u16, body: &str) -> ApiResult<T> {
    if !is_success(status) {
        return Err(http_failure(status, body));
    }

    let envelope: StatusEnvelope<T> = serde_json::from_str(body)
        .map_err(|e| ApiFailure::malformed(format!("Failed to decode response: {e}")))?;

    match envelope.status.as_deref() {
        Some("success") => envelope
            .data
            .ok_or_else(|| ApiFailure::malformed("Response is missing its data")),
        Some("error") => {
            let message = pick_message(envelope.error, envelope.message)
                .map(|m| sanitize_body(&m))
                .unwrap_or_default();
            Err(ApiFailure::from_response(None, message))
        }
        other => Err(ApiFailure::malformed(format!(
            "Unexpected response status: {}",
            other.unwrap_or("missing")
        ))),
    }
}

fn decode_token(status: u16, body: &str) -> ApiResult<IssuedToken> {
    let data: TokenData = decode_status_envelope(status, body)?;
    match data.token {
        Some(token) if !token.is_empty() => Ok(IssuedToken {
            token,
            user: data.user,
        }),
        _ => Err(ApiFailure::malformed("Response did not include a token")),
    }
}

/// `POST /signin` response
pub fn decode_sign_in(status: u16, body: &str) -> ApiResult<IssuedToken> {
    decode_token(status, body)
}

/// `POST /register` response
pub fn decode_register(status: u16, body: &str) -> ApiResult<IssuedToken> {
    decode_token(status, body)
}

fn decode_otp_envelope(status: u16, body: &str) -> ApiResult<OtpEnvelope> {
    if !is_success(status) {
        return Err(http_failure(status, body));
    }
    serde_json::from_str(body)
        .map_err(|e| ApiFailure::malformed(format!("Failed to decode response: {e}")))
}

/// `POST /send-otp` response
pub fn decode_send_otp(status: u16, body: &str) -> ApiResult<OtpSent> {
    let envelope = decode_otp_envelope(status, body)?;
    let message = pick_message(envelope.message, envelope.error);
    if envelope.success == Some(true) {
        Ok(OtpSent {
            message: message.unwrap_or_default(),
        })
    } else {
        let message = message.unwrap_or_else(|| "Failed to send OTP".to_string());
        Err(ApiFailure::from_response(None, sanitize_body(&message)))
    }
}

/// `POST /verify-otp` response. `verified: false` next to `success: true` is a failure.
pub fn decode_verify_otp(status: u16, body: &str) -> ApiResult<OtpVerified> {
    let envelope = decode_otp_envelope(status, body)?;
    let message = pick_message(envelope.message, envelope.error);
    if envelope.success == Some(true) && envelope.verified != Some(false) {
        Ok(OtpVerified {
            message: message.unwrap_or_default(),
        })
    } else {
        let message = message.unwrap_or_else(|| "Verification failed".to_string());
        Err(ApiFailure::from_response(None, sanitize_body(&message)))
    }
}
