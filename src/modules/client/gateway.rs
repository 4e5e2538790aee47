//! API Gateway contract: request payloads, decoded successes, and the single
//! normalized failure shape every flow works with.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiFailure>;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Ecommerce,
    Logistics,
    Dropship,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    pub usertype: UserType,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OtpChannel {
    Email,
    Phone,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OtpRequest {
    pub identifier: String,
    #[serde(rename = "type")]
    pub channel: OtpChannel,
}

impl OtpRequest {
    pub fn email(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            channel: OtpChannel::Email,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VerifyOtpRequest {
    pub identifier: String,
    #[serde(rename = "type")]
    pub channel: OtpChannel,
    pub otp: String,
}

impl VerifyOtpRequest {
    pub fn email(identifier: impl Into<String>, otp: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            channel: OtpChannel::Email,
            otp: otp.into(),
        }
    }
}

/// Account details the API returns next to a token
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub usertype: Option<String>,
}

/// Successful sign-in or registration
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub token: String,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpSent {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpVerified {
    pub message: String,
}

/// What went wrong, after status-code and keyword classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response reached us
    Transport,
    Unauthorized,
    AlreadyRegistered,
    RateLimited,
    OtpExpired,
    Invalid,
    TooManyAttempts,
    BadRequest,
    MethodNotAllowed,
    /// 5xx, internal errors, or an envelope we could not make sense of
    Server,
    /// Explicit refusal that matched nothing more specific
    Rejected,
}

/// Coarse buckets the UI reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Auth,
    Transport,
    Server,
}

impl FailureKind {
    pub fn class(self) -> ErrorClass {
        match self {
            FailureKind::Transport => ErrorClass::Transport,
            FailureKind::BadRequest => ErrorClass::Validation,
            FailureKind::Server | FailureKind::MethodNotAllowed => ErrorClass::Server,
            FailureKind::Unauthorized
            | FailureKind::AlreadyRegistered
            | FailureKind::RateLimited
            | FailureKind::OtpExpired
            | FailureKind::Invalid
            | FailureKind::TooManyAttempts
            | FailureKind::Rejected => ErrorClass::Auth,
        }
    }
}

/// Classifies a failure: HTTP status first, then keywords in the message.
///
/// The keyword fallback matches free text from the API and breaks as soon as
/// the wording changes; explicit error codes from the API would replace it.
pub fn classify(status: Option<u16>, message: &str) -> FailureKind {
    match status {
        Some(429) => return FailureKind::RateLimited,
        Some(409) => return FailureKind::AlreadyRegistered,
        Some(401) => return FailureKind::Unauthorized,
        Some(405) => return FailureKind::MethodNotAllowed,
        Some(code) if code >= 500 => return FailureKind::Server,
        _ => {}
    }

    let lowered = message.to_lowercase();
    if lowered.contains("already exists") || lowered.contains("already registered") {
        FailureKind::AlreadyRegistered
    } else if lowered.contains("too many requests") || lowered.contains("rate limit") {
        FailureKind::RateLimited
    } else if lowered.contains("expired") {
        FailureKind::OtpExpired
    } else if lowered.contains("invalid") {
        FailureKind::Invalid
    } else if lowered.contains("attempts") {
        FailureKind::TooManyAttempts
    } else if lowered.contains("internal server error") {
        FailureKind::Server
    } else if status == Some(400) {
        FailureKind::BadRequest
    } else {
        FailureKind::Rejected
    }
}

/// Normalized failure of an API call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub kind: FailureKind,
    /// HTTP status when the failure came with a non-2xx response
    pub status: Option<u16>,
    pub message: String,
}

impl ApiFailure {
    /// Failure reported by the API, either as a non-2xx status or an error envelope
    pub fn from_response(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify(status, &message),
            status,
            message,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            status: None,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Server,
            status: None,
            message: message.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Server text, or `fallback` when the response carried none
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.message.trim().is_empty() {
            fallback
        } else {
            &self.message
        }
    }
}

/// Network boundary of the auth core
#[trait_variant::make(ApiGateway: Send)]
pub trait LocalApiGateway {
    /// `POST /signin`
    async fn sign_in(&self, request: &SignInRequest) -> ApiResult<IssuedToken>;

    /// `POST /register`
    async fn register(&self, request: &RegisterRequest) -> ApiResult<IssuedToken>;

    /// `POST /send-otp`
    async fn send_otp(&self, request: &OtpRequest) -> ApiResult<OtpSent>;

    /// `POST /verify-otp`
    async fn verify_otp(&self, request: &VerifyOtpRequest) -> ApiResult<OtpVerified>;
}
