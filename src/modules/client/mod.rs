//! API Gateway collaborator: configuration, the request/response contract,
//! envelope decoding, and the HTTP implementation.

pub mod config;
pub mod envelope;
pub mod gateway;
pub mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use config::AppConfig;
pub use gateway::{
    ApiFailure, ApiGateway, ApiResult, ErrorClass, FailureKind, IssuedToken, OtpSent, OtpVerified,
};
pub use http::{GatewayError, HttpGateway};
