//! Scripted gateway for flow tests. Every call is counted; replies are served
//! in the order they were queued, and an empty queue answers with a
//! transport failure.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::gateway::{
    ApiFailure, ApiGateway, ApiResult, FailureKind, IssuedToken, OtpRequest, OtpSent, OtpVerified,
    RegisterRequest, SignInRequest, VerifyOtpRequest,
};

#[derive(Default)]
pub(crate) struct MockGateway {
    sign_in_replies: Mutex<VecDeque<ApiResult<IssuedToken>>>,
    register_replies: Mutex<VecDeque<ApiResult<IssuedToken>>>,
    send_otp_replies: Mutex<VecDeque<ApiResult<OtpSent>>>,
    verify_otp_replies: Mutex<VecDeque<ApiResult<OtpVerified>>>,
    pub sign_in_calls: Mutex<Vec<SignInRequest>>,
    pub register_calls: Mutex<Vec<RegisterRequest>>,
    pub send_otp_calls: Mutex<Vec<OtpRequest>>,
    pub verify_otp_calls: Mutex<Vec<VerifyOtpRequest>>,
}

fn next<T>(queue: &Mutex<VecDeque<ApiResult<T>>>) -> ApiResult<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(ApiFailure::transport("no scripted reply")))
}

pub(crate) fn issued(token: &str) -> ApiResult<IssuedToken> {
    Ok(IssuedToken {
        token: token.to_string(),
        user: None,
    })
}

pub(crate) fn otp_sent() -> ApiResult<OtpSent> {
    Ok(OtpSent {
        message: "OTP sent".to_string(),
    })
}

pub(crate) fn otp_verified() -> ApiResult<OtpVerified> {
    Ok(OtpVerified {
        message: "Verified".to_string(),
    })
}

/// Error envelope carried in a 2xx body
pub(crate) fn rejected<T>(message: &str) -> ApiResult<T> {
    Err(ApiFailure::from_response(None, message))
}

pub(crate) fn http_error<T>(status: u16, message: &str) -> ApiResult<T> {
    Err(ApiFailure::from_response(Some(status), message))
}

pub(crate) fn offline<T>() -> ApiResult<T> {
    Err(ApiFailure {
        kind: FailureKind::Transport,
        status: None,
        message: "connection refused".to_string(),
    })
}

impl MockGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script_sign_in(&self, reply: ApiResult<IssuedToken>) {
        self.sign_in_replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn script_register(&self, reply: ApiResult<IssuedToken>) {
        self.register_replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn script_send_otp(&self, reply: ApiResult<OtpSent>) {
        self.send_otp_replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn script_verify_otp(&self, reply: ApiResult<OtpVerified>) {
        self.verify_otp_replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn sign_in_count(&self) -> usize {
        self.sign_in_calls.lock().unwrap().len()
    }

    pub(crate) fn register_count(&self) -> usize {
        self.register_calls.lock().unwrap().len()
    }

    pub(crate) fn send_otp_count(&self) -> usize {
        self.send_otp_calls.lock().unwrap().len()
    }

    pub(crate) fn verify_otp_count(&self) -> usize {
        self.verify_otp_calls.lock().unwrap().len()
    }
}

impl ApiGateway for MockGateway {
    async fn sign_in(&self, request: &SignInRequest) -> ApiResult<IssuedToken> {
        self.sign_in_calls.lock().unwrap().push(request.clone());
        next(&self.sign_in_replies)
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<IssuedToken> {
        self.register_calls.lock().unwrap().push(request.clone());
        next(&self.register_replies)
    }

    async fn send_otp(&self, request: &OtpRequest) -> ApiResult<OtpSent> {
        self.send_otp_calls.lock().unwrap().push(request.clone());
        next(&self.send_otp_replies)
    }

    async fn verify_otp(&self, request: &VerifyOtpRequest) -> ApiResult<OtpVerified> {
        self.verify_otp_calls.lock().unwrap().push(request.clone());
        next(&self.verify_otp_replies)
    }
}
