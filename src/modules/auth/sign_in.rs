//! Sign-in: local checks, `POST /signin`, token storage, and the hop back to
//! wherever the Protected guard sent the user from.

use log::{debug, error};
use url::form_urlencoded;

use super::guard::Navigate;
use super::notice::{Field, FieldErrors, Notice, Notices};
use super::store::TokenStore;
use super::validation::{validate_email, validate_login_password};
use crate::modules::client::gateway::{
    ApiFailure, ApiGateway, ApiResult, FailureKind, IssuedToken, SignInRequest,
};
use crate::modules::utils::logging::{log_auth_event, log_session_event};
use crate::{DEFAULT_LANDING_PATH, RETURN_PATH_PARAM};

const INVALID_CREDENTIALS: &str = "Incorrect email or password";
const METHOD_NOT_ALLOWED: &str = "Something went wrong. Please try again later";
const SERVER_ERROR: &str = "Server error. Please try again after some time";
const NETWORK_ERROR: &str = "Network error. Please check your connection.";
const TOKEN_STORAGE_ERROR: &str = "Failed to complete login. Please try again.";
const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again";
const VALIDATION_ERROR: &str = "Invalid input. Please check your details.";

/// Return path carried in a location's query string, if it is a same-site
/// relative path
pub fn return_path_from(location: &str) -> Option<String> {
    let without_fragment = location.split('#').next().unwrap_or_default();
    let (_, query) = without_fragment.split_once('?')?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == RETURN_PATH_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|path| is_relative_path(path))
}

/// `/orders` yes; `//evil.example`, `https://evil.example`, `/\evil` no
fn is_relative_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Outstanding `POST /signin`
#[derive(Debug)]
pub struct SignInTicket {
    seq: u64,
    pub request: SignInRequest,
}

/// Login form and its submission state
pub struct SignInFlow {
    email: String,
    password: String,
    return_path: Option<String>,
    landing_path: String,
    errors: FieldErrors,
    notices: Notices,
    in_flight: Option<u64>,
    next_seq: u64,
    disposed: bool,
}

impl Default for SignInFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl SignInFlow {
    pub fn new() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            return_path: None,
            landing_path: DEFAULT_LANDING_PATH.to_string(),
            errors: FieldErrors::default(),
            notices: Notices::default(),
            in_flight: None,
            next_seq: 0,
            disposed: false,
        }
    }

    /// Flow for the login page at `location`, e.g. `/login?redirect=%2Forders`
    pub fn from_location(location: &str) -> Self {
        let mut flow = Self::new();
        flow.return_path = return_path_from(location);
        flow
    }

    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    /// Where a successful sign-in navigates to
    pub fn target(&self) -> &str {
        self.return_path.as_deref().unwrap_or(&self.landing_path)
    }

    pub fn email(&self) -> &str {
        self.email.trim()
    }

    pub fn set_email(&mut self, value: &str) {
        self.email = value.trim_start().to_string();
        self.errors.clear(Field::Email);
    }

    pub fn set_password(&mut self, value: &str) {
        self.password = value.trim_start().to_string();
        self.errors.clear(Field::Password);
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.peek()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    pub fn begin_submit(&mut self) -> Option<SignInTicket> {
        if self.disposed || self.in_flight.is_some() {
            debug!("Sign-in submission ignored");
            return None;
        }

        let email = self.email.trim().to_string();
        let password = self.password.trim().to_string();

        let mut errors = FieldErrors::default();
        if let Err(e) = validate_email(&email) {
            errors.set(Field::Email, e.to_string());
        }
        if let Err(e) = validate_login_password(&password) {
            errors.set(Field::Password, e.to_string());
        }
        if !errors.is_empty() {
            self.errors.merge(errors);
            return None;
        }

        self.next_seq += 1;
        self.in_flight = Some(self.next_seq);
        Some(SignInTicket {
            seq: self.next_seq,
            request: SignInRequest { email, password },
        })
    }

    /// Applies the sign-in response. On success the token is stored and read
    /// back; a read that comes back empty counts as a failed sign-in.
    pub fn complete_submit(
        &mut self,
        ticket: SignInTicket,
        result: ApiResult<IssuedToken>,
        store: &TokenStore,
    ) -> Option<Navigate> {
        if self.disposed || self.in_flight != Some(ticket.seq) {
            debug!("Stale sign-in response ignored");
            return None;
        }
        self.in_flight = None;
        let email = ticket.request.email;

        match result {
            Ok(issued) => {
                store.set_token(&issued.token);
                if store.get_token().is_none() {
                    store.remove_token();
                    log_session_event("token_stored", false, Some("read-back returned nothing"));
                    log_auth_event("sign_in", &email, false, Some("token storage failed"));
                    self.notices.error(TOKEN_STORAGE_ERROR);
                    return None;
                }

                log_session_event("token_stored", true, Some("sign_in"));
                log_auth_event("sign_in", &email, true, None);
                self.password.clear();
                self.notices.success("Successfully signed in");
                Some(Navigate::to(self.target()))
            }
            Err(failure) => {
                log_auth_event("sign_in", &email, false, Some(&failure.message));
                if failure.kind == FailureKind::Server {
                    error!(
                        "Sign-in server failure: status={:?}, message={}",
                        failure.status, failure.message
                    );
                }
                self.notices.error(failure_message(&failure));
                None
            }
        }
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
        self.in_flight = None;
    }

    pub async fn submit<G: ApiGateway>(
        &mut self,
        gateway: &G,
        store: &TokenStore,
    ) -> Option<Navigate> {
        let ticket = self.begin_submit()?;
        let result = gateway.sign_in(&ticket.request).await;
        self.complete_submit(ticket, result, store)
    }
}

/// Notice text for a failed sign-in: HTTP status first, then what the API said
fn failure_message(failure: &ApiFailure) -> String {
    let text = match (failure.kind, failure.status) {
        (FailureKind::Transport, _) => NETWORK_ERROR,
        (_, Some(400)) => failure.message_or(VALIDATION_ERROR),
        (FailureKind::Unauthorized, _) => INVALID_CREDENTIALS,
        (FailureKind::MethodNotAllowed, _) => METHOD_NOT_ALLOWED,
        (FailureKind::Server, Some(_)) => SERVER_ERROR,
        // Malformed success envelope
        (FailureKind::Server, None) => UNEXPECTED_ERROR,
        // Error envelope inside a 2xx response
        (_, None) => failure.message_or(UNEXPECTED_ERROR),
        _ => UNEXPECTED_ERROR,
    };
    text.to_string()
}
