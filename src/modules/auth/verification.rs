//! Registration with email ownership proof.
//!
//! The flow owns the registration form, the one-time code, the resend
//! countdown, and the outboxes the UI reads. Every network step comes in two
//! halves: `begin_*` validates locally and hands back a ticket carrying the
//! request to send, `complete_*` applies the response. A response whose
//! ticket is no longer current (the email changed, or the flow was disposed)
//! is dropped without touching state. The `async` wrappers run both halves
//! against an [`ApiGateway`].

use log::{debug, error};

use super::cooldown::Countdown;
use super::guard::Navigate;
use super::notice::{Field, FieldErrors, Notice, NoticeAction, NoticeLevel, Notices};
use super::store::TokenStore;
use super::validation::{
    sanitize_otp_input, validate_email, validate_otp, validate_registration_form,
    RegistrationForm,
};
use crate::modules::client::gateway::{
    ApiFailure, ApiGateway, ApiResult, ErrorClass, FailureKind, IssuedToken, OtpRequest, OtpSent,
    OtpVerified, RegisterRequest, UserType, VerifyOtpRequest,
};
use crate::modules::utils::logging::{log_auth_event, log_session_event};
use crate::{DEFAULT_LANDING_PATH, RESEND_COOLDOWN_SECS};

const NETWORK_ERROR: &str = "Network error. Please check your connection.";
const CONNECT_ERROR: &str = "Unable to connect to the server. Please check your internet connection.";
const SERVER_ERROR: &str = "Something went wrong. Please try again later.";
const SEND_FAILED: &str = "Failed to send OTP";
const VERIFY_FAILED: &str = "Verification failed";

/// Words that mark a registration failure as a complaint about a field value
const VALIDATION_KEYWORDS: [&str; 7] = [
    "required",
    "invalid",
    "must be",
    "cannot be",
    "should be",
    "minimum",
    "maximum",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Unverified,
    /// Code request in flight
    Sending,
    AwaitingCode,
    /// Code check in flight
    Verifying,
    Verified,
    /// Registration in flight
    Registering,
    /// Account created; terminal
    Registered,
}

/// Outstanding `POST /send-otp`
#[derive(Debug)]
pub struct SendCodeTicket {
    seq: u64,
    pub request: OtpRequest,
}

/// Outstanding `POST /verify-otp`
#[derive(Debug)]
pub struct VerifyCodeTicket {
    seq: u64,
    pub request: VerifyOtpRequest,
}

/// Outstanding `POST /register`
#[derive(Debug)]
pub struct RegisterTicket {
    seq: u64,
    pub request: RegisterRequest,
}

#[derive(Debug)]
struct InFlight {
    seq: u64,
    /// Status to fall back to if the request fails
    resume: VerificationStatus,
    email: String,
}

/// One registration attempt
pub struct RegistrationVerification {
    form: RegistrationForm,
    otp: String,
    verified_email: Option<String>,
    /// Address the last code was sent to
    code_email: Option<String>,
    status: VerificationStatus,
    cooldown: Countdown,
    errors: FieldErrors,
    notices: Notices,
    in_flight: Option<InFlight>,
    next_seq: u64,
    disposed: bool,
    landing_path: String,
}

impl Default for RegistrationVerification {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationVerification {
    pub fn new() -> Self {
        Self {
            form: RegistrationForm::default(),
            otp: String::new(),
            verified_email: None,
            code_email: None,
            status: VerificationStatus::Unverified,
            cooldown: Countdown::new(),
            errors: FieldErrors::default(),
            notices: Notices::default(),
            in_flight: None,
            next_seq: 0,
            disposed: false,
            landing_path: DEFAULT_LANDING_PATH.to_string(),
        }
    }

    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    /// Current email as it would be submitted
    pub fn email(&self) -> &str {
        self.form.email.trim()
    }

    pub fn verified_email(&self) -> Option<&str> {
        self.verified_email.as_deref()
    }

    /// True only while the verified address is the one in the form
    pub fn is_verified(&self) -> bool {
        self.verified_email.as_deref() == Some(self.email())
    }

    pub fn code(&self) -> &str {
        &self.otp
    }

    pub fn resend_cooldown(&self) -> u32 {
        self.cooldown.remaining()
    }

    pub fn can_resend(&self) -> bool {
        self.status == VerificationStatus::AwaitingCode
            && !self.cooldown.is_running()
            && self.in_flight.is_none()
            && !self.disposed
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

    fn is_locked(&self) -> bool {
        self.disposed
            || matches!(
                self.status,
                VerificationStatus::Registering | VerificationStatus::Registered
            )
    }

    /// Applies typed input to a field and clears that field's error
    pub fn set_field(&mut self, field: Field, value: &str) {
        if self.is_locked() {
            debug!("Ignoring edit to {:?} while {:?}", field, self.status);
            return;
        }

        let slot = match field {
            Field::Email => return self.set_email(value),
            Field::Code => return self.set_code(value),
            Field::Firstname => &mut self.form.firstname,
            Field::Lastname => &mut self.form.lastname,
            Field::Password => &mut self.form.password,
            Field::ConfirmPassword => &mut self.form.confirm_password,
        };
        *slot = value.trim_start().to_string();
        self.errors.clear(field);
    }

    /// Updates the email. Moving away from the verified (or code-bearing)
    /// address drops back to `Unverified` immediately, with no network call.
    pub fn set_email(&mut self, value: &str) {
        if self.is_locked() {
            debug!("Ignoring email edit while {:?}", self.status);
            return;
        }

        self.form.email = value.trim_start().to_string();
        self.errors.clear(Field::Email);
        let email = self.email().to_string();

        if self
            .verified_email
            .as_deref()
            .is_some_and(|verified| verified != email)
        {
            debug!("Email changed after verification; verification reset");
            self.verified_email = None;
        }

        let in_flight_elsewhere = self
            .in_flight
            .as_ref()
            .is_some_and(|flight| flight.email != email);
        if in_flight_elsewhere {
            debug!("Email changed with a request in flight; response will be ignored");
            self.in_flight = None;
        }

        let diverged = match self.status {
            VerificationStatus::Verified => !self.is_verified(),
            VerificationStatus::AwaitingCode => self.code_email.as_deref() != Some(email.as_str()),
            VerificationStatus::Sending | VerificationStatus::Verifying => in_flight_elsewhere,
            _ => false,
        };
        if diverged {
            self.status = VerificationStatus::Unverified;
            self.code_email = None;
            self.otp.clear();
            self.errors.clear(Field::Code);
        }
    }

    /// Keeps digits only, capped at the code length
    pub fn set_code(&mut self, value: &str) {
        if self.is_locked() {
            return;
        }
        self.otp = sanitize_otp_input(value);
        self.errors.clear(Field::Code);
    }

    fn accepts_requests(&self) -> bool {
        if self.disposed {
            debug!("Flow disposed; request ignored");
            return false;
        }
        if self.in_flight.is_some() {
            debug!("Request already in flight while {:?}", self.status);
            return false;
        }
        true
    }

    fn start(&mut self, email: String, busy: VerificationStatus) -> u64 {
        self.next_seq += 1;
        self.in_flight = Some(InFlight {
            seq: self.next_seq,
            resume: self.status,
            email,
        });
        self.status = busy;
        self.next_seq
    }

    /// Claims the in-flight slot for a response, or `None` if it is stale
    fn finish(&mut self, seq: u64) -> Option<InFlight> {
        if self.disposed {
            debug!("Response arrived after dispose; ignored");
            return None;
        }
        match &self.in_flight {
            Some(flight) if flight.seq == seq => self.in_flight.take(),
            _ => {
                debug!("Stale response for request #{}; ignored", seq);
                None
            }
        }
    }

    pub fn begin_request_code(&mut self) -> Option<SendCodeTicket> {
        if !self.accepts_requests() {
            return None;
        }
        if !matches!(
            self.status,
            VerificationStatus::Unverified | VerificationStatus::AwaitingCode
        ) {
            debug!("Code request ignored while {:?}", self.status);
            return None;
        }
        // A code is already out for this address; only a resend can replace it
        if self.status == VerificationStatus::AwaitingCode && self.cooldown.is_running() {
            debug!("Code already sent; {}s of cooldown left", self.cooldown.remaining());
            return None;
        }

        let email = self.email().to_string();
        if let Err(e) = validate_email(&email) {
            self.errors.set(Field::Email, e.to_string());
            return None;
        }
        self.errors.clear(Field::Email);

        let seq = self.start(email.clone(), VerificationStatus::Sending);
        Some(SendCodeTicket {
            seq,
            request: OtpRequest::email(email),
        })
    }

    /// Same as [`Self::begin_request_code`], but a no-op while the cooldown runs
    pub fn begin_resend_code(&mut self) -> Option<SendCodeTicket> {
        if self.cooldown.is_running() {
            debug!(
                "Resend ignored: {}s of cooldown left",
                self.cooldown.remaining()
            );
            return None;
        }
        self.begin_request_code()
    }

    pub fn complete_request_code(&mut self, ticket: SendCodeTicket, result: ApiResult<OtpSent>) {
        let Some(flight) = self.finish(ticket.seq) else {
            return;
        };

        match result {
            Ok(_) => {
                log_auth_event("send_otp", &flight.email, true, None);
                self.status = VerificationStatus::AwaitingCode;
                self.code_email = Some(flight.email);
                self.otp.clear();
                self.errors.clear(Field::Code);
                self.cooldown.start(RESEND_COOLDOWN_SECS);
                self.notices
                    .success("OTP sent successfully. Please check your email.");
            }
            Err(failure) => {
                log_auth_event("send_otp", &flight.email, false, Some(&failure.message));
                self.status = flight.resume;
                match failure.kind {
                    FailureKind::AlreadyRegistered => {
                        self.errors.set(Field::Email, "Email is already registered");
                        self.notices.push(
                            Notice::new(NoticeLevel::Info, "This email is already registered")
                                .with_action(NoticeAction::sign_in()),
                        );
                    }
                    FailureKind::RateLimited => self
                        .notices
                        .warning("Please wait before requesting another OTP"),
                    _ => self.report_generic(&failure, NETWORK_ERROR, SEND_FAILED),
                }
            }
        }
    }

    pub fn begin_submit_code(&mut self) -> Option<VerifyCodeTicket> {
        if !self.accepts_requests() {
            return None;
        }
        if self.status != VerificationStatus::AwaitingCode {
            self.notices.warning("Please request a verification code first");
            return None;
        }

        self.errors.clear(Field::Code);
        if let Err(e) = validate_otp(&self.otp) {
            self.errors.set(Field::Code, e.to_string());
            return None;
        }

        let email = self.email().to_string();
        let otp = self.otp.clone();
        let seq = self.start(email.clone(), VerificationStatus::Verifying);
        Some(VerifyCodeTicket {
            seq,
            request: VerifyOtpRequest::email(email, otp),
        })
    }

    pub fn complete_submit_code(
        &mut self,
        ticket: VerifyCodeTicket,
        result: ApiResult<OtpVerified>,
    ) {
        let Some(flight) = self.finish(ticket.seq) else {
            return;
        };
        self.otp.clear();

        match result {
            Ok(_) => {
                log_auth_event("verify_otp", &flight.email, true, None);
                self.status = VerificationStatus::Verified;
                self.verified_email = Some(flight.email);
                self.errors.clear(Field::Code);
                self.notices.success("Email verified successfully");
            }
            Err(failure) => {
                log_auth_event("verify_otp", &flight.email, false, Some(&failure.message));
                self.status = flight.resume;
                match failure.kind {
                    FailureKind::OtpExpired => {
                        self.notices
                            .warning("OTP has expired. Please request a new one.");
                        self.errors.set(Field::Code, "OTP has expired");
                    }
                    FailureKind::Invalid => self.errors.set(Field::Code, "Invalid OTP code"),
                    FailureKind::TooManyAttempts => {
                        self.notices
                            .warning("Too many failed attempts. Please request a new OTP.");
                        self.errors.set(Field::Code, "Too many failed attempts");
                    }
                    FailureKind::Transport => self.notices.error(NETWORK_ERROR),
                    _ if failure.class() == ErrorClass::Server => {
                        self.report_generic(&failure, NETWORK_ERROR, VERIFY_FAILED)
                    }
                    _ => self
                        .errors
                        .set(Field::Code, failure.message_or(VERIFY_FAILED).to_string()),
                }
            }
        }
    }

    /// Gate, then full validation, then the registration request
    pub fn begin_finalize(&mut self) -> Option<RegisterTicket> {
        if !self.accepts_requests() {
            return None;
        }
        if self.status != VerificationStatus::Verified || !self.is_verified() {
            self.notices
                .warning("Please verify your email before registering");
            return None;
        }

        let form = self.form.trimmed();
        let errors = validate_registration_form(&form);
        if !errors.is_empty() {
            self.errors.merge(errors);
            return None;
        }

        let seq = self.start(form.email.clone(), VerificationStatus::Registering);
        Some(RegisterTicket {
            seq,
            request: RegisterRequest {
                firstname: form.firstname,
                lastname: form.lastname,
                email: form.email,
                password: form.password,
                usertype: UserType::Dropship,
            },
        })
    }

    /// Applies the registration response; stores the token on success and
    /// returns the navigation to the landing page
    pub fn complete_finalize(
        &mut self,
        ticket: RegisterTicket,
        result: ApiResult<IssuedToken>,
        store: &TokenStore,
    ) -> Option<Navigate> {
        let flight = self.finish(ticket.seq)?;

        match result {
            Ok(issued) => {
                store.set_token(&issued.token);
                log_session_event("token_stored", true, Some("registration"));
                log_auth_event("register", &flight.email, true, None);

                self.status = VerificationStatus::Registered;
                self.cooldown.cancel();
                self.notices
                    .success("Registration successful! Redirecting to dashboard...");
                Some(Navigate::to(self.landing_path.clone()))
            }
            Err(failure) => {
                log_auth_event("register", &flight.email, false, Some(&failure.message));
                self.status = flight.resume;
                self.report_registration_failure(&failure);
                None
            }
        }
    }

    fn report_registration_failure(&mut self, failure: &ApiFailure) {
        match failure.kind {
            FailureKind::AlreadyRegistered => self.notices.push(
                Notice::new(NoticeLevel::Error, "User already exists")
                    .with_action(NoticeAction::sign_in()),
            ),
            FailureKind::Transport => self.notices.error(CONNECT_ERROR),
            _ if failure.class() == ErrorClass::Server => {
                self.report_generic(failure, CONNECT_ERROR, SERVER_ERROR)
            }
            _ => match field_for_message(&failure.message) {
                Some(field) => self.errors.set(field, failure.message.clone()),
                None => self.notices.error(failure.message_or(SERVER_ERROR)),
            },
        }
    }

    /// Transport, server, and unmatched failures become a single error notice.
    /// `fallback` stands in when the API sent no text.
    fn report_generic(&mut self, failure: &ApiFailure, network_message: &str, fallback: &str) {
        match failure.class() {
            ErrorClass::Transport => self.notices.error(network_message),
            ErrorClass::Server => {
                error!(
                    "Server failure: status={:?}, message={}",
                    failure.status, failure.message
                );
                self.notices.error(SERVER_ERROR);
            }
            _ => self.notices.error(failure.message_or(fallback)),
        }
    }

    /// Advances the resend countdown by one second. Returns `true` on the
    /// tick that makes resend available again.
    pub fn tick(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        let elapsed = self.cooldown.tick();
        if elapsed {
            debug!("Resend cooldown elapsed");
        }
        elapsed
    }

    /// Applies several elapsed seconds at once
    pub fn advance(&mut self, seconds: u64) -> bool {
        if self.disposed {
            return false;
        }
        self.cooldown.advance(seconds)
    }

    /// Tears the flow down: the countdown stops for good and any response
    /// still in flight will be ignored
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.cooldown.cancel();
        self.in_flight = None;
        debug!("Registration flow disposed");
    }

    pub async fn request_code<G: ApiGateway>(&mut self, gateway: &G, email: &str) {
        self.set_email(email);
        if let Some(ticket) = self.begin_request_code() {
            let result = gateway.send_otp(&ticket.request).await;
            self.complete_request_code(ticket, result);
        }
    }

    pub async fn resend_code<G: ApiGateway>(&mut self, gateway: &G) {
        if let Some(ticket) = self.begin_resend_code() {
            let result = gateway.send_otp(&ticket.request).await;
            self.complete_request_code(ticket, result);
        }
    }

    pub async fn submit_code<G: ApiGateway>(&mut self, gateway: &G, code: &str) {
        self.set_code(code);
        if let Some(ticket) = self.begin_submit_code() {
            let result = gateway.verify_otp(&ticket.request).await;
            self.complete_submit_code(ticket, result);
        }
    }

    pub async fn finalize<G: ApiGateway>(
        &mut self,
        gateway: &G,
        store: &TokenStore,
    ) -> Option<Navigate> {
        let ticket = self.begin_finalize()?;
        let result = gateway.register(&ticket.request).await;
        self.complete_finalize(ticket, result, store)
    }
}

/// Field a validation-style message complains about, if any
fn field_for_message(message: &str) -> Option<Field> {
    let lowered = message.to_lowercase();
    if !VALIDATION_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return None;
    }

    if lowered.contains("email") {
        Some(Field::Email)
    } else if lowered.contains("confirm") {
        Some(Field::ConfirmPassword)
    } else if lowered.contains("password") {
        Some(Field::Password)
    } else if lowered.contains("firstname") || lowered.contains("first name") {
        Some(Field::Firstname)
    } else if lowered.contains("lastname") || lowered.contains("last name") {
        Some(Field::Lastname)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::store::{MemoryStorage, StorageError, TokenStorage};
    use crate::modules::client::envelope::{decode_register, decode_send_otp, decode_verify_otp};
    use crate::modules::client::testing::{
        http_error, issued, offline, otp_sent, otp_verified, rejected, MockGateway,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Memory storage that records every write
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        writes: AtomicUsize,
        last_written: Mutex<Option<String>>,
    }

    impl TokenStorage for CountingStorage {
        fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(slot)
        }

        fn set(&self, slot: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            *self.last_written.lock().unwrap() = Some(value.to_string());
            self.inner.set(slot, value)
        }

        fn remove(&self, slot: &str) -> Result<(), StorageError> {
            self.inner.remove(slot)
        }
    }

    fn fill_form(flow: &mut RegistrationVerification) {
        flow.set_field(Field::Firstname, "Ada");
        flow.set_field(Field::Lastname, "Lovelace");
        flow.set_field(Field::Password, "Password123!");
        flow.set_field(Field::ConfirmPassword, "Password123!");
    }

    async fn verified_flow(gateway: &MockGateway, email: &str) -> RegistrationVerification {
        let mut flow = RegistrationVerification::new();
        gateway.script_send_otp(otp_sent());
        gateway.script_verify_otp(otp_verified());
        flow.request_code(gateway, email).await;
        flow.submit_code(gateway, "123456").await;
        assert_eq!(flow.status(), VerificationStatus::Verified);
        flow.take_notices();
        flow
    }

    #[tokio::test]
    async fn test_full_registration_scenario() {
        let gateway = MockGateway::new();
        let storage = Arc::new(CountingStorage::default());
        let store = TokenStore::new(storage.clone());
        let mut flow = RegistrationVerification::new();
        fill_form(&mut flow);

        gateway.script_send_otp(otp_sent());
        flow.request_code(&gateway, "new@x.com").await;
        assert_eq!(flow.status(), VerificationStatus::AwaitingCode);
        assert_eq!(flow.resend_cooldown(), 30);

        gateway.script_verify_otp(rejected("Invalid OTP"));
        flow.submit_code(&gateway, "000000").await;
        assert_eq!(flow.status(), VerificationStatus::AwaitingCode);
        assert_eq!(flow.code(), "");
        assert_eq!(flow.field_errors().get(Field::Code), Some("Invalid OTP code"));

        gateway.script_verify_otp(otp_verified());
        flow.submit_code(&gateway, "424242").await;
        assert_eq!(flow.status(), VerificationStatus::Verified);
        assert_eq!(flow.verified_email(), Some("new@x.com"));
        assert!(flow.is_verified());
        assert!(flow.field_errors().get(Field::Code).is_none());

        gateway.script_register(issued("fresh-token"));
        let navigate = flow.finalize(&gateway, &store).await;

        assert_eq!(gateway.register_count(), 1);
        assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
        assert_eq!(
            storage.last_written.lock().unwrap().as_deref(),
            Some("fresh-token")
        );
        assert_eq!(navigate, Some(Navigate::to("/dashboard")));
        assert_eq!(flow.status(), VerificationStatus::Registered);

        let request = gateway.register_calls.lock().unwrap()[0].clone();
        assert_eq!(request.email, "new@x.com");
        assert_eq!(request.usertype, UserType::Dropship);
    }

    #[tokio::test]
    async fn test_email_change_revokes_verification_without_network() {
        let gateway = MockGateway::new();
        let mut flow = verified_flow(&gateway, "a@b.com").await;
        assert!(flow.is_verified());
        let calls_before = gateway.send_otp_count() + gateway.verify_otp_count();

        flow.set_email("c@d.com");
        assert!(!flow.is_verified());
        assert_eq!(flow.verified_email(), None);
        assert_eq!(flow.status(), VerificationStatus::Unverified);
        assert_eq!(
            gateway.send_otp_count() + gateway.verify_otp_count(),
            calls_before
        );

        // Typing the old address back does not restore the verification
        flow.set_email("a@b.com");
        assert!(!flow.is_verified());
    }

    #[tokio::test]
    async fn test_trailing_whitespace_keeps_verification() {
        let gateway = MockGateway::new();
        let mut flow = verified_flow(&gateway, "a@b.com").await;

        flow.set_email("a@b.com ");
        assert!(flow.is_verified());
        assert_eq!(flow.status(), VerificationStatus::Verified);
    }

    #[tokio::test]
    async fn test_resend_waits_for_cooldown() {
        let gateway = MockGateway::new();
        let mut flow = RegistrationVerification::new();
        gateway.script_send_otp(otp_sent());
        flow.request_code(&gateway, "a@b.com").await;
        assert_eq!(gateway.send_otp_count(), 1);

        flow.resend_code(&gateway).await;
        assert_eq!(gateway.send_otp_count(), 1);

        for _ in 0..29 {
            assert!(!flow.tick());
        }
        assert!(!flow.can_resend());
        flow.resend_code(&gateway).await;
        assert_eq!(gateway.send_otp_count(), 1);

        assert!(flow.tick());
        assert_eq!(flow.resend_cooldown(), 0);
        assert!(flow.can_resend());

        gateway.script_send_otp(otp_sent());
        flow.resend_code(&gateway).await;
        assert_eq!(gateway.send_otp_count(), 2);
        assert_eq!(flow.resend_cooldown(), 30);
    }

    #[tokio::test]
    async fn test_code_length_checked_locally() {
        let gateway = MockGateway::new();
        let mut flow = RegistrationVerification::new();
        gateway.script_send_otp(otp_sent());
        flow.request_code(&gateway, "a@b.com").await;

        flow.submit_code(&gateway, "12345").await;
        assert_eq!(gateway.verify_otp_count(), 0);
        assert_eq!(
            flow.field_errors().get(Field::Code),
            Some("OTP must be 6 digits")
        );

        gateway.script_verify_otp(otp_verified());
        flow.submit_code(&gateway, "123456").await;
        assert_eq!(gateway.verify_otp_count(), 1);
        assert_eq!(
            gateway.verify_otp_calls.lock().unwrap()[0],
            VerifyOtpRequest::email("a@b.com", "123456")
        );
    }

    #[test]
    fn test_code_input_is_sanitized() {
        let mut flow = RegistrationVerification::new();
        flow.set_code("12a-34 5678");
        assert_eq!(flow.code(), "123456");
    }

    #[tokio::test]
    async fn test_invalid_email_never_reaches_network() {
        let gateway = MockGateway::new();
        let mut flow = RegistrationVerification::new();

        flow.request_code(&gateway, "not-an-email").await;
        assert_eq!(gateway.send_otp_count(), 0);
        assert_eq!(
            flow.field_errors().get(Field::Email),
            Some("Invalid email format")
        );
        assert!(flow.notices().is_empty());

        // Typing clears the inline error
        flow.set_email("a@b.co");
        assert!(flow.field_errors().get(Field::Email).is_none());
    }

    #[tokio::test]
    async fn test_already_registered_offers_sign_in() {
        let gateway = MockGateway::new();
        let mut flow = RegistrationVerification::new();
        gateway.script_send_otp(rejected("Email already exists"));

        flow.request_code(&gateway, "taken@x.com").await;

        assert_eq!(flow.status(), VerificationStatus::Unverified);
        assert_eq!(
            flow.field_errors().get(Field::Email),
            Some("Email is already registered")
        );
        let notices = flow.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert_eq!(notices[0].message, "This email is already registered");
        assert_eq!(notices[0].action, Some(NoticeAction::sign_in()));
    }

    #[tokio::test]
    async fn test_rate_limit_and_transport_leave_state_alone() {
        let gateway = MockGateway::new();
        let mut flow = RegistrationVerification::new();

        gateway.script_send_otp(http_error(429, "Too Many Requests"));
        flow.request_code(&gateway, "a@b.com").await;
        assert_eq!(flow.status(), VerificationStatus::Unverified);
        let notices = flow.take_notices();
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(
            notices[0].message,
            "Please wait before requesting another OTP"
        );

        gateway.script_send_otp(offline());
        flow.request_code(&gateway, "a@b.com").await;
        assert_eq!(flow.status(), VerificationStatus::Unverified);
        assert_eq!(flow.resend_cooldown(), 0);
        assert_eq!(
            flow.take_notices()[0].message,
            "Network error. Please check your connection."
        );
    }

    #[tokio::test]
    async fn test_server_error_rolls_back() {
        let gateway = MockGateway::new();
        let mut flow = RegistrationVerification::new();
        gateway.script_send_otp(otp_sent());
        flow.request_code(&gateway, "a@b.com").await;
        flow.take_notices();

        gateway.script_verify_otp(http_error(500, "boom"));
        flow.submit_code(&gateway, "123456").await;
        assert_eq!(flow.status(), VerificationStatus::AwaitingCode);
        assert_eq!(
            flow.take_notices()[0].message,
            "Something went wrong. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_expired_and_exhausted_codes() {
        let gateway = MockGateway::new();
        let mut flow = RegistrationVerification::new();
        gateway.script_send_otp(otp_sent());
        flow.request_code(&gateway, "a@b.com").await;
        flow.take_notices();

        gateway.script_verify_otp(rejected("OTP has expired"));
        flow.submit_code(&gateway, "123456").await;
        assert_eq!(flow.status(), VerificationStatus::AwaitingCode);
        assert_eq!(flow.code(), "");
        assert_eq!(flow.field_errors().get(Field::Code), Some("OTP has expired"));
        let notices = flow.take_notices();
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notices[0].message, "OTP has expired. Please request a new one.");

        gateway.script_verify_otp(rejected("Too many failed attempts"));
        flow.submit_code(&gateway, "123456").await;
        assert_eq!(
            flow.field_errors().get(Field::Code),
            Some("Too many failed attempts")
        );
        assert_eq!(
            flow.take_notices()[0].message,
            "Too many failed attempts. Please request a new OTP."
        );
    }

    #[tokio::test]
    async fn test_finalize_requires_verified_email() {
        let gateway = MockGateway::new();
        let store = TokenStore::in_memory();
        let mut flow = RegistrationVerification::new();
        fill_form(&mut flow);
        flow.set_email("a@b.com");

        assert_eq!(flow.finalize(&gateway, &store).await, None);
        assert_eq!(gateway.register_count(), 0);
        let notices = flow.take_notices();
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(
            notices[0].message,
            "Please verify your email before registering"
        );
        assert!(!store.has_token());
    }

    #[tokio::test]
    async fn test_finalize_validates_fields_first() {
        let gateway = MockGateway::new();
        let store = TokenStore::in_memory();
        let mut flow = verified_flow(&gateway, "a@b.com").await;
        flow.set_field(Field::Firstname, "A");
        flow.set_field(Field::Password, "weak");
        flow.set_field(Field::ConfirmPassword, "other");

        assert_eq!(flow.finalize(&gateway, &store).await, None);
        assert_eq!(gateway.register_count(), 0);
        let errors = flow.field_errors();
        assert!(errors.get(Field::Firstname).is_some());
        assert!(errors.get(Field::Lastname).is_some());
        assert!(errors.get(Field::Password).is_some());
        assert_eq!(
            errors.get(Field::ConfirmPassword),
            Some("Passwords do not match")
        );
        assert_eq!(flow.status(), VerificationStatus::Verified);
    }

    #[tokio::test]
    async fn test_finalize_failures_are_classified() {
        let gateway = MockGateway::new();
        let store = TokenStore::in_memory();
        let mut flow = verified_flow(&gateway, "a@b.com").await;
        fill_form(&mut flow);

        gateway.script_register(rejected("User already exists"));
        assert_eq!(flow.finalize(&gateway, &store).await, None);
        let notices = flow.take_notices();
        assert_eq!(notices[0].message, "User already exists");
        assert_eq!(notices[0].action, Some(NoticeAction::sign_in()));
        assert_eq!(flow.status(), VerificationStatus::Verified);

        gateway.script_register(http_error(400, "Password must be at least 8 characters"));
        flow.finalize(&gateway, &store).await;
        assert_eq!(
            flow.field_errors().get(Field::Password),
            Some("Password must be at least 8 characters")
        );
        assert!(flow.take_notices().is_empty());

        gateway.script_register(offline());
        flow.finalize(&gateway, &store).await;
        assert_eq!(
            flow.take_notices()[0].message,
            "Unable to connect to the server. Please check your internet connection."
        );

        gateway.script_register(Err(ApiFailure::malformed("Response did not include a token")));
        flow.finalize(&gateway, &store).await;
        assert_eq!(
            flow.take_notices()[0].message,
            "Something went wrong. Please try again later."
        );

        assert_eq!(gateway.register_count(), 4);
        assert!(!store.has_token());
        assert_eq!(flow.status(), VerificationStatus::Verified);
    }

    #[tokio::test]
    async fn test_bad_requests_without_text_use_fallbacks() {
        let gateway = MockGateway::new();
        let store = TokenStore::in_memory();
        let mut flow = RegistrationVerification::new();

        gateway.script_send_otp(decode_send_otp(400, "{}"));
        flow.request_code(&gateway, "a@b.com").await;
        assert_eq!(flow.status(), VerificationStatus::Unverified);
        assert_eq!(flow.take_notices()[0].message, "Failed to send OTP");

        gateway.script_send_otp(otp_sent());
        flow.request_code(&gateway, "a@b.com").await;
        flow.take_notices();
        gateway.script_verify_otp(decode_verify_otp(400, "<html>Bad Request</html>"));
        flow.submit_code(&gateway, "123456").await;
        assert_eq!(flow.status(), VerificationStatus::AwaitingCode);
        assert_eq!(
            flow.field_errors().get(Field::Code),
            Some("Verification failed")
        );

        let mut flow = verified_flow(&gateway, "a@b.com").await;
        fill_form(&mut flow);
        gateway.script_register(decode_register(400, ""));
        assert_eq!(flow.finalize(&gateway, &store).await, None);
        assert_eq!(
            flow.take_notices()[0].message,
            "Something went wrong. Please try again later."
        );
        assert_eq!(flow.status(), VerificationStatus::Verified);
    }

    #[tokio::test]
    async fn test_configured_landing_path() {
        let gateway = MockGateway::new();
        let store = TokenStore::in_memory();
        let mut flow = verified_flow(&gateway, "a@b.com").await.with_landing_path("/inbox");
        fill_form(&mut flow);

        gateway.script_register(issued("tok"));
        assert_eq!(
            flow.finalize(&gateway, &store).await,
            Some(Navigate::to("/inbox"))
        );
    }

    #[test]
    fn test_stale_response_after_email_change_is_ignored() {
        let mut flow = RegistrationVerification::new();
        flow.set_email("a@b.com");
        let ticket = flow.begin_request_code().unwrap();
        assert_eq!(flow.status(), VerificationStatus::Sending);

        // A second request while one is outstanding is refused
        assert!(flow.begin_request_code().is_none());

        flow.set_email("c@d.com");
        assert_eq!(flow.status(), VerificationStatus::Unverified);

        flow.complete_request_code(ticket, otp_sent());
        assert_eq!(flow.status(), VerificationStatus::Unverified);
        assert_eq!(flow.resend_cooldown(), 0);
        assert!(flow.notices().is_empty());
    }

    #[test]
    fn test_dispose_stops_timer_and_drops_responses() {
        let mut flow = RegistrationVerification::new();
        flow.set_email("a@b.com");
        let ticket = flow.begin_request_code().unwrap();
        flow.complete_request_code(ticket, otp_sent());
        assert_eq!(flow.resend_cooldown(), 30);

        flow.set_code("123456");
        let ticket = flow.begin_submit_code().unwrap();
        flow.dispose();

        assert_eq!(flow.resend_cooldown(), 0);
        assert!(!flow.tick());
        flow.complete_submit_code(ticket, otp_verified());
        assert!(!flow.is_verified());
        assert!(flow.begin_request_code().is_none());
    }

    #[test]
    fn test_code_submission_needs_a_sent_code() {
        let mut flow = RegistrationVerification::new();
        flow.set_email("a@b.com");
        flow.set_code("123456");

        assert!(flow.begin_submit_code().is_none());
        assert_eq!(flow.take_notices()[0].level, NoticeLevel::Warning);
    }

    #[test]
    fn test_field_for_message() {
        assert_eq!(
            field_for_message("Missing required field: email"),
            Some(Field::Email)
        );
        assert_eq!(
            field_for_message("Firstname must be at least 2 characters"),
            Some(Field::Firstname)
        );
        assert_eq!(field_for_message("Password is weak"), None);
        assert_eq!(field_for_message("Invalid request"), None);
    }
}
