// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{auth, client, security, utils};

// Re-export commonly used types
pub use modules::auth::guard::{GuardPolarity, GuardState, GuardView, Navigate, RouteGuard};
pub use modules::auth::session::{sign_out, SessionOracle};
pub use modules::auth::sign_in::SignInFlow;
pub use modules::auth::store::{TokenStorage, TokenStore};
pub use modules::auth::verification::{RegistrationVerification, VerificationStatus};
pub use modules::client::config::AppConfig;
pub use modules::client::gateway::{ApiFailure, ApiGateway, FailureKind};

// Constants
pub const TOKEN_SLOT: &str = "auth_token";
pub const RESEND_COOLDOWN_SECS: u32 = 30;
pub const OTP_LENGTH: usize = 6;
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";
pub const RETURN_PATH_PARAM: &str = "redirect";
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
