pub mod cooldown;
pub mod guard;
pub mod notice;
pub mod session;
pub mod sign_in;
pub mod store;
pub mod user_interface;
pub mod validation;
pub mod verification;

// Re-export the main types and functions
pub use guard::{GuardDecision, GuardPolarity, GuardState, GuardView, Navigate, RouteGuard};
pub use notice::{Field, FieldErrors, Notice, NoticeAction, NoticeLevel};
pub use session::{sign_out, SessionOracle};
pub use sign_in::SignInFlow;
pub use store::{FileStorage, MemoryStorage, StorageError, TokenStorage, TokenStore};
pub use verification::{RegistrationVerification, VerificationStatus};
