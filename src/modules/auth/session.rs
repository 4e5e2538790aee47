use log::info;

use super::guard::Navigate;
use super::store::TokenStore;
use crate::modules::utils::logging::log_session_event;
use crate::DEFAULT_LOGIN_PATH;

/// Answers "is there a session right now".
///
/// Nothing is cached: every call goes back to the Token Store, because a
/// sign-out triggered elsewhere on the page can clear the slot at any time.
#[derive(Clone)]
pub struct SessionOracle {
    store: TokenStore,
}

impl SessionOracle {
    pub fn new(store: TokenStore) -> Self {
        Self { store }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.has_token()
    }
}

/// Clears the session and returns the navigation to the sign-in page
pub fn sign_out(store: &TokenStore) -> Navigate {
    let had_session = store.has_token();
    store.remove_token();
    log_session_event("sign_out", had_session, None);
    info!("Signed out");
    Navigate::to(DEFAULT_LOGIN_PATH)
}
