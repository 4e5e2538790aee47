//! Route guards: decide whether a guarded region renders, waits, or redirects.
//!
//! Protected and Public guards are the same state machine with opposite
//! polarity. The guard itself never navigates; it hands back a [`Navigate`]
//! effect for a routing collaborator to apply, and it hands it back at most
//! once per transition into a redirecting state.

use log::debug;
use url::form_urlencoded;

use super::session::SessionOracle;
use crate::{DEFAULT_LANDING_PATH, DEFAULT_LOGIN_PATH, RETURN_PATH_PARAM};

/// Navigation effect emitted by guards and flows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigate {
    pub path: String,
}

impl Navigate {
    pub fn to(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Routing collaborator that applies navigation effects
pub trait Navigator {
    fn navigate(&mut self, effect: &Navigate);
}

/// Navigator that only records where it was sent
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub visited: Vec<String>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, effect: &Navigate) {
        self.visited.push(effect.path.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPolarity {
    /// Renders only with a session
    Protected,
    /// Renders only without a session
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Pure outcome of a guard evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Loading,
    Redirect(String),
    Render,
}

/// What the guarded region should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    /// Neutral placeholder while the session check is outstanding
    Placeholder,
    Children,
    /// Nothing; a redirect is under way
    Empty,
}

/// Maps `(authenticated, loading)` onto a decision for the given polarity
pub fn decide(
    polarity: GuardPolarity,
    authenticated: bool,
    loading: bool,
    redirect_target: &str,
) -> GuardDecision {
    if loading {
        return GuardDecision::Loading;
    }
    let renders = match polarity {
        GuardPolarity::Protected => authenticated,
        GuardPolarity::Public => !authenticated,
    };
    if renders {
        GuardDecision::Render
    } else {
        GuardDecision::Redirect(redirect_target.to_string())
    }
}

/// Guard instance for one guarded region
#[derive(Debug, Clone)]
pub struct RouteGuard {
    polarity: GuardPolarity,
    redirect_to: String,
    location: String,
    state: GuardState,
    // Resolved state whose redirect has already been emitted
    redirected_for: Option<GuardState>,
}

impl RouteGuard {
    /// Guard for pages that need a session. Redirects to `/login` by default.
    pub fn protected(location: impl Into<String>) -> Self {
        Self::new(GuardPolarity::Protected, location, DEFAULT_LOGIN_PATH)
    }

    /// Guard for pages only meant for visitors. Redirects to `/dashboard` by default.
    pub fn public(location: impl Into<String>) -> Self {
        Self::new(GuardPolarity::Public, location, DEFAULT_LANDING_PATH)
    }

    pub fn new(
        polarity: GuardPolarity,
        location: impl Into<String>,
        redirect_to: impl Into<String>,
    ) -> Self {
        Self {
            polarity,
            redirect_to: redirect_to.into(),
            location: location.into(),
            state: GuardState::Loading,
            redirected_for: None,
        }
    }

    pub fn with_redirect(mut self, redirect_to: impl Into<String>) -> Self {
        self.redirect_to = redirect_to.into();
        self
    }

    pub fn polarity(&self) -> GuardPolarity {
        self.polarity
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Full redirect target. Protected guards carry the current location as
    /// a return-path parameter.
    pub fn redirect_target(&self) -> String {
        match self.polarity {
            GuardPolarity::Protected => {
                let encoded: String =
                    form_urlencoded::byte_serialize(self.location.as_bytes()).collect();
                let separator = if self.redirect_to.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}{}={}",
                    self.redirect_to, separator, RETURN_PATH_PARAM, encoded
                )
            }
            GuardPolarity::Public => self.redirect_to.clone(),
        }
    }

    pub fn decision(&self) -> GuardDecision {
        decide(
            self.polarity,
            self.state == GuardState::Authenticated,
            self.state == GuardState::Loading,
            &self.redirect_target(),
        )
    }

    pub fn view(&self) -> GuardView {
        match self.decision() {
            GuardDecision::Loading => GuardView::Placeholder,
            GuardDecision::Render => GuardView::Children,
            GuardDecision::Redirect(_) => GuardView::Empty,
        }
    }

    /// Re-enters `Loading` ahead of an asynchronous session check
    pub fn begin_check(&mut self) {
        self.state = GuardState::Loading;
    }

    /// Settles the guard on a session answer.
    /// Returns the redirect effect only on the first resolution into a
    /// redirecting state.
    pub fn resolve(&mut self, authenticated: bool) -> Option<Navigate> {
        self.state = if authenticated {
            GuardState::Authenticated
        } else {
            GuardState::Unauthenticated
        };

        match self.decision() {
            GuardDecision::Redirect(path) => {
                if self.redirected_for == Some(self.state) {
                    return None;
                }
                self.redirected_for = Some(self.state);
                debug!(
                    "Guard redirect: polarity={:?}, from={}, to={}",
                    self.polarity, self.location, path
                );
                Some(Navigate::to(path))
            }
            _ => {
                self.redirected_for = None;
                None
            }
        }
    }

    /// Resolves against the oracle as it stands at this moment
    pub fn check(&mut self, oracle: &SessionOracle) -> Option<Navigate> {
        self.resolve(oracle.is_authenticated())
    }

    /// Resolves, hands any redirect to the navigator, and returns the view
    pub fn guard(&mut self, oracle: &SessionOracle, navigator: &mut impl Navigator) -> GuardView {
        if let Some(effect) = self.check(oracle) {
            navigator.navigate(&effect);
        }
        self.view()
    }
}
