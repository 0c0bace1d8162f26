//! Authentication gate
//!
//! The dispatcher runs at most one gate, and only for routes registered as
//! gated. A denial says how the caller is sent to log in; the dispatcher
//! turns it into `AppError::Unauthenticated`.

use crate::http::{self, Request};
use crate::store::SessionStore;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(LoginResponse),
}

impl GateDecision {
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Predicate run before gated handlers
pub trait Gate: Send + Sync {
    fn check(&self, req: &Request) -> GateDecision;
}

/// What an unauthenticated caller receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResponse {
    /// Render the login form in place, posting to `action`
    Prompt { action: String },
    /// Send the caller to the login page
    Redirect(String),
}

impl LoginResponse {
    pub fn respond(&self) -> Response<Full<Bytes>> {
        match self {
            Self::Prompt { action } => http::build_login_prompt(action, None),
            Self::Redirect(target) => http::build_redirect_response(target),
        }
    }
}

/// Gate backed by the session store, checked on every request
pub struct SessionGate {
    sessions: Arc<dyn SessionStore>,
    login: LoginResponse,
}

impl SessionGate {
    pub fn new(sessions: Arc<dyn SessionStore>, login: LoginResponse) -> Self {
        Self { sessions, login }
    }
}

impl Gate for SessionGate {
    fn check(&self, req: &Request) -> GateDecision {
        if !req.session_id.is_empty() && self.sessions.is_authenticated(&req.session_id) {
            GateDecision::Allow
        } else {
            GateDecision::Deny(self.login.clone())
        }
    }
}
