// src/services/session.rs
//
// Session Store - Read-only view of the signed-in user
//
// The workflow reads the identity to guard against self-matches and the
// access token to authorize API calls. It never writes to the session.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub display_name: String,
}

pub trait SessionStore: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;
    fn access_token(&self) -> Option<String>;
}

/// Session held in process memory.
///
/// `sign_in`/`sign_out` belong to whoever owns the login flow.
/// The workflow only sees the `SessionStore` side.
#[derive(Debug, Default)]
pub struct InMemorySession {
    inner: RwLock<Option<(Identity, Option<String>)>>,
}

impl InMemorySession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(identity: Identity, token: Option<String>) -> Self {
        Self {
            inner: RwLock::new(Some((identity, token))),
        }
    }

    pub fn sign_in(&self, identity: Identity, token: Option<String>) {
        *self.inner.write().unwrap() = Some((identity, token));
    }

    pub fn sign_out(&self) {
        *self.inner.write().unwrap() = None;
    }
}

impl SessionStore for InMemorySession {
    fn current_identity(&self) -> Option<Identity> {
        self.inner.read().unwrap().as_ref().map(|(id, _)| id.clone())
    }

    fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap()
            .as_ref()
            .and_then(|(_, token)| token.clone())
    }
}
