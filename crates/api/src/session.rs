//! Session-token identity.
//!
//! Credential verification and session issuance are an external concern;
//! the API only needs to resolve a bearer token to an authenticated
//! principal. `StaticSessions` is the in-process implementation used by
//! tests and the dev-mode server.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::http::HeaderMap;
use common::EmployeeId;
use serde::Serialize;
use store::Role;
use uuid::Uuid;

/// An authenticated employee identity, as derived from the session.
///
/// The cashier stamped on a sale always comes from here, never from the
/// request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub employee_id: EmployeeId,
    pub username: String,
    pub role: Role,
}

/// Maps bearer tokens to authenticated principals.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a session token, or None if it is unknown or expired.
    async fn resolve(&self, token: &str) -> Option<Principal>;
}

/// In-memory token map.
#[derive(Clone, Default)]
pub struct StaticSessions {
    inner: Arc<RwLock<HashMap<String, Principal>>>,
}

impl StaticSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh token for the given principal and returns it.
    pub fn issue(&self, principal: Principal) -> String {
        let token = Uuid::new_v4().to_string();
        self.inner
            .write()
            .unwrap()
            .insert(token.clone(), principal);
        token
    }

    /// Forgets a token.
    pub fn revoke(&self, token: &str) {
        self.inner.write().unwrap().remove(token);
    }
}

#[async_trait]
impl IdentityProvider for StaticSessions {
    async fn resolve(&self, token: &str) -> Option<Principal> {
        self.inner.read().unwrap().get(token).cloned()
    }
}

/// Extracts the bearer token from an `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
