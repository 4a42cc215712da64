//! Identity gate
//!
//! Login and session issuance belong to the external identity provider. This
//! service only asks "who is calling?" through [`IdentityGate`]. Over HTTP the
//! provider's gateway forwards the authenticated user in the `x-user-id` header.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use reelcheck_common::UserId;
use std::convert::Infallible;
use std::sync::Arc;

/// Request header carrying the authenticated user id
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Current-user lookup consumed by every mutating operation
#[async_trait]
pub trait IdentityGate: Send + Sync {
    /// The acting user, or `None` when nobody is signed in
    async fn current_user(&self) -> Option<UserId>;

    async fn is_authenticated(&self) -> bool {
        self.current_user().await.is_some()
    }
}

/// Identity fixed at construction time
///
/// Used for request-scoped services, where the caller has already been
/// identified, and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<UserId>);

impl StaticIdentity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user(user: UserId) -> Self {
        Self(Some(user))
    }
}

impl From<Option<UserId>> for StaticIdentity {
    fn from(user: Option<UserId>) -> Self {
        Self(user)
    }
}

#[async_trait]
impl IdentityGate for StaticIdentity {
    async fn current_user(&self) -> Option<UserId> {
        self.0.clone()
    }
}

/// Caller identity extracted from the request headers
///
/// Never rejects: a missing, blank or non-UTF-8 header means anonymous, and the
/// operation itself decides whether that is acceptable.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Option<UserId>);

impl CallerIdentity {
    /// Request-scoped identity gate for this caller
    pub fn gate(&self) -> Arc<dyn IdentityGate> {
        Arc::new(StaticIdentity::from(self.0.clone()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| UserId::new(value));

        Ok(CallerIdentity(user))
    }
}
