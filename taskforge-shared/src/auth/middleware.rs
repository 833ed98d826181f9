/// Authentication context for request handlers
///
/// The API layer validates the bearer token and inserts an [`AuthContext`]
/// into request extensions; everything below the router takes the caller's
/// identity as an explicit parameter — there is no ambient "current user"
/// anywhere in this crate.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskforge_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("caller {} admin={}", auth.user_id, auth.is_admin())
/// }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::user::UserRole;

/// Authenticated caller identity
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Caller's user ID
    pub user_id: Uuid,

    /// Caller's role
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// Builds the context from validated JWT claims.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }

    /// True when the caller holds the elevated role.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        let admin = AuthContext::new(Uuid::new_v4(), UserRole::Admin);
        let user = AuthContext::new(Uuid::new_v4(), UserRole::User);
        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_from_claims() {
        let claims = Claims::new(Uuid::new_v4(), UserRole::User);
        let ctx = AuthContext::from_claims(&claims);
        assert_eq!(ctx.user_id, claims.sub);
        assert_eq!(ctx.role, UserRole::User);
    }
}
