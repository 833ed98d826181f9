/// Access scope enforcement
///
/// Every read query starts from the caller's scope, resolved from the
/// explicit identity passed in — never from ambient state. Non-elevated
/// callers see only records they own; the `assigned-to` parameter is an
/// admin-only narrowing and is silently ignored for everyone else (a scope
/// request from a non-privileged actor is a no-op, not an error).
///
/// # Example
///
/// ```
/// use taskforge_shared::auth::middleware::AuthContext;
/// use taskforge_shared::models::user::UserRole;
/// use taskforge_shared::query::scope::AccessScope;
/// use uuid::Uuid;
///
/// let caller = AuthContext::new(Uuid::new_v4(), UserRole::User);
/// // `assigned-to` from a non-admin is dropped, not rejected
/// let scope = AccessScope::for_caller(&caller, Some("some,ids"));
/// assert_eq!(scope, AccessScope::Owner(caller.user_id));
/// ```

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::middleware::AuthContext;

/// Mandatory visibility scope, applied before any other filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// Non-admin caller: pinned to records whose owner is the caller.
    Owner(Uuid),

    /// Admin caller; optionally narrowed to an explicit owner-id set.
    /// `None` means unrestricted.
    Admin { assigned_to: Option<Vec<Uuid>> },
}

impl AccessScope {
    /// Unrestricted admin scope.
    pub fn admin() -> Self {
        AccessScope::Admin { assigned_to: None }
    }

    /// Resolves the scope for a caller.
    ///
    /// `assigned_to_param` is the raw `assigned-to` value (comma-separated
    /// owner ids). For admins it narrows the scope; tokens that do not
    /// parse as ids are kept out of the set, so a value with no valid id
    /// matches nothing rather than everything. For non-admins the
    /// parameter is ignored entirely.
    pub fn for_caller(auth: &AuthContext, assigned_to_param: Option<&str>) -> Self {
        if !auth.is_admin() {
            return AccessScope::Owner(auth.user_id);
        }

        let assigned_to = assigned_to_param
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.split(',')
                    .filter_map(|token| token.trim().parse::<Uuid>().ok())
                    .collect::<Vec<_>>()
            });

        AccessScope::Admin { assigned_to }
    }

    /// Appends the scope predicate.
    pub fn apply(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            AccessScope::Owner(user_id) => {
                qb.push(" AND assigned_to = ");
                qb.push_bind(*user_id);
            }
            AccessScope::Admin { assigned_to: Some(ids) } => {
                qb.push(" AND assigned_to = ANY(");
                qb.push_bind(ids.clone());
                qb.push(")");
            }
            AccessScope::Admin { assigned_to: None } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn user() -> AuthContext {
        AuthContext::new(Uuid::new_v4(), UserRole::User)
    }

    fn admin() -> AuthContext {
        AuthContext::new(Uuid::new_v4(), UserRole::Admin)
    }

    #[test]
    fn test_non_admin_is_pinned_to_own_records() {
        let caller = user();
        let scope = AccessScope::for_caller(&caller, None);
        assert_eq!(scope, AccessScope::Owner(caller.user_id));
    }

    #[test]
    fn test_non_admin_assigned_to_is_silently_ignored() {
        let caller = user();
        let other = Uuid::new_v4();
        let scope = AccessScope::for_caller(&caller, Some(&other.to_string()));
        // no error, no widening
        assert_eq!(scope, AccessScope::Owner(caller.user_id));
    }

    #[test]
    fn test_admin_without_filter_is_unrestricted() {
        let scope = AccessScope::for_caller(&admin(), None);
        assert_eq!(scope, AccessScope::Admin { assigned_to: None });
    }

    #[test]
    fn test_admin_assigned_to_parses_comma_list() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let param = format!(" {a} , {b} ");
        let scope = AccessScope::for_caller(&admin(), Some(&param));
        assert_eq!(
            scope,
            AccessScope::Admin {
                assigned_to: Some(vec![a, b])
            }
        );
    }

    #[test]
    fn test_admin_assigned_to_with_no_valid_id_matches_nothing() {
        let scope = AccessScope::for_caller(&admin(), Some("not-an-id"));
        // empty set, not an unrestricted scope
        assert_eq!(
            scope,
            AccessScope::Admin {
                assigned_to: Some(vec![])
            }
        );
    }

    #[test]
    fn test_admin_empty_param_is_no_constraint() {
        let scope = AccessScope::for_caller(&admin(), Some("   "));
        assert_eq!(scope, AccessScope::Admin { assigned_to: None });
    }

    #[test]
    fn test_owner_scope_sql() {
        let caller = user();
        let scope = AccessScope::for_caller(&caller, None);
        let mut qb = QueryBuilder::new("SELECT 1 FROM tasks WHERE deleted_at IS NULL");
        scope.apply(&mut qb);
        assert!(qb.sql().ends_with("AND assigned_to = $1"));
    }
}
