use http::Extensions;

use crate::error::{AppError, Result};
use crate::models::user::Principal;
use crate::repositories::user::UserStore;
use crate::session::SessionStore;

/// Resolves the authenticated principal for one request.
///
/// Ordered, short-circuiting fallback chain:
/// 1. a [`Principal`] already cached on the request scope is returned as-is,
///    so the backing stores are hit at most once per request no matter how
///    many middleware/handlers ask;
/// 2. no session key (cookie absent) fails;
/// 3. a session-store miss or expired session fails;
/// 4. a user id that no longer exists in the user store fails — no
///    placeholder principal is synthesized;
/// 5. otherwise the fetched principal is cached on the scope and returned.
///
/// Failure is the expected "not authenticated" outcome, surfaced as
/// [`AppError::NotAuthenticated`] and rendered as a business-code envelope by
/// the caller, never as a fault.
///
/// Collaborators are explicit parameters so the chain can be tested in
/// isolation against call-counting doubles.
pub async fn resolve(
    scope: &mut Extensions,
    session_key: Option<&str>,
    sessions: &dyn SessionStore,
    users: &dyn UserStore,
) -> Result<Principal> {
    if let Some(cached) = scope.get::<Principal>() {
        tracing::debug!("Principal served from request scope: {}", cached.username);
        return Ok(cached.clone());
    }

    let key = session_key.ok_or(AppError::NotAuthenticated)?;

    let user_id = sessions
        .get(key)
        .await?
        .ok_or(AppError::NotAuthenticated)?;

    let user = users
        .get_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotAuthenticated)?;

    let principal = Principal::from(user);
    scope.insert(principal.clone());

    tracing::debug!("✅ Principal resolved: {}", principal.username);
    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::user::UserRecord;

    fn user(id: i64) -> UserRecord {
        UserRecord {
            id,
            username: format!("user-{}", id),
            email: None,
            password: "hash".to_string(),
            role_ids: vec![2],
            created_at: Utc::now(),
            is_active: true,
        }
    }

    /// A session store double serving one fixed key, counting lookups.
    struct OneSession {
        key: &'static str,
        user_id: Option<i64>,
        lookups: AtomicUsize,
    }

    impl OneSession {
        fn new(key: &'static str, user_id: Option<i64>) -> Self {
            Self {
                key,
                user_id,
                lookups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SessionStore for OneSession {
        async fn create(&self, _user_id: i64) -> Result<String> {
            Ok(self.key.to_string())
        }

        async fn get(&self, key: &str) -> Result<Option<i64>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(if key == self.key { self.user_id } else { None })
        }

        async fn destroy(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    /// A user store double serving one fixed user, counting fetches.
    struct OneUser {
        user: Option<UserRecord>,
        fetches: AtomicUsize,
    }

    impl OneUser {
        fn new(user: Option<UserRecord>) -> Self {
            Self {
                user,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl UserStore for OneUser {
        async fn get_user_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.user.clone().filter(|u| u.id == id))
        }

        async fn find_by_username(&self, _username: &str) -> Result<Option<UserRecord>> {
            unimplemented!("not exercised by the resolver")
        }

        async fn create_user(
            &self,
            _username: String,
            _email: Option<String>,
            _password_hash: String,
        ) -> Result<UserRecord> {
            unimplemented!("not exercised by the resolver")
        }
    }

    #[tokio::test]
    async fn second_resolve_is_served_from_the_scope() {
        let sessions = OneSession::new("k1", Some(42));
        let users = OneUser::new(Some(user(42)));
        let mut scope = Extensions::new();

        let first = resolve(&mut scope, Some("k1"), &sessions, &users)
            .await
            .unwrap();
        let second = resolve(&mut scope, Some("k1"), &sessions, &users)
            .await
            .unwrap();

        assert_eq!(first.id, 42);
        assert_eq!(second.id, 42);
        assert_eq!(sessions.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(users.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_cookie_fails_without_touching_stores() {
        let sessions = OneSession::new("k1", Some(42));
        let users = OneUser::new(Some(user(42)));
        let mut scope = Extensions::new();

        let err = resolve(&mut scope, None, &sessions, &users)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotAuthenticated));
        assert_eq!(sessions.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(users.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_session_fails_before_the_user_store() {
        let sessions = OneSession::new("k1", None);
        let users = OneUser::new(Some(user(42)));
        let mut scope = Extensions::new();

        let err = resolve(&mut scope, Some("k1"), &sessions, &users)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotAuthenticated));
        assert_eq!(sessions.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(users.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn deleted_user_is_not_synthesized() {
        let sessions = OneSession::new("k1", Some(42));
        let users = OneUser::new(None);
        let mut scope = Extensions::new();

        let err = resolve(&mut scope, Some("k1"), &sessions, &users)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotAuthenticated));
        assert_eq!(users.fetches.load(Ordering::SeqCst), 1);
        assert!(scope.get::<Principal>().is_none());
    }

    #[tokio::test]
    async fn failed_resolution_is_not_cached() {
        let sessions = OneSession::new("k1", None);
        let users = OneUser::new(Some(user(42)));
        let mut scope = Extensions::new();

        let _ = resolve(&mut scope, Some("k1"), &sessions, &users).await;
        let _ = resolve(&mut scope, Some("k1"), &sessions, &users).await;

        // No principal means every call goes back to the session store.
        assert_eq!(sessions.lookups.load(Ordering::SeqCst), 2);
    }
}
