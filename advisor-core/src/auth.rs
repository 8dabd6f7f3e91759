//! Auth service: maps credential-store results onto page transitions.

use serde::Serialize;

use crate::credentials::{CredentialStore, RegisterOutcome, StoreError, VerifyOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Login,
    Register,
    Main,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct AuthState {
    pub authenticated: bool,
    pub username: Option<String>,
    pub page: Page,
}

impl AuthState {
    pub fn go_to_register(&mut self) {
        if !self.authenticated {
            self.page = Page::Register;
        }
    }

    pub fn go_to_login(&mut self) {
        if !self.authenticated {
            self.page = Page::Login;
        }
    }

    pub fn logout(&mut self) {
        *self = AuthState::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn,
    InvalidCredentials,
}

#[derive(Clone)]
pub struct AuthService {
    store: CredentialStore,
}

impl AuthService {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// On success the user is sent back to the login page; a taken username
    /// leaves them on the register page.
    pub async fn register(
        &self,
        state: &mut AuthState,
        username: &str,
        password: &str,
    ) -> Result<RegisterOutcome, StoreError> {
        let outcome = self.store.register(username, password).await?;
        state.page = match outcome {
            RegisterOutcome::Registered => Page::Login,
            RegisterOutcome::AlreadyExists => Page::Register,
        };
        Ok(outcome)
    }

    pub async fn login(
        &self,
        state: &mut AuthState,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, StoreError> {
        match self.store.verify(username, password).await? {
            VerifyOutcome::Authenticated => {
                state.authenticated = true;
                state.username = Some(username.to_string());
                state.page = Page::Main;
                tracing::info!(username = %username, "User logged in");
                Ok(LoginOutcome::LoggedIn)
            }
            VerifyOutcome::Rejected => {
                tracing::info!(username = %username, "Login rejected");
                Ok(LoginOutcome::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::tests::memory_store;

    #[tokio::test]
    async fn test_register_moves_to_login_page() {
        let auth = AuthService::new(memory_store().await);
        let mut state = AuthState::default();
        state.go_to_register();
        assert_eq!(state.page, Page::Register);

        let outcome = auth.register(&mut state, "aadi", "pw").await.unwrap();
        assert_eq!(outcome, RegisterOutcome::Registered);
        assert_eq!(state.page, Page::Login);
        assert!(!state.authenticated);
    }

    #[tokio::test]
    async fn test_duplicate_register_stays_on_register_page() {
        let auth = AuthService::new(memory_store().await);
        let mut state = AuthState::default();
        auth.register(&mut state, "aadi", "pw").await.unwrap();

        state.go_to_register();
        let outcome = auth.register(&mut state, "aadi", "pw").await.unwrap();
        assert_eq!(outcome, RegisterOutcome::AlreadyExists);
        assert_eq!(state.page, Page::Register);
    }

    #[tokio::test]
    async fn test_login_success_sets_state() {
        let auth = AuthService::new(memory_store().await);
        let mut state = AuthState::default();
        auth.register(&mut state, "aadi", "pw").await.unwrap();

        let outcome = auth.login(&mut state, "aadi", "pw").await.unwrap();
        assert_eq!(outcome, LoginOutcome::LoggedIn);
        assert!(state.authenticated);
        assert_eq!(state.username.as_deref(), Some("aadi"));
        assert_eq!(state.page, Page::Main);
    }

    #[tokio::test]
    async fn test_login_failure_leaves_state_untouched() {
        let auth = AuthService::new(memory_store().await);
        let mut state = AuthState::default();
        auth.register(&mut state, "aadi", "pw").await.unwrap();

        let outcome = auth.login(&mut state, "aadi", "wrong").await.unwrap();
        assert_eq!(outcome, LoginOutcome::InvalidCredentials);
        assert_eq!(state, AuthState::default());
    }

    #[test]
    fn test_switching_between_auth_pages() {
        let mut state = AuthState::default();
        state.go_to_register();
        assert_eq!(state.page, Page::Register);
        state.go_to_login();
        assert_eq!(state.page, Page::Login);
    }

    #[test]
    fn test_logout_resets_state() {
        let mut state = AuthState {
            authenticated: true,
            username: Some("aadi".into()),
            page: Page::Main,
        };
        state.go_to_register();
        assert_eq!(state.page, Page::Main, "authenticated users cannot switch auth pages");

        state.logout();
        assert_eq!(state, AuthState::default());
    }
}
