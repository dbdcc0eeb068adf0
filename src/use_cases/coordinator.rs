use std::sync::Mutex;

use tracing::{debug, warn};

use crate::domain::api::{
    AuthApi, AuthTokenResponse, LoginRequest, MessageMap, RegisterRequest, ResponseMap,
    UserInfoResponse,
};
use crate::domain::entities::{SessionSnapshot, UserProfile};
use crate::domain::errors::{ProfileConfirmationError, UNKNOWN_ERROR};
use crate::domain::ports::{Clock, SessionStore};
use crate::use_cases::api_call::{is_any_loading, ApiCall};
use crate::use_cases::session_lifecycle::SessionLifecycle;

// Fallback message returned when the logout call fails without a message.
const LOGOUT_FALLBACK_MESSAGE: &str = "Logout failed";

// The public session operations. Each named operation runs through its own
// tracked request instance; the lifecycle manager owns the token slot. The
// error slot holds the message of whichever operation failed most recently.
pub struct SessionCoordinator<A, C, S> {
    api: A,
    lifecycle: SessionLifecycle<C, S>,
    login_call: ApiCall<AuthTokenResponse>,
    register_call: ApiCall<ResponseMap>,
    logout_call: ApiCall<MessageMap>,
    user_info_call: ApiCall<UserInfoResponse>,
    last_error: Mutex<Option<String>>,
}

impl<A, C, S> SessionCoordinator<A, C, S>
where
    A: AuthApi,
    C: Clock,
    S: SessionStore,
{
    pub fn new(api: A, clock: C, store: S) -> Self {
        Self {
            api,
            lifecycle: SessionLifecycle::new(clock, store),
            login_call: ApiCall::new("login"),
            register_call: ApiCall::new("register"),
            logout_call: ApiCall::new("logout"),
            user_info_call: ApiCall::new("user-info"),
            last_error: Mutex::new(None),
        }
    }

    // Rehydrates session state from durable storage at startup.
    pub async fn initialize(&self) {
        self.lifecycle.initialize().await;
    }

    // Logs in and confirms the profile before trusting the session. The
    // profile fetch runs strictly after a successful login call; a token
    // whose follow-up profile fetch fails is discarded and never persisted.
    pub async fn login(&self, request: LoginRequest) -> Option<AuthTokenResponse> {
        let Some(issued) = self.login_call.execute(self.api.login(&request)).await else {
            self.record_error(self.login_call.error_message());
            return None;
        };

        let Some(profile) = self.get_user_data().await else {
            let composite = ProfileConfirmationError {
                profile_message: self
                    .user_info_call
                    .error_message()
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            };
            warn!(error = %composite, "discarding unconfirmed login token");
            self.record_error(Some(composite.to_string()));
            return None;
        };

        self.lifecycle
            .establish(&issued.token, issued.expires_in)
            .await;
        self.lifecycle
            .merge_profile(UserProfile::from(profile))
            .await;
        Some(issued)
    }

    // Server-confirmed logout. On failure the local session is deliberately
    // left authenticated; only a successful server call clears it.
    pub async fn logout(&self) -> MessageMap {
        let Some(payload) = self.logout_call.execute(self.api.logout()).await else {
            let message = self
                .logout_call
                .error_message()
                .unwrap_or_else(|| LOGOUT_FALLBACK_MESSAGE.to_string());
            warn!("logout call failed, keeping the local session");
            self.record_error(Some(message.clone()));
            return MessageMap::from([("message".to_string(), message)]);
        };

        self.lifecycle.clear().await;
        debug!("user has been logged out");
        payload
    }

    // Stateless account registration; never touches the token slot.
    pub async fn register(&self, request: RegisterRequest) -> Option<ResponseMap> {
        let payload = self
            .register_call
            .execute(self.api.register(&request))
            .await;
        if payload.is_none() {
            self.record_error(self.register_call.error_message());
        }
        payload
    }

    // Fetches the authoritative profile. Callers decide whether to merge it
    // into session state.
    pub async fn get_user_data(&self) -> Option<UserInfoResponse> {
        let payload = self
            .user_info_call
            .execute(self.api.get_user_info())
            .await;
        if payload.is_none() {
            self.record_error(self.user_info_call.error_message());
        }
        payload
    }

    // True while any named operation is in flight.
    pub fn is_loading(&self) -> bool {
        is_any_loading(&[
            self.login_call.is_loading(),
            self.register_call.is_loading(),
            self.logout_call.is_loading(),
            self.user_info_call.is_loading(),
        ])
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .expect("last error mutex poisoned")
            .clone()
    }

    // Aggregate view read by observers.
    pub fn snapshot(&self) -> SessionSnapshot {
        let token = self.lifecycle.token();
        SessionSnapshot {
            is_authenticated: token.is_some(),
            token,
            user: self.lifecycle.user(),
            show_session_warning: self.lifecycle.show_session_warning(),
            is_loading: self.is_loading(),
            error_message: self.last_error(),
        }
    }

    fn record_error(&self, message: Option<String>) {
        let mut slot = self.last_error.lock().expect("last error mutex poisoned");
        *slot = message;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UserRole;
    use crate::domain::errors::ApiFailure;
    use crate::use_cases::test_support::{FixedClock, RecordingStore, ScriptedAuthApi};

    const NOW_MS: u64 = 1_700_000_000_000;

    fn login_request() -> LoginRequest {
        LoginRequest {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn issued_token() -> AuthTokenResponse {
        AuthTokenResponse {
            token: "T".to_string(),
            expires_in: 900_000,
        }
    }

    fn alice_profile() -> UserInfoResponse {
        UserInfoResponse {
            name: "alice".to_string(),
            role: UserRole::Admin,
            has_valid_status: true,
            id: "u-1".to_string(),
            email: "alice@example.com".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn coordinator(
        api: ScriptedAuthApi,
        store: RecordingStore,
    ) -> SessionCoordinator<ScriptedAuthApi, FixedClock, RecordingStore> {
        SessionCoordinator::new(api, FixedClock(NOW_MS), store)
    }

    #[tokio::test]
    async fn when_login_and_profile_succeed_then_the_session_is_established() {
        let api = ScriptedAuthApi::new()
            .with_login(Ok(issued_token()))
            .with_user_info(Ok(alice_profile()));
        let store = RecordingStore::new();
        let coordinator = coordinator(api.clone(), store.clone());

        let result = coordinator.login(login_request()).await;

        assert_eq!(result, Some(issued_token()));
        assert_eq!(store.stored_token(), Some("T".to_string()));
        let snapshot = coordinator.snapshot();
        assert!(snapshot.is_authenticated);
        assert_eq!(snapshot.token, Some("T".to_string()));
        let user = snapshot.user.expect("expected a confirmed user");
        assert_eq!(user.role, UserRole::Admin);
        assert!(user.has_valid_status);
        // The profile fetch runs strictly after the login call.
        assert_eq!(api.recorded_calls(), vec!["login", "user-info"]);
    }

    #[tokio::test]
    async fn when_the_login_call_fails_then_nothing_is_mutated() {
        let api = ScriptedAuthApi::new().with_login(Err(ApiFailureFixtures::bad_credentials()));
        let store = RecordingStore::new();
        let coordinator = coordinator(api.clone(), store.clone());

        let result = coordinator.login(login_request()).await;

        assert_eq!(result, None);
        assert_eq!(store.stored_token(), None);
        assert!(!coordinator.snapshot().is_authenticated);
        assert_eq!(
            coordinator.last_error(),
            Some("Invalid credentials".to_string())
        );
        // The profile endpoint is never consulted after a failed login.
        assert_eq!(api.recorded_calls(), vec!["login"]);
    }

    #[tokio::test]
    async fn when_the_profile_fetch_fails_then_the_issued_token_is_discarded() {
        let api = ScriptedAuthApi::new()
            .with_login(Ok(issued_token()))
            .with_user_info(Err(ApiFailureFixtures::profile_unavailable()));
        let store = RecordingStore::new();
        let coordinator = coordinator(api.clone(), store.clone());

        let result = coordinator.login(login_request()).await;

        assert_eq!(result, None);
        // The token issued by the login call must never reach storage.
        assert_eq!(store.stored_token(), None);
        assert!(!coordinator.snapshot().is_authenticated);
        let error = coordinator
            .last_error()
            .expect("expected a composite error message");
        assert!(error.contains("Login succeeded"));
        assert!(error.contains("profile endpoint unavailable"));
        assert_eq!(api.recorded_calls(), vec!["login", "user-info"]);
    }

    #[tokio::test]
    async fn when_logout_fails_then_the_local_session_stays_authenticated() {
        let api = ScriptedAuthApi::new()
            .with_login(Ok(issued_token()))
            .with_user_info(Ok(alice_profile()))
            .with_logout(Err(ApiFailureFixtures::server_down()));
        let store = RecordingStore::new();
        let coordinator = coordinator(api, store.clone());
        let _ = coordinator.login(login_request()).await;

        let payload = coordinator.logout().await;

        assert_eq!(
            payload.get("message"),
            Some(&"Request failed with status 500".to_string())
        );
        assert!(coordinator.snapshot().is_authenticated);
        assert_eq!(store.stored_token(), Some("T".to_string()));
    }

    #[tokio::test]
    async fn when_logout_succeeds_then_the_session_is_cleared() {
        let api = ScriptedAuthApi::new()
            .with_login(Ok(issued_token()))
            .with_user_info(Ok(alice_profile()))
            .with_logout(Ok(MessageMap::from([(
                "message".to_string(),
                "Goodbye".to_string(),
            )])));
        let store = RecordingStore::new();
        let coordinator = coordinator(api, store.clone());
        let _ = coordinator.login(login_request()).await;

        let payload = coordinator.logout().await;

        assert_eq!(payload.get("message"), Some(&"Goodbye".to_string()));
        let snapshot = coordinator.snapshot();
        assert!(!snapshot.is_authenticated);
        assert_eq!(snapshot.user, None);
        assert!(!snapshot.show_session_warning);
        assert_eq!(store.stored_token(), None);
    }

    #[tokio::test]
    async fn when_register_succeeds_then_it_passes_the_payload_through_untouched() {
        let mut response = ResponseMap::new();
        response.insert(
            "status".to_string(),
            serde_json::Value::String("created".to_string()),
        );
        let api = ScriptedAuthApi::new().with_register(Ok(response.clone()));
        let store = RecordingStore::new();
        let coordinator = coordinator(api, store.clone());

        let result = coordinator
            .register(RegisterRequest {
                username: "alice".to_string(),
                password: "hunter2".to_string(),
                email: "alice@example.com".to_string(),
            })
            .await;

        assert_eq!(result, Some(response));
        // Registration never touches the token slot.
        assert!(!coordinator.snapshot().is_authenticated);
        assert_eq!(store.stored_token(), None);
    }

    #[tokio::test]
    async fn when_register_fails_then_the_error_is_surfaced() {
        let api = ScriptedAuthApi::new()
            .with_register(Err(ApiFailure::Transport("connection refused".to_string())));
        let store = RecordingStore::new();
        let coordinator = coordinator(api, store);

        let result = coordinator
            .register(RegisterRequest {
                username: "alice".to_string(),
                password: "hunter2".to_string(),
                email: "alice@example.com".to_string(),
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(
            coordinator.last_error(),
            Some("connection refused".to_string())
        );
    }

    #[tokio::test]
    async fn when_get_user_data_succeeds_then_session_state_is_left_alone() {
        let api = ScriptedAuthApi::new().with_user_info(Ok(alice_profile()));
        let store = RecordingStore::new();
        let coordinator = coordinator(api, store);

        let result = coordinator.get_user_data().await;

        assert_eq!(result, Some(alice_profile()));
        // Merging is the caller's decision.
        assert_eq!(coordinator.snapshot().user, None);
    }

    #[tokio::test]
    async fn when_several_operations_fail_then_the_latest_message_wins() {
        let api = ScriptedAuthApi::new()
            .with_register(Err(ApiFailure::Transport("register boom".to_string())))
            .with_user_info(Err(ApiFailure::Transport("profile boom".to_string())));
        let store = RecordingStore::new();
        let coordinator = coordinator(api, store);

        let _ = coordinator
            .register(RegisterRequest {
                username: "alice".to_string(),
                password: "hunter2".to_string(),
                email: "alice@example.com".to_string(),
            })
            .await;
        assert_eq!(coordinator.last_error(), Some("register boom".to_string()));

        let _ = coordinator.get_user_data().await;
        assert_eq!(coordinator.last_error(), Some("profile boom".to_string()));
    }

    #[tokio::test]
    async fn when_all_operations_are_settled_then_the_coordinator_is_not_loading() {
        let api = ScriptedAuthApi::new()
            .with_login(Ok(issued_token()))
            .with_user_info(Ok(alice_profile()));
        let store = RecordingStore::new();
        let coordinator = coordinator(api, store);

        let _ = coordinator.login(login_request()).await;

        assert!(!coordinator.is_loading());
        assert!(!coordinator.snapshot().is_loading);
    }

    // Failure payloads reused across tests.
    struct ApiFailureFixtures;

    impl ApiFailureFixtures {
        fn bad_credentials() -> ApiFailure {
            ApiFailure::Upstream {
                status: 401,
                message: Some("Invalid credentials".to_string()),
            }
        }

        fn profile_unavailable() -> ApiFailure {
            ApiFailure::Upstream {
                status: 503,
                message: Some("profile endpoint unavailable".to_string()),
            }
        }

        fn server_down() -> ApiFailure {
            ApiFailure::Upstream {
                status: 500,
                message: None,
            }
        }
    }
}
