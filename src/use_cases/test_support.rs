use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::api::{
    AuthApi, AuthTokenResponse, LoginRequest, MessageMap, RegisterRequest, ResponseMap,
    UserInfoResponse,
};
use crate::domain::entities::ProfileCache;
use crate::domain::errors::ApiFailure;
use crate::domain::ports::{Clock, SessionStore};

// Shared fixed time source for deterministic use-case tests.
pub(crate) struct FixedClock(pub(crate) u64);

impl Clock for FixedClock {
    fn now_epoch_millis(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub read: bool,
    pub write: bool,
    pub cache: bool,
    pub clear: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct StoredFields {
    pub token: Option<String>,
    pub profile_cache: Option<ProfileCache>,
}

// In-memory fake store that tests can seed and inspect.
#[derive(Clone, Default)]
pub(crate) struct RecordingStore {
    fields: Arc<Mutex<StoredFields>>,
    failures: FailureFlags,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn seed_token(&self, token: impl Into<String>) {
        let mut guard = self.fields.lock().expect("fields mutex poisoned");
        guard.token = Some(token.into());
    }

    pub(crate) fn stored_token(&self) -> Option<String> {
        let guard = self.fields.lock().expect("fields mutex poisoned");
        guard.token.clone()
    }

    pub(crate) fn stored_profile_cache(&self) -> Option<ProfileCache> {
        let guard = self.fields.lock().expect("fields mutex poisoned");
        guard.profile_cache.clone()
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn read_token(&self) -> Result<Option<String>, String> {
        if self.failures.read {
            return Err("read failed".to_string());
        }
        let guard = self.fields.lock().expect("fields mutex poisoned");
        Ok(guard.token.clone())
    }

    async fn write_token(&self, token: &str) -> Result<(), String> {
        if self.failures.write {
            return Err("write failed".to_string());
        }
        let mut guard = self.fields.lock().expect("fields mutex poisoned");
        guard.token = Some(token.to_string());
        Ok(())
    }

    async fn write_profile_cache(&self, cache: &ProfileCache) -> Result<(), String> {
        if self.failures.cache {
            return Err("cache write failed".to_string());
        }
        let mut guard = self.fields.lock().expect("fields mutex poisoned");
        guard.profile_cache = Some(cache.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), String> {
        if self.failures.clear {
            return Err("clear failed".to_string());
        }
        let mut guard = self.fields.lock().expect("fields mutex poisoned");
        *guard = StoredFields::default();
        Ok(())
    }
}

// Scripted transport fake: every operation replays its configured result
// and records the call order for sequencing assertions. Clones share the
// call log so tests can inspect it after handing the fake over.
#[derive(Clone)]
pub(crate) struct ScriptedAuthApi {
    login_result: Result<AuthTokenResponse, ApiFailure>,
    register_result: Result<ResponseMap, ApiFailure>,
    logout_result: Result<MessageMap, ApiFailure>,
    user_info_result: Result<UserInfoResponse, ApiFailure>,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

fn not_scripted() -> ApiFailure {
    ApiFailure::Transport("operation not scripted".to_string())
}

impl ScriptedAuthApi {
    pub(crate) fn new() -> Self {
        Self {
            login_result: Err(not_scripted()),
            register_result: Err(not_scripted()),
            logout_result: Err(not_scripted()),
            user_info_result: Err(not_scripted()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_login(mut self, result: Result<AuthTokenResponse, ApiFailure>) -> Self {
        self.login_result = result;
        self
    }

    pub(crate) fn with_register(mut self, result: Result<ResponseMap, ApiFailure>) -> Self {
        self.register_result = result;
        self
    }

    pub(crate) fn with_logout(mut self, result: Result<MessageMap, ApiFailure>) -> Self {
        self.logout_result = result;
        self
    }

    pub(crate) fn with_user_info(mut self, result: Result<UserInfoResponse, ApiFailure>) -> Self {
        self.user_info_result = result;
        self
    }

    pub(crate) fn recorded_calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }
}

#[async_trait]
impl AuthApi for ScriptedAuthApi {
    async fn login(&self, _request: &LoginRequest) -> Result<AuthTokenResponse, ApiFailure> {
        self.record("login");
        self.login_result.clone()
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<ResponseMap, ApiFailure> {
        self.record("register");
        self.register_result.clone()
    }

    async fn logout(&self) -> Result<MessageMap, ApiFailure> {
        self.record("logout");
        self.logout_result.clone()
    }

    async fn get_user_info(&self) -> Result<UserInfoResponse, ApiFailure> {
        self.record("user-info");
        self.user_info_result.clone()
    }
}
