use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, warn};

use crate::domain::entities::{ProfileCache, UserProfile};
use crate::domain::ports::{Clock, SessionStore};
use crate::domain::token;

// The warning fires this long before the session expires.
pub const WARNING_LEAD_MS: u64 = 60_000;
// Floor applied to scheduled delays so a freshly established session never
// warns essentially instantly when the raw lead time rounds low.
pub const MIN_WARNING_DELAY_MS: u64 = 10_000;

// Computes the warning timer delay for a session with the given remaining
// lifetime. None means the session is already inside its final minute and
// the warning fires immediately instead of being scheduled.
pub fn warning_delay_ms(expires_in_ms: u64) -> Option<u64> {
    if expires_in_ms < WARNING_LEAD_MS {
        return None;
    }
    Some((expires_in_ms - WARNING_LEAD_MS).max(MIN_WARNING_DELAY_MS))
}

struct LifecycleState {
    token: Option<String>,
    user: Option<UserProfile>,
    show_session_warning: bool,
    // Bumped on every cancel so a sleeping timer task can detect that it
    // has been superseded before touching the warning flag.
    timer_generation: u64,
    armed_timer: Option<JoinHandle<()>>,
}

// Owns the token slot, the derived user snapshot and the single warning
// timer. Every mutation, including the timer firing, goes through the
// shared state mutex; the lock is never held across an await point.
pub struct SessionLifecycle<C, S> {
    clock: C,
    store: S,
    state: Arc<Mutex<LifecycleState>>,
}

impl<C, S> SessionLifecycle<C, S>
where
    C: Clock,
    S: SessionStore,
{
    pub fn new(clock: C, store: S) -> Self {
        Self {
            clock,
            store,
            state: Arc::new(Mutex::new(LifecycleState {
                token: None,
                user: None,
                show_session_warning: false,
                timer_generation: 0,
                armed_timer: None,
            })),
        }
    }

    // Rehydrates session state from the durable store at process start.
    // Expired or undecodable stored tokens are cleared without surfacing an
    // error; this is a recovery path, not a user-visible failure.
    pub async fn initialize(&self) {
        let stored = match self.store.read_token().await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "failed to read stored token");
                return;
            }
        };
        let Some(raw) = stored else {
            return;
        };

        let now_ms = self.clock.now_epoch_millis();
        match token::decode(&raw) {
            Ok(identity) => {
                // Saturate so an absurdly large expiry claim reads as
                // far-future instead of wrapping.
                let expires_at_ms = identity.expires_at.saturating_mul(1000);
                if expires_at_ms <= now_ms {
                    warn!("stored token is already expired, clearing storage");
                    self.best_effort_store_clear().await;
                    return;
                }

                let remaining_ms = expires_at_ms - now_ms;
                let user = UserProfile::from_identity(&identity);
                {
                    let mut state = self.state.lock().expect("session state mutex poisoned");
                    state.token = Some(raw);
                    state.user = Some(user);
                }
                self.arm_warning_timer(remaining_ms);
                debug!(remaining_ms, "session restored from storage");
            }
            Err(err) => {
                error!(error = %err, "failed to parse stored token, clearing storage");
                self.best_effort_store_clear().await;
            }
        }
    }

    // Persists and installs a freshly issued token, derives the identity
    // snapshot from its claims, then arms the warning for the new expiry.
    // Any previously armed timer is cancelled first.
    pub async fn establish(&self, raw_token: &str, expires_in_ms: u64) {
        if let Err(err) = self.store.write_token(raw_token).await {
            warn!(error = %err, "failed to persist token");
        }

        // Best-effort snapshot; an undecodable token still counts as an
        // authenticated session and leaves the previous snapshot in place.
        let user = token::decode(raw_token)
            .ok()
            .map(|identity| UserProfile::from_identity(&identity));
        {
            let mut state = self.state.lock().expect("session state mutex poisoned");
            state.token = Some(raw_token.to_string());
            if let Some(user) = user {
                state.user = Some(user);
            }
        }
        self.arm_warning_timer(expires_in_ms);
    }

    // Installs the confirmed profile and refreshes the denormalized cache
    // used for rehydration display.
    pub async fn merge_profile(&self, profile: UserProfile) {
        let cache = ProfileCache {
            user_name: profile.name.clone(),
            user_role: profile.role,
            has_valid_status: profile.has_valid_status,
        };
        {
            let mut state = self.state.lock().expect("session state mutex poisoned");
            state.user = Some(profile);
        }
        if let Err(err) = self.store.write_profile_cache(&cache).await {
            warn!(error = %err, "failed to persist profile cache");
        }
    }

    // Ends the session: cancels the armed timer, forgets the token and
    // profile, and clears durable storage. Safe to call from any state;
    // clearing twice in a row is a no-op the second time.
    pub async fn clear(&self) {
        {
            let mut state = self.state.lock().expect("session state mutex poisoned");
            state.timer_generation += 1;
            if let Some(handle) = state.armed_timer.take() {
                handle.abort();
            }
            state.token = None;
            state.user = None;
            state.show_session_warning = false;
        }
        self.best_effort_store_clear().await;
        debug!("session cleared");
    }

    pub fn token(&self) -> Option<String> {
        self.state
            .lock()
            .expect("session state mutex poisoned")
            .token
            .clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state
            .lock()
            .expect("session state mutex poisoned")
            .user
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .lock()
            .expect("session state mutex poisoned")
            .token
            .is_some()
    }

    pub fn show_session_warning(&self) -> bool {
        self.state
            .lock()
            .expect("session state mutex poisoned")
            .show_session_warning
    }

    // Arms the single warning timer, replacing any previously armed one so
    // a stale timer can never fire for a superseded session.
    fn arm_warning_timer(&self, expires_in_ms: u64) {
        let mut state = self.state.lock().expect("session state mutex poisoned");
        state.timer_generation += 1;
        if let Some(handle) = state.armed_timer.take() {
            handle.abort();
        }
        state.show_session_warning = false;

        let Some(delay_ms) = warning_delay_ms(expires_in_ms) else {
            debug!(
                expires_in_ms,
                "session expires in under a minute, warning immediately"
            );
            state.show_session_warning = true;
            return;
        };

        let generation = state.timer_generation;
        let shared = Arc::clone(&self.state);
        state.armed_timer = Some(tokio::spawn(async move {
            sleep(Duration::from_millis(delay_ms)).await;
            let mut state = shared.lock().expect("session state mutex poisoned");
            // A newer establish or clear supersedes this timer.
            if state.timer_generation == generation {
                state.show_session_warning = true;
                state.armed_timer = None;
            }
        }));
    }

    async fn best_effort_store_clear(&self) {
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear session storage");
        }
    }
}
