pub mod domain;
pub mod interface_adapters;
pub mod use_cases;

pub use domain::api::{
    AuthApi, AuthTokenResponse, LoginRequest, MessageMap, RegisterRequest, ResponseMap,
    UserInfoResponse,
};
pub use domain::entities::{DecodedIdentity, ProfileCache, SessionSnapshot, UserProfile, UserRole};
pub use domain::errors::{ApiFailure, ProfileConfirmationError, TokenDecodeError};
pub use domain::ports::{Clock, SessionStore};
pub use interface_adapters::state::{FileSessionStore, InMemorySessionStore, SystemClock};
pub use use_cases::api_call::ApiCall;
pub use use_cases::coordinator::SessionCoordinator;
pub use use_cases::session_lifecycle::SessionLifecycle;
