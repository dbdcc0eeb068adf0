// Domain layer: session entities, ports and the token codec.

pub mod api;
pub mod entities;
pub mod errors;
pub mod ports;
pub mod token;

pub use entities::{DecodedIdentity, SessionSnapshot, UserProfile, UserRole};
