// Interface adapters layer: concrete clock and storage implementations
// behind the domain ports.

pub mod state;

pub use state::{FileSessionStore, InMemorySessionStore, SystemClock};
