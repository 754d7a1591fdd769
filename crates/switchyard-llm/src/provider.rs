//! Provider adapters
//!
//! Every vendor integration implements [`ProviderAdapter`]; the executor only
//! ever talks to this trait, so there is no vendor-specific branching in the
//! routing or retry logic.
//!
//! # Module Structure
//!
//! - `adapter`: the adapter trait
//! - `error`: raw failures reported by adapters
//! - `func`: adapter built from an async closure
//! - `mock`: scripted adapter for tests and dry runs

mod adapter;
mod error;
mod func;
mod mock;


pub use adapter::ProviderAdapter;
pub use error::{ProviderError, TransportKind};
pub use func::{DispatchCall, DispatchFuture, FnProvider};
pub use mock::ScriptedProvider;
