//! Client for the Krewbi match booking backend.
//!
//! [`KrewbiClient`] talks to the backend's REST, RPC and auth endpoints.
//! [`AuthStore`] mirrors the client's session into application state, and
//! [`MatchDetailView`] drives the register/cancel flow for one match.

mod api;
mod auth_error;
mod callback;
mod client;
mod config;
mod error;
mod model;
mod route;
mod session;
pub mod validation;
mod workflow;

#[cfg(test)]
mod test_support;

pub use auth_error::AuthErrorKind;
pub use callback::{resolve_callback, CallbackParams};
pub use client::KrewbiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{BackendError, KrewbiError, Result};
pub use model::*;
pub use route::Route;
pub use session::{AuthGuard, AuthState, AuthStore, GuardDecision};
pub use workflow::{AvailableActions, MatchDetailView, Notice, Outcome, ViewState};
