//! Client-side session and activity lifecycle core for the Tandem HR
//! console.
//!
//! The crate keeps a logged-in session alive and tears it down cleanly:
//! - the request pipeline ([`http::HttpClient`]) attaches the bearer
//!   credential to every call, toggles the shared busy indicator and
//!   resolves authentication-class failures centrally;
//! - the activity tracker ([`session::ActivityTracker`]) watches for user
//!   input, warns before the idle timeout and sends heartbeats while the
//!   user is genuinely active;
//! - the login negotiator ([`auth::LoginNegotiator`]) exchanges the
//!   provider authorization code for a credential and mediates
//!   concurrent-login conflicts;
//! - the auth state holder ([`auth::AuthStateHolder`]) is the single,
//!   persisted source of "am I logged in / who am I".
//!
//! The hosting shell (views, modals, routing) stays outside: it forwards
//! input signals in and interprets [`diagnostic::SessionEvent`]s coming
//! out.

pub mod auth;
pub mod busy;
pub mod client;
pub mod clients;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod http;
pub mod models;
pub mod session;
pub mod storage;
pub mod utils;

pub use auth::{AuthState, AuthStateHolder, LoginNegotiator, LoginOutcome, LoginState};
pub use client::AuthClient;
pub use clients::TandemClient;
pub use config::{ClientConfig, TrackerConfig};
pub use diagnostic::SessionEvent;
pub use error::{AuthFailureReason, ClientError};
pub use models::identity::Identity;
pub use models::session::{SessionConflict, SessionInfo};
