pub mod negotiator;
pub mod state;

pub use negotiator::{LoginNegotiator, LoginOutcome, LoginState};
pub use state::{AuthState, AuthStateHolder};
