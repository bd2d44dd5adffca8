pub mod auth;

pub use auth::{CallerAuth, OptionalCallerAuth};
