//! Wallnance Core - Shared data models, types, and errors

pub mod clock;
pub mod errors;
pub mod models;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{Error, Result};
pub use models::*;
pub use types::*;
