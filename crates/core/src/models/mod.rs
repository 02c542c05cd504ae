//! Data models for Wallnance entities

mod asset;
mod portfolio;
mod progress;
mod reward;
mod settings;
mod trade;

pub use asset::*;
pub use portfolio::*;
pub use progress::*;
pub use reward::*;
pub use settings::*;
pub use trade::*;
