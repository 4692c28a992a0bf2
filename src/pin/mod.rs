mod pin_engine;
mod pin_models;

pub use pin_engine::{EngineSettings, PinEngine, MAX_MEMO_CHARS};
pub use pin_models::*;
