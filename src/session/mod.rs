//! Interactive sessions

pub mod controller;
pub mod history;

pub use controller::{render_translation, QueryOutcome, SessionController, SessionOptions};
pub use history::{Session, SessionEntry};
