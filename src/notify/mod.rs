//! Human-review notifications

mod webhook;

pub use webhook::*;
