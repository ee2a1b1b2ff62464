//! Data models for Faultwatch

mod alert;
mod notification;

pub use alert::*;
pub use notification::*;
