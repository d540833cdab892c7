//! Request handlers for container, item and audit operations.

mod audit;
mod containers;
mod items;

pub use audit::*;
pub use containers::*;
pub use items::*;
