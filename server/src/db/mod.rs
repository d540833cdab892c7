//! Database module for PostgreSQL persistence.

mod audit;
mod containers;
mod items;
mod pool;

pub use audit::*;
pub use containers::*;
pub use items::*;
pub use pool::*;
