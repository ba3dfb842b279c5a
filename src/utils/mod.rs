pub mod expr;
pub mod format;
pub mod questions;
pub mod time;
