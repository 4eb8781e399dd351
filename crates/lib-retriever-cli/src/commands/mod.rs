pub mod libraries;
pub mod retrieve;
pub mod validate;
