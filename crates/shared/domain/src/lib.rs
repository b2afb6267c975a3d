//! # Domain Models
//!
//! Pure data shared by the Host and every module: the process configuration,
//! the hosting environment description and a handful of constants.
//! Keep it lean: no I/O, networking, or heavy logic, just data and simple helpers.

pub mod config;
pub mod constants;
pub mod environment;
