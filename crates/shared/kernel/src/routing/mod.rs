pub mod catalog;
pub mod convention;
pub mod endpoint;
