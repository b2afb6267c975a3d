pub mod contract;
pub mod descriptor;
pub mod registry;
