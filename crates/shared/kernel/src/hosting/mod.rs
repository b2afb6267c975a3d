pub mod background;
pub mod lifecycle;
