pub mod datetime;
pub mod loader;
pub mod sample;
pub mod source;
