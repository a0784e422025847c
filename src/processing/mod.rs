pub mod forecast;
pub mod statistics;
pub mod timeline;
