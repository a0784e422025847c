pub mod session;
pub mod window;
