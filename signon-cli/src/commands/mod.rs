pub mod completion;
pub mod config;
pub mod login;
pub mod session;
