pub mod admin;
pub mod automation;
pub mod config;
pub mod credentials;
pub mod knowledge;
pub mod store;
pub mod terminal;
