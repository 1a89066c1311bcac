pub mod catalog;
pub mod config;
pub mod http_client;
pub mod provider;
pub mod state;
pub mod suggest;
