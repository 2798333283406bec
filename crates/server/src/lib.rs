pub mod clients;
pub mod config;
pub mod error;
pub mod prompts;
pub mod routes;
