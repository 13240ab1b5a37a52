pub mod abi;
pub mod chain;
pub mod config;
pub mod engine;
pub mod output;
pub mod rules;
pub mod server;
pub mod tokens;
