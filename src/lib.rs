//! xpres: a terminal chat agent that turns natural-language commands into
//! EVM transfers, swaps and balance lookups, and tracks each submitted
//! transaction until the confirmation service reports it confirmed.

pub mod agent;
pub mod bootstrap;
pub mod channels;
pub mod chat;
pub mod cli;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod market;
pub mod settings;
pub mod wallet;

pub use config::Config;
pub use error::Error;
