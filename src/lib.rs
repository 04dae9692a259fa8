//! Mess management client library.
//!
//! This module re-exports the core components for testing and extension.

pub mod auth;
pub mod backend;
pub mod buffer;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod entries;
pub mod error;
pub mod events;
pub mod feed;
pub mod input_state;
pub mod logging;
pub mod model;
pub mod products;
pub mod protocol;
pub mod session;
pub mod state;
pub mod store;
pub mod validation;

#[cfg(test)]
mod integration_tests;
