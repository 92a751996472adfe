//! Natours API application: configuration, state and route wiring shared by
//! the server binary and the dev-data importer.

pub mod api;
pub mod config;
pub mod dev_data;
pub mod health;
pub mod openapi;
pub mod state;
