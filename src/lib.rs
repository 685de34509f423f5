//! Library crate for buzz-quiz-back, exposing modules for binaries and tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod hardware;
pub mod routes;
pub mod services;
pub mod state;
