//! Shared note service: a named text blob with last-write-wins
//! persistence, plus the client-side autosave controller.

pub mod client;
pub mod config;
pub mod dto;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
