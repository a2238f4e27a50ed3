pub mod api;
pub mod app;
pub mod artifacts;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod genai;
pub mod global;
pub mod history;
pub mod lifecycle;
pub mod service;
pub mod session;
pub mod store;
pub mod summarize;
