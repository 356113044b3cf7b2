pub mod auth;
pub mod chat;
pub mod config;
pub mod conversations;
pub mod health;
pub mod pdfs;
pub mod prediction;
pub mod stats;
