pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod extraction;
pub mod gateway;
pub mod images;
pub mod insights;
pub mod integrity;
pub mod models;
pub mod orchestrator;
pub mod store;
pub mod tasks;
pub mod tools;
