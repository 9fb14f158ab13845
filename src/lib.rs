pub mod app;
pub mod config;
pub mod diagnostics;
pub mod mock;
pub mod models;
pub mod reconciler;
pub mod screens;
pub mod store;
pub mod tmdb;
pub mod trending;
