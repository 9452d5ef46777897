pub mod api;
pub mod config;
pub mod datauri;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod upload;
