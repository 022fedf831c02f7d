pub mod client;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod html;
pub mod news;
pub mod render;
pub mod telemetry;
pub mod theme;
pub mod toolbar;
pub mod upload;
