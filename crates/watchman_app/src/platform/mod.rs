pub mod app;
pub mod config;
pub mod effects;
pub mod render;
pub mod selection;
