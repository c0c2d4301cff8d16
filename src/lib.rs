pub mod api;
pub mod builder;
pub mod config;
pub mod modules;
