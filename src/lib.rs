pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod navigation;
pub mod normalize;
pub mod screen;
pub mod toggle;
