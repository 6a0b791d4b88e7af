#![allow(clippy::implicit_hasher)]

pub mod logging;
pub mod constants;
pub mod geometry;
pub mod models;
pub mod editor;
pub mod persistence;
pub mod routing;
pub mod session;
pub mod map;
pub mod components;

#[cfg(target_arch = "wasm32")]
pub use components::app::App;
