#![allow(clippy::needless_pass_by_value)]

#[cfg(target_arch = "wasm32")]
pub mod app;
pub mod completion_prompt;
pub mod context_menu;
pub mod dialog;
pub mod editor_ui;
pub mod hover_label;
pub mod mode_toolbar;
pub mod node_form;
pub mod segment_form;
pub mod toast;
