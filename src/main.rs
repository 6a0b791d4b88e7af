#![warn(clippy::complexity)]
#![warn(clippy::perf)]
#![warn(clippy::style)]
#![warn(clippy::suspicious)]

#[cfg(target_arch = "wasm32")]
fn main() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(trail_editor::App);
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!("trail_editor runs in the browser; build it for wasm32-unknown-unknown");
}
