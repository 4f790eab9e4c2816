pub mod admin_console;
pub mod config;
pub mod format;
pub mod level_progress;
pub mod manage_levels;
pub mod manage_users;
pub mod order_editor;
pub mod sales_panel;
pub mod services;
pub mod session;
pub mod staff_console;

#[cfg(not(target_arch = "wasm32"))]
pub mod auth;
#[cfg(not(target_arch = "wasm32"))]
pub mod dev_server;
