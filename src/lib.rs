pub mod api;
pub mod app;
pub mod events;
pub mod typing;
pub mod ui;
