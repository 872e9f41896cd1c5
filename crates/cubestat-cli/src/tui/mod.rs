pub mod app;
pub mod palette;
pub mod ui;
