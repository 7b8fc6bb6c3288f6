mod app;
mod bitmaps;
mod controls;
mod dom;
mod render;
mod storage;

pub use app::run;
