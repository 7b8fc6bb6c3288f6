pub mod catalog;
pub mod geometry;
pub mod gesture;
pub mod scene;
