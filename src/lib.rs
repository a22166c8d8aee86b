pub mod config;
pub mod error;
pub mod fps;
pub mod geometry;
pub mod landmark;
pub mod mode;
pub mod render;
pub mod replay;
pub mod rig;
pub mod tracker;
