pub mod braille;
pub mod config;
pub mod data;
pub mod logging;
pub mod map;
