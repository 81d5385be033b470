//! File format parsing and manipulation.

pub mod jpeg;
pub mod tiff;
