// src/release/mod.rs

//! Release resolution: use the release the caller named, or build one.

pub mod resolver;

pub use resolver::resolve_release;
