//! Shared test fixtures for the Tree Mirror workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: file helpers that stamp a fixed modification time
//! - [`pair`]: [`TreePair`] builder for a source/target directory pair

pub mod pair;
pub mod tree;

pub use pair::TreePair;
