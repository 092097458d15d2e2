//! Filesystem primitives for Tree Mirror
//!
//! Provides separator-normalized paths, recoverable deletion, metadata
//! preserving copies and safe configuration I/O.

pub mod config;
pub mod copy;
pub mod error;
pub mod io;
pub mod path;
pub mod relative;
pub mod trash;

pub use config::ConfigStore;
pub use copy::{copy_file, copy_tree};
pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use relative::RelativePath;
pub use self::trash::{DirectoryTrash, SystemTrash, TrashStore};
