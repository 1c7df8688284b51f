//! Utility modules.

pub mod file;

pub use file::{read_documents, write_documents};
