//! Refer Core Library
//!
//! Core logic for the reference library: document store, date
//! normalization, redirect resolution and index building.
//! No protocol concerns, file IO only.
//!

pub mod error;
pub mod index;
pub mod model;
pub mod normalize;
pub mod redirect;
pub mod store;

pub use error::LibraryError;
pub use index::{Index, IndexBuilder};
pub use model::{DocKey, Document, LibraryEntry};
pub use store::LibraryStore;
