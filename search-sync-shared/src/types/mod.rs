//! Type definitions shared across the search sync crates.

mod collection;
mod document;

pub use collection::Collection;
pub use document::{
    BreedDocument, BreedTraits, KennelDocument, ListingDocument, ListingStatus, SearchDocument,
};
