//! # Search Sync Shared
//!
//! Shared types and data structures for the Doghouse search sync pipeline.

pub mod types;

pub use types::{
    BreedDocument, BreedTraits, Collection, KennelDocument, ListingDocument, ListingStatus,
    SearchDocument,
};
