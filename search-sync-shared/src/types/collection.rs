//! Source collection identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three source collections kept in sync with the search backend.
///
/// Every synchronized document belongs to exactly one collection, and each
/// collection maps to its own search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Dog breed reference documents.
    Breeds,
    /// Kennel (breeder) profiles.
    Kennels,
    /// Marketplace listings.
    Listings,
}

impl Collection {
    /// All collections, in the order the full sync driver visits them.
    pub const ALL: [Collection; 3] = [Collection::Breeds, Collection::Kennels, Collection::Listings];

    /// The collection name as used by the source store.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Breeds => "breeds",
            Collection::Kennels => "kennels",
            Collection::Listings => "listings",
        }
    }

    /// The search index alias for this collection.
    pub fn index_alias(&self) -> &'static str {
        match self {
            Collection::Breeds => "doghouse-breeds",
            Collection::Kennels => "doghouse-kennels",
            Collection::Listings => "doghouse-listings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breeds" => Ok(Collection::Breeds),
            "kennels" => Ok(Collection::Kennels),
            "listings" => Ok(Collection::Listings),
            other => Err(format!("unknown collection: {other}")),
        }
    }
}
