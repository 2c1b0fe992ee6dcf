//! Document types indexed into the search backend.
//!
//! These are denormalized read models, one per indexed collection. The `id`
//! field of every document is the primary key of the corresponding record in
//! the source-of-truth store; the search index reuses it as the document id,
//! which is what makes upserts and deletes idempotent and safe to replay.

use serde::{Deserialize, Serialize};

use crate::types::Collection;

/// Structured trait scores attached to a breed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedTraits {
    /// Energy level, 1-5.
    pub energy: u8,
    /// Friendliness towards strangers, 1-5.
    pub friendliness: u8,
    /// Grooming effort, 1-5.
    pub grooming: u8,
    /// Trainability, 1-5.
    pub trainability: u8,
}

/// Breed reference document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedDocument {
    /// Source-store primary key (e.g. "breed-0001"). Immutable.
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Categorical breed group (e.g. "herding", "toy").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Size class (e.g. "small", "medium", "large").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Searchable care requirement tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub care_requirements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<BreedTraits>,
}

/// Kennel (breeder) profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KennelDocument {
    /// Source-store primary key. Immutable.
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Identifier of the user that owns the kennel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Services offered by the kennel (e.g. "boarding", "stud").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
}

/// Availability status of a marketplace listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    Sold,
    Reserved,
}

/// Marketplace listing document.
///
/// Breed and kennel names are denormalized onto the listing so a single index
/// lookup can render a search result without joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDocument {
    /// Source-store primary key. Immutable.
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kennel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kennel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub status: ListingStatus,
}

/// Tagged union over the three indexable document variants.
///
/// Everything that flows from the source store to the index upsert writer is
/// one of these variants, validated on construction, so no untyped JSON
/// reaches the writer.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchDocument {
    Breed(BreedDocument),
    Kennel(KennelDocument),
    Listing(ListingDocument),
}

impl SearchDocument {
    /// The join-key identifier shared with the source store.
    pub fn id(&self) -> &str {
        match self {
            SearchDocument::Breed(doc) => &doc.id,
            SearchDocument::Kennel(doc) => &doc.id,
            SearchDocument::Listing(doc) => &doc.id,
        }
    }

    /// The collection this document belongs to.
    pub fn collection(&self) -> Collection {
        match self {
            SearchDocument::Breed(_) => Collection::Breeds,
            SearchDocument::Kennel(_) => Collection::Kennels,
            SearchDocument::Listing(_) => Collection::Listings,
        }
    }

    /// Validate the required field set.
    ///
    /// At minimum the join-key identifier must be present and non-blank;
    /// serde already enforces the per-variant required fields on decode.
    pub fn validate(&self) -> Result<(), String> {
        let id = self.id();
        if id.trim().is_empty() {
            return Err(format!(
                "document in collection '{}' is missing its identifier",
                self.collection()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breed(id: &str) -> BreedDocument {
        BreedDocument {
            id: id.to_string(),
            name: "Border Collie".to_string(),
            description: Some("Workaholic herding dog".to_string()),
            group: Some("herding".to_string()),
            size: Some("medium".to_string()),
            care_requirements: vec!["daily exercise".to_string()],
            traits: Some(BreedTraits {
                energy: 5,
                friendliness: 4,
                grooming: 3,
                trainability: 5,
            }),
        }
    }

    #[test]
    fn test_join_key_accessor() {
        let doc = SearchDocument::Breed(breed("breed-0001"));
        assert_eq!(doc.id(), "breed-0001");
        assert_eq!(doc.collection(), Collection::Breeds);
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        let doc = SearchDocument::Breed(breed("  "));
        assert!(doc.validate().is_err());
        let doc = SearchDocument::Breed(breed("breed-0001"));
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_listing_status_defaults_to_active() {
        let listing: ListingDocument = serde_json::from_str(
            r#"{"id": "listing-1", "title": "Two pups available"}"#,
        )
        .unwrap();
        assert_eq!(listing.status, ListingStatus::Active);
    }

    #[test]
    fn test_listing_status_serde_lowercase() {
        let listing: ListingDocument = serde_json::from_str(
            r#"{"id": "listing-1", "title": "Pup", "status": "reserved"}"#,
        )
        .unwrap();
        assert_eq!(listing.status, ListingStatus::Reserved);

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["status"], "reserved");
    }

    #[test]
    fn test_optional_fields_omitted_from_index_payload() {
        let kennel = KennelDocument {
            id: "kennel-1".to_string(),
            name: "Hilltop Kennels".to_string(),
            location: None,
            owner_id: None,
            services: vec![],
        };
        let json = serde_json::to_value(&kennel).unwrap();
        assert!(json.get("location").is_none());
        assert!(json.get("services").is_none());
    }
}
