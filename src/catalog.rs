//! Read-only product catalog
//!
//! The catalog is loaded once at startup from a JSON file and never mutated
//! afterwards, so it can be shared across concurrent requests without
//! locking. A missing or unreadable file degrades to an empty catalog: the
//! service still starts and simply returns no results until the data file is
//! provisioned and the process restarted. Refreshing the catalog requires a
//! restart; there is no update path by design.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One product with its precomputed embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub image_url: String,
    /// Precomputed embedding; must share the catalog's dimensionality.
    pub embedding: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// The in-memory catalog. Entry order follows the source file; ranking uses
/// a stable sort, so file order is the deterministic tie-break.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Load the catalog from a JSON file.
    ///
    /// Never fails: an absent, unreadable, or unparsable file yields an empty
    /// catalog with a warning. Availability over correctness - the search
    /// endpoint stays up and serves empty result lists.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "catalog file unavailable, starting with empty catalog");
                return Self::default();
            }
        };

        let entries: Vec<CatalogEntry> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "catalog file unparsable, starting with empty catalog");
                return Self::default();
            }
        };

        let catalog = Self::from_entries(entries);
        tracing::info!(
            path = %path.display(),
            entries = catalog.len(),
            dimension = ?catalog.dimension(),
            "catalog loaded"
        );
        catalog
    }

    /// Build a catalog from already-parsed entries.
    ///
    /// Entries whose embedding length differs from the first entry's are
    /// dropped with a warning: a mismatched vector can never score above
    /// zero, so keeping it would only mask a data-quality problem.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let Some(dimension) = entries.first().map(|e| e.embedding.len()) else {
            return Self::default();
        };

        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.embedding.len() == dimension {
                kept.push(entry);
            } else {
                tracing::warn!(
                    id = entry.id,
                    expected = dimension,
                    actual = entry.embedding.len(),
                    "dropping catalog entry with mismatched embedding dimension"
                );
            }
        }

        Self { entries: kept }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimensionality shared by all entries, if any are loaded.
    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(id: i64, embedding: Vec<f32>) -> CatalogEntry {
        CatalogEntry {
            id,
            name: format!("product-{id}"),
            category: "shoes".to_string(),
            image_url: format!("https://cdn.example.com/{id}.jpg"),
            embedding,
            price: None,
        }
    }

    #[test]
    fn missing_file_yields_empty_catalog() {
        let catalog = Catalog::load(Path::new("/nonexistent/products.json"));
        assert!(catalog.is_empty());
        assert_eq!(catalog.dimension(), None);
    }

    #[test]
    fn unparsable_file_yields_empty_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let catalog = Catalog::load(file.path());
        assert!(catalog.is_empty());
    }

    #[test]
    fn loads_entries_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::json!([
            {
                "id": 1,
                "name": "Red sneaker",
                "category": "shoes",
                "image_url": "https://cdn.example.com/1.jpg",
                "embedding": [0.1, 0.2, 0.3],
                "price": 59.99
            },
            {
                "id": 2,
                "name": "Blue sneaker",
                "category": "shoes",
                "image_url": "https://cdn.example.com/2.jpg",
                "embedding": [0.3, 0.2, 0.1]
            }
        ]);
        file.write_all(json.to_string().as_bytes()).unwrap();

        let catalog = Catalog::load(file.path());
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.dimension(), Some(3));
        assert_eq!(catalog.entries()[0].id, 1);
        assert_eq!(catalog.entries()[0].price, Some(59.99));
        assert_eq!(catalog.entries()[1].price, None);
    }

    #[test]
    fn mismatched_dimension_entries_are_dropped() {
        let catalog = Catalog::from_entries(vec![
            entry(1, vec![1.0, 0.0]),
            entry(2, vec![0.0, 1.0, 0.5]),
            entry(3, vec![0.5, 0.5]),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.dimension(), Some(2));
        let ids: Vec<i64> = catalog.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn entry_order_follows_source_order() {
        let catalog = Catalog::from_entries(vec![
            entry(9, vec![1.0]),
            entry(4, vec![2.0]),
            entry(7, vec![3.0]),
        ]);
        let ids: Vec<i64> = catalog.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![9, 4, 7]);
    }
}
