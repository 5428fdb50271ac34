//! Cosine similarity and catalog ranking
//!
//! Pure functions with no side effects: a similarity metric over embedding
//! vectors and a top-N ranking pass over the catalog. Anything that cannot
//! be compared meaningfully (length mismatch, zero vector) scores `0.0`
//! instead of failing, so one malformed vector never aborts a ranking pass.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::catalog::{Catalog, CatalogEntry};

/// One ranked search result: the catalog entry minus its embedding, plus the
/// similarity score. Serialized field names match the public API
/// (`similarityScore` is camelCase for wire compatibility).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedResult {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "similarityScore")]
    pub similarity_score: f32,
}

/// Cosine of the angle between `a` and `b`: dot(a,b) / (|a|*|b|).
///
/// Returns `0.0` when the lengths differ, either slice is empty, or either
/// norm is zero. A zero vector has no direction, so it is defined as having
/// no similarity to anything, including itself.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score every catalog entry against `query`, sort descending, keep the top
/// `limit`.
///
/// The sort is stable, so entries with equal scores keep their catalog
/// order - ranking is fully deterministic for identical inputs. An empty
/// catalog yields an empty result list, not an error.
pub fn rank(query: &[f32], catalog: &Catalog, limit: usize) -> Vec<RankedResult> {
    let mut hits: Vec<RankedResult> = catalog
        .entries()
        .iter()
        .map(|entry| score_entry(query, entry))
        .collect();

    hits.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(Ordering::Equal)
    });
    hits.truncate(limit);
    hits
}

fn score_entry(query: &[f32], entry: &CatalogEntry) -> RankedResult {
    RankedResult {
        id: entry.id,
        name: entry.name.clone(),
        category: entry.category.clone(),
        image_url: entry.image_url.clone(),
        price: entry.price,
        similarity_score: cosine_similarity(query, &entry.embedding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

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
    fn cosine_is_symmetric() {
        let a = [0.3, -1.2, 4.0];
        let b = [2.0, 0.5, -0.7];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn cosine_of_vector_with_itself_is_one() {
        let a = [1.0, 2.0, 3.0];
        let sim = cosine_similarity(&a, &a);
        assert!((sim - 1.0).abs() < 1e-6, "got {sim}");
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_of_opposite_vectors_is_minus_one() {
        let sim = cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]);
        assert!((sim + 1.0).abs() < 1e-6, "got {sim}");
    }

    #[test]
    fn length_mismatch_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[]), 0.0);
    }

    #[test]
    fn zero_vector_scores_zero_even_against_itself() {
        let z = [0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&z, &z), 0.0);
        assert_eq!(cosine_similarity(&z, &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn rank_on_empty_catalog_is_empty() {
        let catalog = Catalog::from_entries(Vec::new());
        assert!(rank(&[1.0, 0.0], &catalog, 10).is_empty());
        assert!(rank(&[1.0, 0.0], &catalog, 0).is_empty());
    }

    #[test]
    fn rank_returns_at_most_limit_results() {
        let catalog = Catalog::from_entries(vec![
            entry(1, vec![1.0, 0.0]),
            entry(2, vec![0.0, 1.0]),
            entry(3, vec![0.5, 0.5]),
        ]);
        assert_eq!(rank(&[1.0, 0.0], &catalog, 2).len(), 2);
        assert_eq!(rank(&[1.0, 0.0], &catalog, 10).len(), 3);
    }

    #[test]
    fn rank_orders_scores_descending() {
        let catalog = Catalog::from_entries(vec![
            entry(1, vec![0.0, 1.0]),
            entry(2, vec![1.0, 0.0]),
            entry(3, vec![0.7, 0.7]),
        ]);
        let hits = rank(&[1.0, 0.0], &catalog, 10);
        for pair in hits.windows(2) {
            assert!(pair[0].similarity_score >= pair[1].similarity_score);
        }
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn rank_breaks_ties_by_catalog_order() {
        // Two entries tied at 1.0 must come back in catalog order, the
        // orthogonal entry last at 0.0.
        let catalog = Catalog::from_entries(vec![
            entry(1, vec![1.0, 0.0]),
            entry(2, vec![0.0, 1.0]),
            entry(3, vec![1.0, 0.0]),
        ]);
        let hits = rank(&[1.0, 0.0], &catalog, 10);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 3);
        assert_eq!(hits[2].id, 2);
        assert!((hits[0].similarity_score - 1.0).abs() < 1e-6);
        assert!((hits[1].similarity_score - 1.0).abs() < 1e-6);
        assert_eq!(hits[2].similarity_score, 0.0);
    }

    #[test]
    fn rank_does_not_mutate_catalog() {
        let catalog = Catalog::from_entries(vec![
            entry(1, vec![0.0, 1.0]),
            entry(2, vec![1.0, 0.0]),
        ]);
        let _ = rank(&[1.0, 0.0], &catalog, 1);
        let ids: Vec<i64> = catalog.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn ranked_result_serializes_camel_case_score() {
        let hit = RankedResult {
            id: 1,
            name: "Red sneaker".into(),
            category: "shoes".into(),
            image_url: "https://cdn.example.com/1.jpg".into(),
            price: None,
            similarity_score: 0.5,
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert!(json.get("similarityScore").is_some());
        assert!(json.get("price").is_none());
    }
}
