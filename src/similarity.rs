//! Vector similarity ranking for retrieval augmentation
//!
//! Full scan over all candidates per call, O(n * d). Fine while the todo
//! store stays small; a vector index is the known fix if it ever is not.

use ordered_float::OrderedFloat;

/// Compute cosine similarity between two vectors.
///
/// A mismatched-length or zero-magnitude pair scores 0.0 rather than
/// erroring, so one malformed record cannot abort ranking of the rest.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Find the top-k most similar candidates, descending by score.
///
/// Ties keep insertion order (the sort is stable).
pub fn top_k_similar<T>(query: &[f32], candidates: &[(Vec<f32>, T)], k: usize) -> Vec<(f32, T)>
where
    T: Clone,
{
    let mut scored: Vec<(OrderedFloat<f32>, T)> = candidates
        .iter()
        .map(|(vec, item)| {
            let score = cosine_similarity(query, vec);
            (OrderedFloat(score), item.clone())
        })
        .collect();

    // Sort by score descending
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(k)
        .map(|(score, item)| (score.0, item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let a = vec![0.3, 0.5, -0.2];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_antiparallel() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_mismatched_length_is_zero() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_zero_magnitude_is_zero() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_top_k_selects_three_highest_descending() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            (vec![0.2, 1.0], "low"),
            (vec![1.0, 0.0], "best"),
            (vec![0.5, 0.5], "mid"),
            (vec![-1.0, 0.0], "worst"),
            (vec![0.9, 0.1], "second"),
        ];

        let top = top_k_similar(&query, &candidates, 3);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].1, "best");
        assert_eq!(top[1].1, "second");
        assert_eq!(top[2].1, "mid");
        assert!(top[0].0 >= top[1].0 && top[1].0 >= top[2].0);
    }

    #[test]
    fn test_ties_preserve_insertion_order() {
        let query = vec![1.0, 0.0];
        // First and third are identical directions, so identical scores.
        let candidates = vec![
            (vec![2.0, 0.0], "first"),
            (vec![0.0, 1.0], "orthogonal"),
            (vec![4.0, 0.0], "third"),
        ];

        let top = top_k_similar(&query, &candidates, 3);

        assert_eq!(top[0].1, "first");
        assert_eq!(top[1].1, "third");
        assert_eq!(top[2].1, "orthogonal");
    }

    #[test]
    fn test_malformed_candidate_does_not_outrank_valid_ones() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            (vec![], "empty"),
            (vec![1.0, 0.0, 0.0], "wrong-dim"),
            (vec![0.8, 0.6], "valid"),
        ];

        let top = top_k_similar(&query, &candidates, 3);

        assert_eq!(top[0].1, "valid");
        assert_eq!(top[0].0, 0.8);
        // Malformed entries score 0 and fall behind, in insertion order.
        assert_eq!(top[1].1, "empty");
        assert_eq!(top[2].1, "wrong-dim");
    }
}
