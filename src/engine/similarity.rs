use std::collections::{HashMap, HashSet};

use crate::models::Course;

/// Minimum token length kept when tokenizing a course name
const MIN_TOKEN_LEN: usize = 3;

/// Pairwise course-name similarity scores for one request.
///
/// Built once over the sanitized catalog and discarded when the request
/// completes. Scores are token overlap over the larger token set, so they
/// are symmetric and land in [0, 1].
///
/// Construction is O(C² · avgTokens). Fine for catalogs of a few hundred
/// courses; an inverted token index would be the next step beyond that.
pub struct SimilarityIndex {
    known: HashSet<u64>,
    // keyed by (smaller id, larger id); zero scores are not stored
    scores: HashMap<(u64, u64), f64>,
}

impl SimilarityIndex {
    pub fn build(courses: &[Course]) -> Self {
        let tokenized: Vec<(u64, HashSet<String>)> = courses
            .iter()
            .map(|c| (c.id, tokenize(&c.name)))
            .collect();

        let mut scores = HashMap::new();
        for (i, (id_a, tokens_a)) in tokenized.iter().enumerate() {
            for (id_b, tokens_b) in tokenized.iter().skip(i + 1) {
                let score = token_overlap(tokens_a, tokens_b);
                if score > 0.0 {
                    scores.insert(pair_key(*id_a, *id_b), score);
                }
            }
        }

        tracing::debug!(
            courses = courses.len(),
            scored_pairs = scores.len(),
            "Built course similarity index"
        );

        Self {
            known: courses.iter().map(|c| c.id).collect(),
            scores,
        }
    }

    /// Similarity for a course pair; identity is 1.0 and any unknown pair
    /// is 0 rather than an error.
    pub fn get_similarity(&self, a: u64, b: u64) -> f64 {
        if a == b {
            return if self.known.contains(&a) { 1.0 } else { 0.0 };
        }
        self.scores.get(&pair_key(a, b)).copied().unwrap_or(0.0)
    }
}

fn pair_key(a: u64, b: u64) -> (u64, u64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Lowercases, splits on whitespace and keeps tokens longer than two
/// characters.
fn tokenize(name: &str) -> HashSet<String> {
    name.to_lowercase()
        .split_whitespace()
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(|t| t.to_string())
        .collect()
}

/// |A ∩ B| / max(|A|, |B|); 0 when either set is empty.
fn token_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / a.len().max(b.len()) as f64
}
