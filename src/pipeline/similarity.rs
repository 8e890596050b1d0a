//! Title similarity shared by deduplication and clustering.
//!
//! `sim(a, b) = 1 - levenshtein(lower(a), lower(b)) / max(chars(a), chars(b), 1)`
//!
//! Range `[0, 1]`, symmetric, `1.0` for strings equal after case folding.

use strsim::levenshtein;

pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count()).max(1);
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}
