//! Set similarity primitives.

use std::collections::BTreeSet;

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`.
///
/// Two empty sets are vacuously identical (1.0); an empty set against a
/// non-empty one scores 0.0.
///
/// # Examples
///
/// ```
/// use verdict::consensus::similarity::jaccard;
/// use std::collections::BTreeSet;
///
/// let a: BTreeSet<_> = ["spark", "plug"].into_iter().collect();
/// let b: BTreeSet<_> = ["spark", "coil"].into_iter().collect();
/// assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
/// ```
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Lower-cased alphanumeric words longer than three characters.
pub fn lexical_tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() > 3)
        .map(str::to_lowercase)
        .collect()
}

/// Mean of `f` over every unordered pair of `items`; `None` with fewer than two.
pub(crate) fn pairwise_mean<T>(items: &[T], f: impl Fn(&T, &T) -> f64) -> Option<f64> {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            total += f(a, b);
            pairs += 1;
        }
    }
    (pairs > 0).then(|| total / pairs as f64)
}
