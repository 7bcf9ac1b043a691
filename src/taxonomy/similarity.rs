// Edit-distance similarity and best-candidate selection

/// Slack for float comparisons so that e.g. `1 - 1/5` counts as meeting a 0.8 threshold.
const SCORE_EPSILON: f64 = 1e-9;

/// Normalized Levenshtein similarity in [0, 1]: `1 - distance / max(len(a), len(b))`,
/// lengths counted in characters.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Inclusive threshold check.
pub fn meets_threshold(score: f64, threshold: f64) -> bool {
    score + SCORE_EPSILON >= threshold
}

/// Number of leading characters `a` and `b` have in common.
pub fn shared_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub key: &'a str,
    pub score: f64,
}

/// Picks the candidate most similar to `label` among those meeting `threshold`.
///
/// Ties on score go to the longer shared prefix with `label`, then to the candidate
/// seen first.
pub fn best_match<'a, I>(label: &str, candidates: I, threshold: f64) -> Option<Match<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(Match<'a>, usize)> = None;

    for key in candidates {
        let score = similarity(label, key);
        if !meets_threshold(score, threshold) {
            continue;
        }
        let prefix = shared_prefix_len(label, key);
        let better = match &best {
            None => true,
            Some((current, current_prefix)) => {
                score > current.score + SCORE_EPSILON
                    || ((score - current.score).abs() <= SCORE_EPSILON && prefix > *current_prefix)
            }
        };
        if better {
            best = Some((Match { key, score }, prefix));
        }
    }

    best.map(|(m, _)| m)
}
