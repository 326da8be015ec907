use crate::error::FinderError;

pub const DEFAULT_THRESHOLD: f64 = 0.6;

pub trait Similar: Send + Sync {
    fn similars<'c>(&self, query: &str, candidates: &[&'c str]) -> Vec<&'c str>;
}

// Matches when `1 - distance / longest` (case-folded) reaches the threshold,
// or when the candidate contains the query verbatim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenshteinMatcher {
    threshold: f64,
}

impl LevenshteinMatcher {
    pub fn new(threshold: f64) -> Result<Self, FinderError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(FinderError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_match(&self, query: &str, candidate: &str) -> bool {
        candidate.contains(query) || similarity(query, candidate) >= self.threshold
    }
}

impl Default for LevenshteinMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Similar for LevenshteinMatcher {
    fn similars<'c>(&self, query: &str, candidates: &[&'c str]) -> Vec<&'c str> {
        if query.is_empty() {
            return Vec::new();
        }
        candidates
            .iter()
            .copied()
            .filter(|candidate| self.is_match(query, candidate))
            .collect()
    }
}

pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    (longest - levenshtein(&a, &b)) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn distance_basics() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(levenshtein(&chars(""), &chars("abc")), 3);
        assert_eq!(levenshtein(&chars("same"), &chars("same")), 0);
    }

    #[test]
    fn similarity_is_case_folded() {
        assert_eq!(similarity("Marvin", "marvin"), 1.0);
        assert!((similarity("sorce", "source") - 5.0 / 6.0).abs() < 1e-9);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn matcher_accepts_typos_and_substrings() {
        let matcher = LevenshteinMatcher::default();
        let candidates = ["source", "source=the world", "raw=txt", "txt"];
        let hits = matcher.similars("sorce", &candidates);
        assert_eq!(hits, vec!["source"]);

        let hits = matcher.similars("the", &candidates);
        assert_eq!(hits, vec!["source=the world"]);
    }

    #[test]
    fn substring_is_case_sensitive() {
        let matcher = LevenshteinMatcher::default();
        assert!(matcher.is_match("Me", "anotherMe"));
        assert!(!matcher.is_match("ME", "anotherMe"));
    }

    #[test]
    fn similarity_at_threshold_matches() {
        assert_eq!(similarity("brxvx", "bravo"), 0.6);
        assert!(LevenshteinMatcher::default().is_match("brxvx", "bravo"));
        assert!(!LevenshteinMatcher::new(0.61).unwrap().is_match("brxvx", "bravo"));
    }

    #[test]
    fn empty_query_matches_nothing() {
        let matcher = LevenshteinMatcher::default();
        assert!(matcher.similars("", &["a", "b"]).is_empty());
    }

    #[test]
    fn threshold_bounds() {
        assert_matches!(
            LevenshteinMatcher::new(0.0),
            Err(FinderError::InvalidThreshold(_))
        );
        assert_matches!(
            LevenshteinMatcher::new(1.5),
            Err(FinderError::InvalidThreshold(_))
        );
        assert_eq!(LevenshteinMatcher::new(0.8).unwrap().threshold(), 0.8);
    }
}
