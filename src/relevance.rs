//! Keyword relevance filter.
//!
//! A blunt, recall-favoring check: a text is relevant when it contains any
//! configured keyword, compared case-insensitively. There is no scoring.

/// The immutable, lowercased keyword set built once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn is_relevant(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbreak_keywords() -> KeywordSet {
        KeywordSet::new(["outbreak", "virus", "health emergency", "Influenza"])
    }

    #[test]
    fn test_matches_any_keyword_case_insensitively() {
        let keywords = outbreak_keywords();
        assert!(keywords.is_relevant("New Ebola OUTBREAK reported"));
        assert!(keywords.is_relevant("Avian influenza detected in poultry"));
        assert!(keywords.is_relevant("WHO declares a Health Emergency"));
    }

    #[test]
    fn test_substring_matches_count() {
        // "viruses" contains "virus"; recall wins over precision.
        assert!(outbreak_keywords().is_relevant("Novel viruses catalogued"));
    }

    #[test]
    fn test_no_keyword_is_not_relevant() {
        assert!(!outbreak_keywords().is_relevant("Annual budget review"));
        assert!(!outbreak_keywords().is_relevant(""));
    }

    #[test]
    fn test_blank_keywords_are_dropped() {
        let keywords = KeywordSet::new(["", "  ", "disease"]);
        assert_eq!(keywords.len(), 1);
        assert!(!keywords.is_relevant("anything at all"));
    }
}
