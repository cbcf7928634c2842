//! Keyword relevance predicate
//!
//! Discovery is deliberately over-inclusive; this filter decides which links
//! are worth visiting and which extracted products are kept.

use crate::config::RelevanceConfig;
use crate::ConfigError;
use regex::Regex;

#[derive(Debug, Clone)]
enum Keyword {
    /// Single words match only as whole words ("rim" does not match "trim")
    Word(Regex),
    /// Multi-word keywords match as plain substrings
    Phrase(String),
}

impl Keyword {
    fn matches(&self, text: &str) -> bool {
        match self {
            Keyword::Word(re) => re.is_match(text),
            Keyword::Phrase(phrase) => text.contains(phrase.as_str()),
        }
    }
}

/// Keyword / exclusion predicate over titles, URLs and link text
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<(String, Keyword)>,
    exclude: Vec<String>,
}

impl RelevanceFilter {
    /// Builds a filter from configured keyword lists
    pub fn new(config: &RelevanceConfig) -> Result<Self, ConfigError> {
        let keywords = config
            .keywords
            .iter()
            .map(|k| {
                let k = normalize(k);
                let keyword = if k.split_whitespace().count() == 1 {
                    let pattern = format!(r"\b{}\b", regex::escape(&k));
                    Keyword::Word(Regex::new(&pattern).map_err(|e| {
                        ConfigError::InvalidPattern(format!("keyword '{}': {}", k, e))
                    })?)
                } else {
                    Keyword::Phrase(k.clone())
                };
                Ok((k, keyword))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let exclude = config.exclude.iter().map(|k| normalize(k)).collect();

        Ok(Self { keywords, exclude })
    }

    /// Whether `text` is relevant
    ///
    /// Exclusions are checked first and veto any keyword match.
    pub fn matches(&self, text: &str) -> bool {
        self.matched_keyword(text).is_some()
    }

    /// The keyword that made `text` relevant, if any
    pub fn matched_keyword(&self, text: &str) -> Option<&str> {
        let text = normalize(text);

        if let Some(excluded) = self.exclude.iter().find(|e| text.contains(e.as_str())) {
            tracing::trace!("Excluded '{}' (matched '{}')", text, excluded);
            return None;
        }

        self.keywords
            .iter()
            .find(|(_, keyword)| keyword.matches(&text))
            .map(|(k, _)| k.as_str())
    }

    /// Whether a discovered link is relevant, judged on its URL and anchor text together
    pub fn matches_link(&self, url: &str, link_text: &str) -> bool {
        self.matches(&format!("{} {}", url, link_text))
    }
}

/// Lowercases and turns `-` and `_` into spaces
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['-', '_'], " ")
}
