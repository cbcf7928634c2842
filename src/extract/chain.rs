//! Ordered fallback chains
//!
//! Each field is resolved by a [`Chain`]: a fixed, ordered list of pure
//! strategies evaluated until the first one yields a usable value. Later
//! strategies never run once an earlier one succeeds, so chain order decides
//! which source wins when sources disagree.

use super::page::ProductPage;

/// Values a strategy can produce, with their own notion of "usable"
pub trait Candidate {
    fn is_usable(&self) -> bool;
}

impl Candidate for String {
    fn is_usable(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl<T> Candidate for Vec<T> {
    fn is_usable(&self) -> bool {
        !self.is_empty()
    }
}

/// One named extraction attempt
pub struct Strategy<T> {
    pub name: &'static str,
    pub run: fn(&ProductPage) -> Option<T>,
}

impl<T> Strategy<T> {
    pub const fn new(name: &'static str, run: fn(&ProductPage) -> Option<T>) -> Self {
        Self { name, run }
    }
}

/// A value together with the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub strategy: &'static str,
    pub value: T,
}

/// An ordered list of strategies for one field
pub struct Chain<T: 'static> {
    field: &'static str,
    strategies: &'static [Strategy<T>],
}

impl<T: Candidate + 'static> Chain<T> {
    pub const fn new(field: &'static str, strategies: &'static [Strategy<T>]) -> Self {
        Self { field, strategies }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Strategy names in evaluation order
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name).collect()
    }

    /// Runs strategies in order and returns the first usable value
    pub fn resolve(&self, page: &ProductPage) -> Option<Resolved<T>> {
        for strategy in self.strategies {
            if let Some(value) = (strategy.run)(page).filter(Candidate::is_usable) {
                tracing::debug!(
                    field = self.field,
                    strategy = strategy.name,
                    "Resolved field"
                );
                return Some(Resolved {
                    strategy: strategy.name,
                    value,
                });
            }
        }

        tracing::debug!(field = self.field, url = page.url(), "No strategy matched");
        None
    }

    /// Like [`Chain::resolve`], dropping the strategy name
    pub fn value(&self, page: &ProductPage) -> Option<T> {
        self.resolve(page).map(|r| r.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nothing(_: &ProductPage) -> Option<String> {
        None
    }

    fn blank(_: &ProductPage) -> Option<String> {
        Some("   ".to_string())
    }

    fn first(_: &ProductPage) -> Option<String> {
        Some("first".to_string())
    }

    fn second(_: &ProductPage) -> Option<String> {
        Some("second".to_string())
    }

    static CHAIN: Chain<String> = Chain::new(
        "demo",
        &[
            Strategy::new("nothing", nothing),
            Strategy::new("blank", blank),
            Strategy::new("first", first),
            Strategy::new("second", second),
        ],
    );

    #[test]
    fn test_first_usable_value_wins() {
        let page = ProductPage::parse("https://example.com/", "<html></html>");
        let resolved = CHAIN.resolve(&page).unwrap();
        assert_eq!(resolved.strategy, "first");
        assert_eq!(resolved.value, "first");
    }

    #[test]
    fn test_names_keep_order() {
        assert_eq!(CHAIN.names(), vec!["nothing", "blank", "first", "second"]);
        assert_eq!(CHAIN.field(), "demo");
    }

    #[test]
    fn test_empty_vec_is_not_usable() {
        assert!(!Vec::<u8>::new().is_usable());
        assert!(vec![1u8].is_usable());
    }
}
