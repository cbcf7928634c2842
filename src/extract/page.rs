//! Parsed product page and the query helpers every strategy shares

use crate::url::absolutize;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static TITLE_TAG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static JSON_SCRIPT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "script#product_data, \
         script[type='application/json'], \
         script[type='application/ld+json']",
    )
    .unwrap()
});

/// Site-level facts strategies need besides the markup
#[derive(Debug, Clone)]
pub struct PageHints {
    /// Default make for list and table fitments, stripped from model names
    pub manufacturer: String,

    /// Meta descriptions at or below this length are boilerplate
    pub min_meta_description_chars: usize,
}

impl Default for PageHints {
    fn default() -> Self {
        Self {
            manufacturer: String::new(),
            min_meta_description_chars: 50,
        }
    }
}

/// An embedded JSON script block
#[derive(Debug, Clone)]
pub struct JsonBlock {
    pub id: Option<String>,
    pub raw: String,
    pub value: Value,
}

/// A rendered page parsed into a queryable document
///
/// `url` is the URL that was requested; relative links resolve against the
/// final URL the session ended up on.
pub struct ProductPage {
    url: String,
    base: Option<Url>,
    html: Html,
    hints: PageHints,
}

impl ProductPage {
    /// Parses markup requested from `url`
    pub fn parse(url: &str, markup: &str) -> Self {
        Self {
            url: url.to_string(),
            base: Url::parse(url).ok(),
            html: Html::parse_document(markup),
            hints: PageHints::default(),
        }
    }

    /// Resolves relative links against `final_url` instead of the requested URL
    pub fn with_final_url(mut self, final_url: &str) -> Self {
        if let Ok(base) = Url::parse(final_url) {
            self.base = Some(base);
        }
        self
    }

    pub fn with_hints(mut self, hints: PageHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn hints(&self) -> &PageHints {
        &self.hints
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// First element matching a selector
    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// First element matching `selector` that has a class token matching `class`
    pub fn first_with_class(&self, selector: &Selector, class: &Regex) -> Option<ElementRef<'_>> {
        self.html
            .select(selector)
            .find(|el| has_class_matching(*el, class))
    }

    /// Content of `<meta property=...>`, trimmed and non-empty
    pub fn meta_property(&self, property: &str) -> Option<String> {
        self.meta_content(&format!("meta[property='{}']", property))
    }

    /// Content of `<meta name=...>`, trimmed and non-empty
    pub fn meta_name(&self, name: &str) -> Option<String> {
        self.meta_content(&format!("meta[name='{}']", name))
    }

    fn meta_content(&self, selector: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        self.html
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|c| !c.is_empty())
            .map(str::to_string)
    }

    /// `href` of `<link rel=...>`
    pub fn link_href(&self, rel: &str) -> Option<String> {
        let selector = Selector::parse(&format!("link[rel='{}'][href]", rel)).ok()?;
        self.select_first(&selector)
            .and_then(|el| el.value().attr("href"))
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
    }

    /// Raw text of the `<title>` tag
    pub fn title_tag(&self) -> Option<String> {
        self.select_first(&TITLE_TAG)
            .map(element_text)
            .filter(|t| !t.is_empty())
    }

    /// Visible text nodes of the body, trimmed, in document order
    pub fn text_lines(&self) -> Vec<String> {
        match self.select_first(&BODY) {
            Some(body) => text_lines_of(body),
            None => Vec::new(),
        }
    }

    /// Visible body text joined by single spaces
    pub fn body_text(&self) -> String {
        self.text_lines().join(" ")
    }

    /// Whether the document has an `<h1>`
    pub fn has_heading(&self) -> bool {
        Selector::parse("h1")
            .map(|s| self.select_first(&s).is_some())
            .unwrap_or(false)
    }

    /// Every embedded JSON block that parses
    pub fn json_blocks(&self) -> Vec<JsonBlock> {
        self.html
            .select(&JSON_SCRIPT)
            .filter_map(|el| {
                let raw: String = el.text().collect();
                let value = serde_json::from_str(raw.trim()).ok()?;
                Some(JsonBlock {
                    id: el.value().attr("id").map(str::to_string),
                    raw,
                    value,
                })
            })
            .collect()
    }

    /// The `script#product_data` block, if present and valid
    pub fn product_data(&self) -> Option<Value> {
        self.json_blocks()
            .into_iter()
            .find(|b| b.id.as_deref() == Some("product_data"))
            .map(|b| b.value)
    }

    /// Resolves a resource URL to absolute form
    pub fn resolve(&self, href: &str) -> Option<String> {
        match &self.base {
            Some(base) => absolutize(href, base),
            None => Url::parse(href.trim())
                .ok()
                .filter(|u| u.scheme() == "http" || u.scheme() == "https")
                .map(|u| u.to_string()),
        }
    }
}

/// Text of an element: trimmed text nodes joined by single spaces
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Visible text nodes below an element, skipping scripts and styles
pub fn text_lines_of(el: ElementRef<'_>) -> Vec<String> {
    el.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(|p| p.value().as_element().map(|e| e.name()));
            if matches!(parent, Some("script" | "style" | "noscript")) {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// Whether any class token of the element matches `class`
pub fn has_class_matching(el: ElementRef<'_>, class: &Regex) -> bool {
    el.value().classes().any(|c| class.is_match(c))
}

/// The element's own text nodes, excluding descendants
pub fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|c| c.value().as_text().map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
