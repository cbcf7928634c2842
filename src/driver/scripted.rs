//! Scripted in-memory driver for unit tests
//!
//! Each `navigate` consumes the next [`ScriptedNav`]. A scripted navigation
//! can change state over time (a challenge page that resolves after a few
//! seconds), measured with tokio's clock so paused-time tests stay instant.

use super::{DriverError, PageAction, PageDriver};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub(crate) struct ScriptedNav {
    result: Result<(), DriverError>,
    states: Vec<(Duration, String, String)>,
}

impl ScriptedNav {
    /// Navigation succeeds and lands on `url` with `markup`
    pub fn page(url: &str, markup: &str) -> Self {
        Self {
            result: Ok(()),
            states: vec![(Duration::ZERO, url.to_string(), markup.to_string())],
        }
    }

    /// Navigation fails outright, leaving an empty page
    pub fn error(error: DriverError) -> Self {
        Self {
            result: Err(error),
            states: vec![(Duration::ZERO, "about:blank".to_string(), String::new())],
        }
    }

    /// Navigation times out with the page in the given state
    pub fn timeout(url: &str, markup: &str) -> Self {
        Self {
            result: Err(DriverError::Timeout("scripted timeout".to_string())),
            states: vec![(Duration::ZERO, url.to_string(), markup.to_string())],
        }
    }

    /// After `secs` from navigation, the page switches to a new state
    pub fn then_after(mut self, secs: u64, url: &str, markup: &str) -> Self {
        self.states
            .push((Duration::from_secs(secs), url.to_string(), markup.to_string()));
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedDriver {
    script: VecDeque<ScriptedNav>,
    active: Option<(Instant, ScriptedNav)>,
    heights: VecDeque<u64>,
    site: Option<HashMap<String, String>>,
    pub navigations: Vec<String>,
    pub actions: Vec<PageAction>,
}

impl ScriptedDriver {
    pub fn new(script: Vec<ScriptedNav>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    /// A static site: every navigation serves the page registered for its
    /// URL, unknown URLs serve an empty document
    pub fn site(pages: &[(&str, &str)]) -> Self {
        Self {
            site: Some(
                pages
                    .iter()
                    .map(|(url, markup)| (url.to_string(), markup.to_string()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// Heights reported by successive actions; afterwards the markup length is used
    pub fn with_heights(mut self, heights: Vec<u64>) -> Self {
        self.heights = heights.into();
        self
    }

    fn state(&self) -> (String, String) {
        match &self.active {
            Some((started, nav)) => {
                let elapsed = started.elapsed();
                nav.states
                    .iter()
                    .filter(|(at, _, _)| *at <= elapsed)
                    .last()
                    .map(|(_, url, markup)| (url.clone(), markup.clone()))
                    .unwrap_or_default()
            }
            None => ("about:blank".to_string(), String::new()),
        }
    }
}

impl PageDriver for ScriptedDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.navigations.push(url.to_string());
        let nav = match &self.site {
            Some(pages) => ScriptedNav::page(url, pages.get(url).map(String::as_str).unwrap_or("<html></html>")),
            None => self
                .script
                .pop_front()
                .unwrap_or_else(|| ScriptedNav::error(DriverError::Unrecoverable("script exhausted".into()))),
        };
        let result = nav.result.clone();
        self.active = Some((Instant::now(), nav));
        result
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.state().0)
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        Ok(self.state().1)
    }

    async fn execute(&mut self, action: PageAction) -> Result<u64, DriverError> {
        self.actions.push(action);
        match self.heights.pop_front() {
            Some(height) => Ok(height),
            None => Ok(self.state().1.len() as u64),
        }
    }
}
