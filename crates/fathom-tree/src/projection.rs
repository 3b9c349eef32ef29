use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;

/// Selects which properties and metrics appear in a snapshot.
///
/// `props: None` keeps every property. `Some(list)` is an allow-list unless
/// its entries start with `!`, which turns it into a deny-list. A trailing
/// `*` matches by prefix in either mode. `Some(vec![])` keeps structure only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Projection {
    pub props: Option<Vec<String>>,
    pub include_root: bool,
    pub include_layout_metrics: bool,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Structural output only.
    pub fn structure_only() -> Self {
        Projection {
            props: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn with_props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props = Some(props.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_root(mut self, include_root: bool) -> Self {
        self.include_root = include_root;
        self
    }

    pub fn with_layout_metrics(mut self, include: bool) -> Self {
        self.include_layout_metrics = include;
        self
    }

    /// Validate the props list and compile it into a filter.
    pub fn filter(&self) -> Result<PropFilter, ProjectionError> {
        PropFilter::compile(self.props.as_deref())
    }
}

/// One props entry with its `!` marker stripped.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Exact(String),
    Prefix(String),
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        match raw.strip_suffix('*') {
            Some(prefix) => Pattern::Prefix(prefix.to_string()),
            None => Pattern::Exact(raw.to_string()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Exact(s) => s == name,
            Pattern::Prefix(p) => name.starts_with(p.as_str()),
        }
    }
}

/// Compiled form of a props list.
#[derive(Debug, Clone, PartialEq)]
pub enum PropFilter {
    All,
    Allow(Vec<Pattern>),
    Deny(Vec<Pattern>),
}

impl PropFilter {
    pub fn compile(props: Option<&[String]>) -> Result<Self, ProjectionError> {
        let entries = match props {
            None => return Ok(PropFilter::All),
            Some(entries) => entries,
        };

        let mut allow = Vec::new();
        let mut deny = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            match entry.strip_prefix('!') {
                Some(rest) if !rest.is_empty() => deny.push((entry, Pattern::parse(rest))),
                Some(_) => return Err(ProjectionError::EmptyPattern(i)),
                None if entry.is_empty() => return Err(ProjectionError::EmptyPattern(i)),
                None => allow.push((entry, Pattern::parse(entry))),
            }
        }

        if !allow.is_empty() && !deny.is_empty() {
            fn join(list: &[(&String, Pattern)]) -> String {
                list.iter().map(|(raw, _)| raw.as_str()).collect::<Vec<_>>().join(", ")
            }
            return Err(ProjectionError::MixedModes {
                allow: join(&allow),
                deny: join(&deny),
            });
        }

        if deny.is_empty() {
            Ok(PropFilter::Allow(allow.into_iter().map(|(_, p)| p).collect()))
        } else {
            Ok(PropFilter::Deny(deny.into_iter().map(|(_, p)| p).collect()))
        }
    }

    pub fn admits(&self, name: &str) -> bool {
        match self {
            PropFilter::All => true,
            PropFilter::Allow(patterns) => patterns.iter().any(|p| p.matches(name)),
            PropFilter::Deny(patterns) => !patterns.iter().any(|p| p.matches(name)),
        }
    }
}
