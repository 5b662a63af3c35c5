use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;

pub const DEFAULT_DENYLIST: [&str; 2] = ["^LocalDateTable_", "^DateTableTemplate_"];

static BUILTIN: LazyLock<Denylist> = LazyLock::new(|| {
    Denylist::new(&DEFAULT_DENYLIST).expect("built-in denylist patterns are valid regexes")
});

/// Name patterns for host-generated helper containers that never enter the graph.
#[derive(Clone, Debug, Default)]
pub struct Denylist {
    patterns: Vec<Regex>,
}

impl Denylist {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_owned(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// The host's generated date-table patterns.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn is_denied(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(name))
    }

    pub fn denies_any<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        names.into_iter().any(|name| self.is_denied(name))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
