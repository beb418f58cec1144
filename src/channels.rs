use std::collections::BTreeSet;

/// A channel specification as supplied by the application.
///
/// Accepts a single name, a comma-delimited string, or a list of names.
/// The canonical form is a set of trimmed, non-empty, deduplicated names;
/// an empty specification means "subscribe to nothing" and is not an error.
#[derive(Debug, Clone, Default)]
pub struct ChannelSpec(Vec<String>);

impl ChannelSpec {
    /// Produce the canonical channel set.
    ///
    /// Every entry is split on commas, trimmed, and deduplicated. Order of
    /// the input is irrelevant; the result is the same for any specification
    /// equal as a set.
    pub fn canonicalize(&self) -> BTreeSet<String> {
        self.0
            .iter()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()
    }
}

impl From<&str> for ChannelSpec {
    fn from(spec: &str) -> Self {
        Self(vec![spec.to_owned()])
    }
}

impl From<String> for ChannelSpec {
    fn from(spec: String) -> Self {
        Self(vec![spec])
    }
}

impl From<Vec<String>> for ChannelSpec {
    fn from(spec: Vec<String>) -> Self {
        Self(spec)
    }
}

impl From<Vec<&str>> for ChannelSpec {
    fn from(spec: Vec<&str>) -> Self {
        Self(spec.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ChannelSpec {
    fn from(spec: [&str; N]) -> Self {
        Self(spec.into_iter().map(String::from).collect())
    }
}

impl From<BTreeSet<String>> for ChannelSpec {
    fn from(spec: BTreeSet<String>) -> Self {
        Self(spec.into_iter().collect())
    }
}
