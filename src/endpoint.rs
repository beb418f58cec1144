use crate::config::{ConnectionOptions, Env};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::BTreeSet;
use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};

/// Characters escaped in query values.
///
/// Commas and colons stay literal so channel lists and host identifiers
/// appear in the form the hub expects (`channels=a,b`,
/// `api_host=localhost:5000`).
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'&')
    .add(b'=')
    .add(b'%')
    .add(b'+');

/// Recognized scheme prefixes, checked longest first.
const KNOWN_SCHEMES: [&str; 4] = ["https://", "http://", "wss://", "ws://"];

/// An endpoint specification as supplied by the application: one or more
/// raw host strings, comma-delimited or as a list.
#[derive(Debug, Clone, Default)]
pub struct EndpointSpec(Vec<String>);

impl EndpointSpec {
    /// Iterate the trimmed, non-empty raw endpoint entries.
    pub(crate) fn entries(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|host| !host.is_empty())
    }
}

impl From<&str> for EndpointSpec {
    fn from(spec: &str) -> Self {
        Self(vec![spec.to_owned()])
    }
}

impl From<String> for EndpointSpec {
    fn from(spec: String) -> Self {
        Self(vec![spec])
    }
}

impl From<Vec<String>> for EndpointSpec {
    fn from(spec: Vec<String>) -> Self {
        Self(spec)
    }
}

impl From<Vec<&str>> for EndpointSpec {
    fn from(spec: Vec<&str>) -> Self {
        Self(spec.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EndpointSpec {
    fn from(spec: [&str; N]) -> Self {
        Self(spec.into_iter().map(String::from).collect())
    }
}

/// Which of the two backend surfaces a URL targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Live WebSocket stream (`/ws`, `ws://`/`wss://`).
    Stream,
    /// Point-in-time HTTP snapshot (`/snapshot`, `http://`/`https://`).
    Snapshot,
}

impl EndpointKind {
    fn scheme(self, env: Env) -> &'static str {
        match (self, env) {
            (Self::Stream, Env::Dev) => "ws://",
            (Self::Stream, Env::Prod) => "wss://",
            (Self::Snapshot, Env::Dev) => "http://",
            (Self::Snapshot, Env::Prod) => "https://",
        }
    }

    fn path_suffix(self) -> &'static str {
        match self {
            Self::Stream => "/ws",
            Self::Snapshot => "/snapshot",
        }
    }
}

/// Derive the canonical, fully-parameterized URL list for one endpoint kind.
///
/// Pure: the same options always yield byte-identical URLs in the same
/// order. Every URL embeds the same channel list (derived from the given
/// canonical set), so all candidates subscribe to identical channels and
/// differ only in host. Duplicates after normalization are collapsed,
/// keeping first-occurrence order.
///
/// Query parameter order is fixed: `api_key`, `api_host`, `channels`,
/// `snapshot`, then optional `snapshot_size` and `user_id`. The
/// cache-busting `_` parameter is appended separately at connect time, never
/// here.
pub fn normalize_endpoints(
    options: &ConnectionOptions,
    kind: EndpointKind,
    channels: &BTreeSet<String>,
) -> Vec<String> {
    let scheme = kind.scheme(options.env);
    let suffix = kind.path_suffix();

    let channel_list = channels
        .iter()
        .map(|name| encode_query_value(name))
        .collect::<Vec<_>>()
        .join(",");

    let mut urls: Vec<String> = Vec::new();

    for raw in options.endpoints.entries() {
        let host = strip_scheme(raw);

        let mut url = format!("{scheme}{host}");
        if !url.ends_with(suffix) {
            url.push_str(suffix);
        }

        // Writing to a String cannot fail.
        let _ = write!(
            url,
            "?api_key={}&api_host={}&channels={}&snapshot={}",
            options.api_key,
            options.api_host,
            channel_list,
            options.snapshot.as_query_value(),
        );

        if let Some(size) = options.snapshot_size {
            let _ = write!(url, "&snapshot_size={size}");
        }

        if let Some(user_id) = &options.user_id {
            let _ = write!(url, "&user_id={}", encode_query_value(user_id));
        }

        if !urls.contains(&url) {
            urls.push(url);
        }
    }

    urls
}

fn strip_scheme(raw: &str) -> &str {
    for scheme in KNOWN_SCHEMES {
        if let Some(rest) = raw.strip_prefix(scheme) {
            return rest;
        }
    }
    raw
}

fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Append the cache-busting timestamp parameter.
///
/// Applied once per connection attempt or snapshot fetch; normalized URLs
/// always carry a query string already, so `&` is always correct.
pub(crate) fn with_cache_buster(url: &str, timestamp_millis: u128) -> String {
    format!("{url}&_={timestamp_millis}")
}

/// Milliseconds since the Unix epoch, for cache busting.
pub(crate) fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}
