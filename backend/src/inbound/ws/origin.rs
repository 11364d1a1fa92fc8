//! Configurable Origin allow-list for WebSocket upgrades.
//!
//! Entries are origins such as `https://coordinator.example` or
//! `http://localhost:3000`. A leading `*.` on the host admits every
//! subdomain (but not the bare domain) over the same scheme and port.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid allowed origin {entry:?}: {reason}")]
pub struct OriginConfigError {
    entry: String,
    reason: &'static str,
}

impl OriginConfigError {
    fn new(entry: &str, reason: &'static str) -> Self {
        Self {
            entry: entry.to_owned(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostPattern {
    Exact(String),
    Subdomain(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AllowedOrigin {
    scheme: String,
    host: HostPattern,
    port: Option<u16>,
}

impl AllowedOrigin {
    fn parse(entry: &str) -> Result<Self, OriginConfigError> {
        let (scheme, rest) = entry
            .split_once("://")
            .ok_or_else(|| OriginConfigError::new(entry, "missing scheme"))?;
        let (wildcard, rest) = match rest.strip_prefix("*.") {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let url = Url::parse(&format!("{scheme}://{rest}"))
            .map_err(|_| OriginConfigError::new(entry, "not a URL"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(OriginConfigError::new(entry, "scheme must be http or https"));
        }
        if url.path() != "/" || url.query().is_some() {
            return Err(OriginConfigError::new(entry, "origins carry no path"));
        }
        let host = url
            .host_str()
            .ok_or_else(|| OriginConfigError::new(entry, "missing host"))?
            .to_owned();
        Ok(Self {
            scheme: url.scheme().to_owned(),
            host: if wildcard {
                HostPattern::Subdomain(format!(".{host}"))
            } else {
                HostPattern::Exact(host)
            },
            port: url.port(),
        })
    }

    fn admits(&self, origin: &Url) -> bool {
        let Some(host) = origin.host_str() else {
            return false;
        };
        let host_matches = match &self.host {
            HostPattern::Exact(expected) => host == expected,
            HostPattern::Subdomain(suffix) => host
                .strip_suffix(suffix.as_str())
                .is_some_and(|label| !label.is_empty()),
        };
        origin.scheme() == self.scheme && host_matches && origin.port() == self.port
    }
}

/// Origins allowed to open WebSocket connections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginAllowList {
    entries: Vec<AllowedOrigin>,
}

impl OriginAllowList {
    /// Parse configured entries; any malformed entry rejects the whole list.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, OriginConfigError> {
        let entries = entries
            .iter()
            .map(|entry| AllowedOrigin::parse(entry.as_ref().trim()))
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }

    pub fn is_allowed(&self, origin: &Url) -> bool {
        self.entries.iter().any(|entry| entry.admits(origin))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn allow_list() -> OriginAllowList {
        OriginAllowList::parse(&[
            "http://localhost:3000",
            "https://coordinator.example",
            "https://*.coordinator.example",
        ])
        .expect("valid entries")
    }

    #[rstest]
    #[case("http://localhost:3000", true)]
    #[case("http://localhost:4000", false)]
    #[case("http://localhost", false)]
    #[case("https://coordinator.example", true)]
    #[case("https://ops.coordinator.example", true)]
    #[case("https://coordinator.example.evil.com", false)]
    #[case("http://coordinator.example", false)]
    #[case("https://evilcoordinator.example", false)]
    fn evaluates_allow_list(
        allow_list: OriginAllowList,
        #[case] origin: &str,
        #[case] expected: bool,
    ) {
        let parsed = Url::parse(origin).expect("url should parse");
        assert_eq!(allow_list.is_allowed(&parsed), expected);
    }

    #[rstest]
    #[case("localhost:3000")]
    #[case("ftp://files.example")]
    #[case("https://coordinator.example/app")]
    #[case("https://")]
    fn rejects_malformed_entries(#[case] entry: &str) {
        let err = OriginAllowList::parse(&[entry]).expect_err("entry should be rejected");
        assert!(err.to_string().contains(entry));
    }

    #[rstest]
    fn an_empty_list_admits_nothing() {
        let list = OriginAllowList::parse::<&str>(&[]).expect("empty is valid");
        let origin = Url::parse("http://localhost:3000").expect("url");
        assert!(list.is_empty());
        assert!(!list.is_allowed(&origin));
    }
}
