//! HTTP caching for resource responses
//!
//! A [`CachePolicy`] is built once per resource kind. It holds the literal
//! `Cache-Control` value and decides, per request, whether a conditional
//! request (`If-None-Match`) can be answered with 304.

use std::time::Duration;

use axum::http::HeaderValue;
use tracing::warn;
use xxhash_rust::xxh64::xxh64;

/// Caching directives for one resource kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheDirective {
    pub max_age: Duration,
    pub public: bool,
    pub stale_while_revalidate: Duration,
    pub stale_if_error: Duration,
    pub etag: bool,
}

/// Result of matching a response body against `If-None-Match`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalOutcome {
    pub matched: bool,
    pub etag: String,
}

#[derive(Debug, Clone, Default)]
pub struct CachePolicy {
    cache_control: Option<HeaderValue>,
    etag: bool,
}

impl CachePolicy {
    /// Precompute the header value for `directive`
    ///
    /// A zero `max_age` disables caching entirely, including ETag handling
    /// and both stale directives.
    pub fn new(directive: &CacheDirective) -> Self {
        if directive.max_age.is_zero() {
            return Self::default();
        }

        let mut value = format!(
            "max-age={}, {}",
            whole_seconds(directive.max_age),
            if directive.public { "public" } else { "private" }
        );
        if !directive.stale_while_revalidate.is_zero() {
            value.push_str(&format!(
                ", stale-while-revalidate={}",
                whole_seconds(directive.stale_while_revalidate)
            ));
        }
        if !directive.stale_if_error.is_zero() {
            value.push_str(&format!(
                ", stale-if-error={}",
                whole_seconds(directive.stale_if_error)
            ));
        }

        let cache_control = HeaderValue::from_str(&value)
            .inspect_err(|err| warn!(error = %err, value = %value, "Invalid Cache-Control value"))
            .ok();

        Self {
            cache_control,
            etag: directive.etag,
        }
    }

    pub fn cache_control(&self) -> Option<&HeaderValue> {
        self.cache_control.as_ref()
    }

    pub fn etag_enabled(&self) -> bool {
        self.etag
    }

    /// Match `body` against the client's `If-None-Match` value
    ///
    /// Returns `None` when ETag handling is disabled.
    pub fn evaluate(&self, body: &[u8], if_none_match: Option<&str>) -> Option<ConditionalOutcome> {
        if !self.etag {
            return None;
        }

        let etag = compute_etag(body);
        let matched = match if_none_match {
            Some("*") => true,
            Some(value) => value == etag,
            None => false,
        };

        Some(ConditionalOutcome { matched, etag })
    }
}

/// XXH64 digest (seed 0) in lowercase hex without leading zeros
pub fn compute_etag(body: &[u8]) -> String {
    format!("{:x}", xxh64(body, 0))
}

fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs_f64().round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(max_age: u64) -> CacheDirective {
        CacheDirective {
            max_age: Duration::from_secs(max_age),
            ..Default::default()
        }
    }

    fn header(policy: &CachePolicy) -> Option<&str> {
        policy.cache_control().and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_private_max_age_only() {
        let policy = CachePolicy::new(&directive(3600));
        assert_eq!(header(&policy), Some("max-age=3600, private"));
        assert!(!policy.etag_enabled());
    }

    #[test]
    fn test_full_directive() {
        let policy = CachePolicy::new(&CacheDirective {
            max_age: Duration::from_secs(3600),
            public: true,
            stale_while_revalidate: Duration::from_secs(60),
            stale_if_error: Duration::from_secs(86_400),
            etag: true,
        });

        assert_eq!(
            header(&policy),
            Some("max-age=3600, public, stale-while-revalidate=60, stale-if-error=86400")
        );
        assert!(policy.etag_enabled());
    }

    #[test]
    fn test_stale_if_error_without_revalidate() {
        let policy = CachePolicy::new(&CacheDirective {
            stale_if_error: Duration::from_secs(600),
            ..directive(60)
        });
        assert_eq!(header(&policy), Some("max-age=60, private, stale-if-error=600"));
    }

    #[test]
    fn test_zero_max_age_disables_everything() {
        let policy = CachePolicy::new(&CacheDirective {
            public: true,
            stale_while_revalidate: Duration::from_secs(60),
            stale_if_error: Duration::from_secs(60),
            etag: true,
            ..directive(0)
        });

        assert!(policy.cache_control().is_none());
        assert!(!policy.etag_enabled());
        assert!(policy.evaluate(b"{}", Some("*")).is_none());
    }

    #[test]
    fn test_seconds_are_rounded() {
        let policy = CachePolicy::new(&CacheDirective {
            max_age: Duration::from_millis(1500),
            stale_while_revalidate: Duration::from_millis(1400),
            ..Default::default()
        });
        assert_eq!(header(&policy), Some("max-age=2, private, stale-while-revalidate=1"));
    }

    #[test]
    fn test_etag_format() {
        // Reference XXH64 value for the empty input
        assert_eq!(compute_etag(b""), "ef46db3751d8e999");

        let etag = compute_etag(br#"[{"id":"tt1"}]"#);
        assert!(etag.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(!etag.starts_with('0'));
    }

    #[test]
    fn test_conditional_matching() {
        let policy = CachePolicy::new(&CacheDirective {
            etag: true,
            ..directive(60)
        });
        let body = br#"[{"id":"tt1"}]"#;
        let etag = compute_etag(body);

        let wildcard = policy.evaluate(body, Some("*")).unwrap();
        assert!(wildcard.matched);
        assert_eq!(wildcard.etag, etag);

        assert!(policy.evaluate(body, Some(&etag)).unwrap().matched);
        assert!(!policy.evaluate(body, Some("deadbeef")).unwrap().matched);
        assert!(!policy.evaluate(body, None).unwrap().matched);
    }
}
