//! Upstream pools and round-robin selection.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::Uri;
use shelf_kernel::settings::PoolSettings;

use crate::error::GatewayError;
use crate::table::PoolKind;

/// One catalog replica, addressed by scheme and authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    scheme: Scheme,
    authority: Authority,
}

impl Upstream {
    /// Parse a base URL such as `http://catalog-get:3030`.
    pub fn parse(pool: PoolKind, url: &str) -> Result<Self, GatewayError> {
        let invalid = |reason: &str| GatewayError::InvalidUpstream {
            pool,
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let uri: Uri = url.parse().map_err(|_| invalid("not a valid URI"))?;
        let scheme = uri.scheme().cloned().ok_or_else(|| invalid("missing scheme"))?;
        if scheme != Scheme::HTTP {
            return Err(invalid("only http upstreams are supported"));
        }
        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| invalid("missing host"))?;
        if !matches!(uri.path(), "" | "/") || uri.query().is_some() {
            return Err(invalid("upstream URLs cannot carry a path or query"));
        }

        Ok(Self { scheme, authority })
    }

    /// The inbound URI re-addressed to this upstream; path and query are kept.
    pub fn rewrite(&self, original: &Uri) -> Result<Uri, GatewayError> {
        let path_and_query = original
            .path_and_query()
            .map(PathAndQuery::as_str)
            .unwrap_or("/");

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(GatewayError::Rewrite)
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// Interchangeable replicas behind one forwarding rule.
#[derive(Debug)]
pub struct UpstreamPool {
    kind: PoolKind,
    upstreams: Vec<Upstream>,
    next: AtomicUsize,
}

impl UpstreamPool {
    pub fn new(kind: PoolKind, urls: &[String]) -> Result<Self, GatewayError> {
        if urls.is_empty() {
            return Err(GatewayError::EmptyPool { pool: kind });
        }
        let upstreams = urls
            .iter()
            .map(|url| Upstream::parse(kind, url))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            kind,
            upstreams,
            next: AtomicUsize::new(0),
        })
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn upstreams(&self) -> &[Upstream] {
        &self.upstreams
    }

    /// Next upstream in round-robin order.
    pub fn select(&self) -> &Upstream {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.upstreams.len();
        &self.upstreams[index]
    }
}

/// The five pools the forwarding table refers to.
#[derive(Debug)]
pub struct Pools {
    full: UpstreamPool,
    get: UpstreamPool,
    post: UpstreamPool,
    put: UpstreamPool,
    delete: UpstreamPool,
}

impl Pools {
    pub fn from_settings(settings: &PoolSettings) -> Result<Self, GatewayError> {
        Ok(Self {
            full: UpstreamPool::new(PoolKind::Full, &settings.full)?,
            get: UpstreamPool::new(PoolKind::Get, &settings.get)?,
            post: UpstreamPool::new(PoolKind::Post, &settings.post)?,
            put: UpstreamPool::new(PoolKind::Put, &settings.put)?,
            delete: UpstreamPool::new(PoolKind::Delete, &settings.delete)?,
        })
    }

    pub fn pool(&self, kind: PoolKind) -> &UpstreamPool {
        match kind {
            PoolKind::Full => &self.full,
            PoolKind::Get => &self.get,
            PoolKind::Post => &self.post,
            PoolKind::Put => &self.put,
            PoolKind::Delete => &self.delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|url| url.to_string()).collect()
    }

    #[test]
    fn parses_base_urls() {
        let upstream = Upstream::parse(PoolKind::Get, "http://catalog-get:3030").unwrap();
        assert_eq!(upstream.to_string(), "http://catalog-get:3030");
        assert!(Upstream::parse(PoolKind::Get, "http://catalog-get:3030/").is_ok());
    }

    #[test]
    fn rejects_unusable_upstreams() {
        for url in [
            "catalog-get:3030",
            "https://catalog-get:3030",
            "http://catalog-get:3030/api",
            "http://catalog-get:3030/?x=1",
            "not a url",
        ] {
            let err = Upstream::parse(PoolKind::Get, url).unwrap_err();
            assert!(
                matches!(err, GatewayError::InvalidUpstream { .. }),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn rewrite_keeps_path_and_query() {
        let upstream = Upstream::parse(PoolKind::Delete, "http://10.0.0.7:3030").unwrap();
        let original: Uri = "/api/books/65f1c0ffee0000000000beef?trace=1".parse().unwrap();
        let rewritten = upstream.rewrite(&original).unwrap();
        assert_eq!(
            rewritten.to_string(),
            "http://10.0.0.7:3030/api/books/65f1c0ffee0000000000beef?trace=1"
        );
    }

    #[test]
    fn empty_pool_is_rejected() {
        let err = UpstreamPool::new(PoolKind::Post, &[]).unwrap_err();
        assert!(matches!(err, GatewayError::EmptyPool { pool: PoolKind::Post }));
    }

    #[test]
    fn selection_is_round_robin() {
        let pool = UpstreamPool::new(
            PoolKind::Get,
            &urls(&["http://a:3030", "http://b:3030", "http://c:3030"]),
        )
        .unwrap();

        let picked: Vec<String> = (0..6).map(|_| pool.select().to_string()).collect();
        assert_eq!(
            picked,
            vec![
                "http://a:3030",
                "http://b:3030",
                "http://c:3030",
                "http://a:3030",
                "http://b:3030",
                "http://c:3030",
            ]
        );
    }

    #[test]
    fn pools_follow_settings() {
        let settings = PoolSettings {
            full: urls(&["http://full:3030"]),
            get: urls(&["http://get-1:3030", "http://get-2:3030"]),
            post: urls(&["http://post:3030"]),
            put: urls(&["http://put:3030"]),
            delete: urls(&["http://delete:3030"]),
        };
        let pools = Pools::from_settings(&settings).unwrap();

        for kind in PoolKind::ALL {
            assert_eq!(pools.pool(kind).kind(), kind);
        }
        assert_eq!(pools.pool(PoolKind::Get).upstreams().len(), 2);
        assert_eq!(pools.pool(PoolKind::Put).select().to_string(), "http://put:3030");
    }
}
