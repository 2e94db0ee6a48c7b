use anyhow::{Context as AnyhowContext, Result};
use std::net::SocketAddr;

pub(crate) const AUTH_TOKEN_ENV: &str = "PSGC_AUTH_TOKEN";

/// Shared secret expected as `Authorization: Bearer <token>`.
#[derive(Clone, Debug)]
pub(crate) struct AuthToken(String);

impl AuthToken {
    /// `None` when no token was configured; a blank token is a configuration error.
    pub(crate) fn parse(raw: Option<&str>) -> Result<Option<Self>> {
        match raw.map(str::trim) {
            None => Ok(None),
            Some("") => anyhow::bail!("auth token must be non-empty"),
            Some(token) => Ok(Some(Self(token.to_string()))),
        }
    }

    pub(crate) fn accepts(&self, authorization: &str) -> bool {
        authorization
            .trim()
            .strip_prefix("Bearer ")
            .is_some_and(|presented| same_secret(presented.trim(), &self.0))
    }
}

/// Resolve `bind` and refuse non-loopback addresses unless `public` is set.
pub(crate) async fn resolve_guarded_bind_addrs(
    bind: &str,
    public: bool,
) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind)
        .await
        .with_context(|| format!("Failed to resolve bind address: {bind}"))?
        .collect();
    if addrs.is_empty() {
        anyhow::bail!("Bind address {bind} resolved to no socket addresses")
    }

    let exposed = addrs.iter().find(|addr| !addr.ip().is_loopback());
    if let (Some(addr), false) = (exposed, public) {
        anyhow::bail!(
            "Refusing to bind to non-loopback address without --public: {bind} ({addr}). To expose the API, pass --public and set {AUTH_TOKEN_ENV} (or --auth-token)."
        )
    }
    Ok(addrs)
}

// Compares every byte regardless of where the first mismatch is.
fn same_secret(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_accepts_only_matching_bearer_header() {
        let token = AuthToken::parse(Some("  s3cret  ")).unwrap().unwrap();
        assert!(token.accepts("Bearer s3cret"));
        assert!(token.accepts("  Bearer  s3cret "));
        assert!(!token.accepts("s3cret"));
        assert!(!token.accepts("Basic s3cret"));
        assert!(!token.accepts("Bearer s3cre"));
        assert!(!token.accepts("Bearer s3creT"));
    }

    #[test]
    fn blank_token_is_rejected() {
        assert!(AuthToken::parse(Some("   ")).is_err());
        assert!(AuthToken::parse(None).unwrap().is_none());
    }

    #[tokio::test]
    async fn loopback_binds_need_no_flag() {
        let addrs = resolve_guarded_bind_addrs("127.0.0.1:0", false)
            .await
            .unwrap();
        assert!(addrs.iter().all(|addr| addr.ip().is_loopback()));
    }

    #[tokio::test]
    async fn wildcard_bind_requires_public() {
        let err = resolve_guarded_bind_addrs("0.0.0.0:0", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--public"));
        resolve_guarded_bind_addrs("0.0.0.0:0", true).await.unwrap();
    }
}
