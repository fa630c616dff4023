//! Client for the backend documentation cache.
//!
//! The backend exposes one read endpoint, `GET /api/wiki_cache`, keyed by
//! `owner`, `repo`, `repo_type` and `language`. Every call bypasses
//! intermediate caches; nothing is stored locally.

use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::RepositoryIdentity;
use crate::lookup::LookupError;

/// Path of the cache read endpoint, relative to the backend base URL.
pub const WIKI_CACHE_PATH: &str = "/api/wiki_cache";

/// Documentation language requested from the cache.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Query parameters sent to the cache endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheKey {
    pub owner: String,
    pub repo: String,
    pub repo_type: String,
    pub language: String,
}

impl CacheKey {
    pub fn for_identity(identity: &RepositoryIdentity) -> Self {
        Self {
            owner: identity.owner.clone(),
            repo: identity.name.clone(),
            repo_type: identity.provider_kind.as_str().to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Precomputed documentation for one repository, as stored by the backend.
///
/// Both fields are optional; a missing or `null` field means the backend
/// has nothing generated for it yet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CachedDocumentationSet {
    #[serde(default)]
    pub wiki_structure: Option<Value>,
    #[serde(default)]
    pub generated_pages: Option<Value>,
}

/// Thin wrapper around a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the cached documentation set for `key`.
    ///
    /// Non-success responses become [`LookupError::Backend`] carrying the
    /// exact status and body; transport and decode failures become
    /// [`LookupError::BackendUnavailable`].
    pub async fn fetch_cache(&self, key: &CacheKey) -> Result<CachedDocumentationSet, LookupError> {
        let url = format!("{}{}", self.base_url, WIKI_CACHE_PATH);
        tracing::debug!(%url, owner = %key.owner, repo = %key.repo, repo_type = %key.repo_type, "fetching wiki cache");

        let resp = self
            .http
            .get(&url)
            .query(key)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());
            let body = resp.bytes().await?;
            tracing::warn!(status = status.as_u16(), owner = %key.owner, repo = %key.repo, "backend cache returned an error");
            return Err(LookupError::Backend {
                status: status.as_u16(),
                content_type,
                body,
            });
        }

        Ok(resp.json::<CachedDocumentationSet>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::resolve;

    #[test]
    fn test_cache_key_from_identity() {
        let id = resolve("https://gitlab.com/acme/infra.git").unwrap();
        let key = CacheKey::for_identity(&id);
        assert_eq!(
            key,
            CacheKey {
                owner: "acme".to_string(),
                repo: "infra".to_string(),
                repo_type: "gitlab".to_string(),
                language: "en".to_string(),
            }
        );
    }

    #[test]
    fn test_local_cache_key() {
        let id = resolve("/srv/checkouts/engine").unwrap();
        let key = CacheKey::for_identity(&id);
        assert_eq!(key.owner, "local");
        assert_eq!(key.repo, "engine");
        assert_eq!(key.repo_type, "local");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("http://localhost:8001/");
        assert_eq!(client.base_url(), "http://localhost:8001");
    }

    #[test]
    fn test_documentation_set_tolerates_missing_and_null() {
        let set: CachedDocumentationSet = serde_json::from_str("{}").unwrap();
        assert!(set.wiki_structure.is_none());
        assert!(set.generated_pages.is_none());

        let set: CachedDocumentationSet =
            serde_json::from_str(r#"{"wiki_structure": null, "extra": 1}"#).unwrap();
        assert!(set.wiki_structure.is_none());
    }
}
