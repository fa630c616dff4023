//! Documentation structure and content lookups.
//!
//! Both lookups share one path: resolve the repository identity, fetch the
//! cached documentation set from the backend, then select from it. Used by
//! the HTTP endpoints, the tool registry, and the CLI.

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::backend::{BackendClient, CacheKey, CachedDocumentationSet};
use crate::config::Config;
use crate::identity::{resolve, RepositoryIdentity, ResolveError};

/// Everything a lookup can fail with.
#[derive(Debug, Error)]
pub enum LookupError {
    /// A required input was absent. The message names what is missing.
    #[error("{0}")]
    MissingParams(String),

    #[error("invalid repo_url '{input}': {source}")]
    InvalidRepoUrl {
        input: String,
        #[source]
        source: ResolveError,
    },

    /// The backend answered with a non-success status. Forwarded verbatim.
    #[error("backend returned HTTP {status}: {}", String::from_utf8_lossy(.body))]
    Backend {
        status: u16,
        content_type: Option<String>,
        body: Bytes,
    },

    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] reqwest::Error),

    #[error("wiki structure not found")]
    StructureNotFound,

    #[error("generated pages not found")]
    PagesNotFound,

    #[error("topic not found: {0}")]
    TopicNotFound(String),
}

impl LookupError {
    /// `true` for the "backend succeeded but the item is absent" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LookupError::StructureNotFound
                | LookupError::PagesNotFound
                | LookupError::TopicNotFound(_)
        )
    }

    /// `true` for errors caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LookupError::MissingParams(_) | LookupError::InvalidRepoUrl { .. }
        )
    }
}

/// Resolves repositories and reads their cached documentation.
///
/// Cheap to clone; the underlying HTTP connection pool is shared.
#[derive(Debug, Clone)]
pub struct LookupService {
    backend: BackendClient,
}

impl LookupService {
    pub fn new(config: &Config) -> Self {
        Self::with_backend(BackendClient::new(config.backend.base_url.clone()))
    }

    pub fn with_backend(backend: BackendClient) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// Return the backend's wiki structure for `repo_url`, unmodified.
    pub async fn wiki_structure(&self, repo_url: Option<&str>) -> Result<Value, LookupError> {
        let repo_url = present(repo_url)
            .ok_or_else(|| LookupError::MissingParams("Missing repo_url parameter".to_string()))?;

        let set = self.fetch_documentation(repo_url).await?;
        select_structure(set)
    }

    /// Return the page matching `topic` for `repo_url`, unmodified.
    ///
    /// Exact page-key matches win over case-insensitive title matches.
    pub async fn wiki_content(
        &self,
        repo_url: Option<&str>,
        topic: Option<&str>,
    ) -> Result<Value, LookupError> {
        let (repo_url, topic) = match (present(repo_url), present(topic)) {
            (Some(r), Some(t)) => (r, t),
            (None, None) => {
                return Err(LookupError::MissingParams(
                    "Missing repo_url and topic parameters".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(LookupError::MissingParams(
                    "Missing repo_url parameter".to_string(),
                ))
            }
            (Some(_), None) => {
                return Err(LookupError::MissingParams(
                    "Missing topic parameter".to_string(),
                ))
            }
        };

        let set = self.fetch_documentation(repo_url).await?;
        let pages = set.generated_pages.ok_or(LookupError::PagesNotFound)?;
        let pages = pages.as_object().ok_or(LookupError::PagesNotFound)?;

        select_page(pages, topic)
            .cloned()
            .ok_or_else(|| LookupError::TopicNotFound(topic.to_string()))
    }

    /// Resolve `repo_url` and fetch its documentation set. One backend read.
    pub async fn fetch_documentation(
        &self,
        repo_url: &str,
    ) -> Result<CachedDocumentationSet, LookupError> {
        let identity = resolve_repo(repo_url)?;
        let key = CacheKey::for_identity(&identity);
        self.backend.fetch_cache(&key).await
    }
}

/// [`resolve`] with the failure wrapped as a lookup error.
pub fn resolve_repo(repo_url: &str) -> Result<RepositoryIdentity, LookupError> {
    let identity = resolve(repo_url).map_err(|source| {
        tracing::info!(repo_url, error = %source, "rejecting unresolvable repository");
        LookupError::InvalidRepoUrl {
            input: repo_url.to_string(),
            source,
        }
    })?;
    tracing::debug!(
        owner = %identity.owner,
        name = %identity.name,
        provider = %identity.provider_kind,
        "resolved repository"
    );
    Ok(identity)
}

/// Take the structure out of a fetched set.
pub fn select_structure(set: CachedDocumentationSet) -> Result<Value, LookupError> {
    set.wiki_structure.ok_or(LookupError::StructureNotFound)
}

/// Find the page for `topic`: exact key first, then the first page whose
/// `title` equals `topic` ignoring case.
pub fn select_page<'a>(
    pages: &'a serde_json::Map<String, Value>,
    topic: &str,
) -> Option<&'a Value> {
    if let Some(page) = pages.get(topic) {
        return Some(page);
    }

    let wanted = topic.to_lowercase();
    pages.values().find(|page| {
        page.get("title")
            .and_then(|t| t.as_str())
            .is_some_and(|title| title.to_lowercase() == wanted)
    })
}

/// Treat absent and zero-length inputs alike. Whitespace is left for the
/// resolver to reject.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// CLI entry point for `autodoc structure`: prints the structure as JSON.
pub async fn run_structure(config: &Config, repo_url: &str) -> anyhow::Result<()> {
    let svc = LookupService::new(config);
    let structure = svc.wiki_structure(Some(repo_url)).await?;
    println!("{}", serde_json::to_string_pretty(&structure)?);
    Ok(())
}

/// CLI entry point for `autodoc content`: prints one page as JSON.
pub async fn run_content(config: &Config, repo_url: &str, topic: &str) -> anyhow::Result<()> {
    let svc = LookupService::new(config);
    let page = svc.wiki_content(Some(repo_url), Some(topic)).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
