//! Repository identity resolution.
//!
//! Turns a user-supplied repository location (a hosted URL or a local
//! filesystem path) into the `(owner, name, provider)` triple that keys the
//! backend documentation cache.
//!
//! # Rules
//!
//! | Input | Owner | Name | Provider |
//! |-------|-------|------|----------|
//! | `C:\src\app`, `/home/me/app` | `local` | last path segment | `local` |
//! | `https://github.com/acme/app.git` | `acme` | `app` | `github` |
//! | `gitlab.example.com/group/sub/app` | `sub` | `app` | `gitlab` |
//! | `https://code.example.org/acme/app` | `acme` | `app` | `web` |
//!
//! Resolution is pure and is recomputed on every request.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Owner reported for every local filesystem path.
pub const LOCAL_OWNER: &str = "local";

/// Name used when a local path has no usable segments (e.g. `/` or `C:\`).
pub const LOCAL_PLACEHOLDER_NAME: &str = "local-repo";

/// Hosting platform classification, sent to the backend as `repo_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Github,
    Gitlab,
    Bitbucket,
    Web,
    Local,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Github => "github",
            ProviderKind::Gitlab => "gitlab",
            ProviderKind::Bitbucket => "bitbucket",
            ProviderKind::Web => "web",
            ProviderKind::Local => "local",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host substring rules, evaluated top to bottom. First match wins.
///
/// Hosts matching none of these are classified as [`ProviderKind::Web`],
/// including self-hosted forges with recognizable names.
pub const PROVIDER_RULES: &[(&str, ProviderKind)] = &[
    ("gitlab", ProviderKind::Gitlab),
    ("bitbucket", ProviderKind::Bitbucket),
    ("github", ProviderKind::Github),
];

/// The normalized cache key for a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub name: String,
    pub provider_kind: ProviderKind,
}

/// Why a repository string could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("repository location is empty")]
    Empty,
    #[error("repository location has no path component")]
    NoPath,
    #[error("repository path must contain an owner and a name, found {0} segment(s)")]
    TooFewSegments(usize),
}

/// Resolve a raw repository location into a [`RepositoryIdentity`].
///
/// Local paths (drive-letter or leading `/`) always succeed. URL-like
/// inputs need at least two non-empty path segments; the last two become
/// `owner` and `name`.
pub fn resolve(raw: &str) -> Result<RepositoryIdentity, ResolveError> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(ResolveError::Empty);
    }

    if is_local_path(input) {
        return Ok(resolve_local(input));
    }

    let url = parse_url_like(input).ok_or(ResolveError::NoPath)?;

    let path = url.path().trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if path.is_empty() {
        return Err(ResolveError::NoPath);
    }

    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return Err(ResolveError::TooFewSegments(segments.len()));
    }

    // len >= 2 checked above
    let name = segments.pop().unwrap_or_default().to_string();
    let owner = segments.pop().unwrap_or_default().to_string();
    let provider_kind = classify_host(url.host_str().unwrap_or_default());

    Ok(RepositoryIdentity {
        owner,
        name,
        provider_kind,
    })
}

/// Classify a host name using [`PROVIDER_RULES`].
pub fn classify_host(host: &str) -> ProviderKind {
    let host = host.to_ascii_lowercase();
    PROVIDER_RULES
        .iter()
        .find(|(needle, _)| host.contains(needle))
        .map(|(_, kind)| *kind)
        .unwrap_or(ProviderKind::Web)
}

/// `true` for `X:\...` drive paths and absolute Unix paths.
pub fn is_local_path(input: &str) -> bool {
    let bytes = input.as_bytes();
    let drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && bytes[2] == b'\\';
    drive || input.starts_with('/')
}

fn resolve_local(input: &str) -> RepositoryIdentity {
    let name = input
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or(LOCAL_PLACEHOLDER_NAME);

    RepositoryIdentity {
        owner: LOCAL_OWNER.to_string(),
        name: name.to_string(),
        provider_kind: ProviderKind::Local,
    }
}

/// Parse as a URL, assuming `https://` when no scheme is given
/// (`github.com/owner/repo`).
fn parse_url_like(input: &str) -> Option<Url> {
    if input.contains("://") {
        Url::parse(input).ok()
    } else {
        Url::parse(&format!("https://{}", input)).ok()
    }
}

/// CLI entry point for `autodoc resolve`.
pub fn run_resolve(input: &str, json: bool) -> anyhow::Result<()> {
    let identity = resolve(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&identity)?);
        return Ok(());
    }

    println!("owner:    {}", identity.owner);
    println!("name:     {}", identity.name);
    println!("provider: {}", identity.provider_kind);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(input: &str) -> RepositoryIdentity {
        resolve(input).unwrap_or_else(|e| panic!("{:?} failed to resolve: {}", input, e))
    }

    #[test]
    fn test_github_url() {
        let id = ok("https://github.com/AsyncFuncAI/deepwiki-open");
        assert_eq!(id.owner, "AsyncFuncAI");
        assert_eq!(id.name, "deepwiki-open");
        assert_eq!(id.provider_kind, ProviderKind::Github);
    }

    #[test]
    fn test_git_suffix_stripped() {
        let id = ok("https://github.com/rust-lang/cargo.git");
        assert_eq!(id.owner, "rust-lang");
        assert_eq!(id.name, "cargo");
    }

    #[test]
    fn test_trailing_slash_and_whitespace() {
        let id = ok("  https://bitbucket.org/team/service/  \n");
        assert_eq!(id.owner, "team");
        assert_eq!(id.name, "service");
        assert_eq!(id.provider_kind, ProviderKind::Bitbucket);
    }

    #[test]
    fn test_nested_groups_use_last_two_segments() {
        let id = ok("https://gitlab.com/group/subgroup/project");
        assert_eq!(id.owner, "subgroup");
        assert_eq!(id.name, "project");
        assert_eq!(id.provider_kind, ProviderKind::Gitlab);
    }

    #[test]
    fn test_scheme_less_url() {
        let id = ok("github.com/tokio-rs/axum");
        assert_eq!(id.owner, "tokio-rs");
        assert_eq!(id.name, "axum");
        assert_eq!(id.provider_kind, ProviderKind::Github);
    }

    #[test]
    fn test_unknown_host_is_web() {
        let id = ok("https://gitea.internal.example.com/platform/api");
        assert_eq!(id.provider_kind, ProviderKind::Web);
    }

    #[test]
    fn test_host_precedence_gitlab_first() {
        assert_eq!(
            classify_host("gitlab.github.example.com"),
            ProviderKind::Gitlab
        );
        let id = ok("https://gitlab.github.example.com/a/b");
        assert_eq!(id.provider_kind, ProviderKind::Gitlab);
    }

    #[test]
    fn test_host_precedence_bitbucket_before_github() {
        assert_eq!(
            classify_host("bitbucket.github.io"),
            ProviderKind::Bitbucket
        );
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify_host("GitHub.com"), ProviderKind::Github);
    }

    #[test]
    fn test_unix_local_path() {
        let id = ok("/home/dev/projects/my-app");
        assert_eq!(id.owner, LOCAL_OWNER);
        assert_eq!(id.name, "my-app");
        assert_eq!(id.provider_kind, ProviderKind::Local);
    }

    #[test]
    fn test_windows_local_path_mixed_separators() {
        let id = ok(r"C:\Users\dev/code\tool\");
        assert_eq!(id.owner, "local");
        assert_eq!(id.name, "tool");
        assert_eq!(id.provider_kind, ProviderKind::Local);
    }

    #[test]
    fn test_local_root_uses_placeholder() {
        assert_eq!(ok("/").name, LOCAL_PLACEHOLDER_NAME);
        assert_eq!(ok(r"D:\").name, LOCAL_PLACEHOLDER_NAME);
    }

    #[test]
    fn test_single_segment_local_path_succeeds() {
        let id = ok("/repo");
        assert_eq!(id.name, "repo");
        assert_eq!(id.provider_kind, ProviderKind::Local);
    }

    #[test]
    fn test_empty_and_whitespace_fail() {
        assert_eq!(resolve(""), Err(ResolveError::Empty));
        assert_eq!(resolve("   \t"), Err(ResolveError::Empty));
    }

    #[test]
    fn test_single_segment_url_fails() {
        assert_eq!(
            resolve("https://example.com/onlyrepo"),
            Err(ResolveError::TooFewSegments(1))
        );
    }

    #[test]
    fn test_host_only_url_fails() {
        assert_eq!(resolve("https://github.com"), Err(ResolveError::NoPath));
        assert_eq!(resolve("https://github.com/.git"), Err(ResolveError::NoPath));
    }

    #[test]
    fn test_unparsable_url_fails() {
        assert!(resolve("http://[not-a-host/a/b").is_err());
    }

    #[test]
    fn test_provider_serializes_lowercase() {
        let json = serde_json::to_value(ProviderKind::Bitbucket).unwrap();
        assert_eq!(json, "bitbucket");
        assert_eq!(ProviderKind::Web.to_string(), "web");
    }
}
