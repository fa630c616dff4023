//! # AutoDoc Gateway
//!
//! Repository identity resolution and documentation cache lookups for AI
//! tools.
//!
//! A repository location (hosted URL or local path) is normalized into an
//! `(owner, name, provider)` identity, which keys a backend cache of
//! AI-generated documentation. The gateway exposes that cache as a wiki
//! structure listing and a per-topic page lookup, over REST, MCP, and a CLI.
//!
//! ## Architecture
//!
//! ```text
//!   repo_url ──▶ identity::resolve ──▶ backend::fetch_cache ──▶ lookup
//!                                                               │
//!                         ┌──────────────────┬──────────────────┤
//!                         ▼                  ▼                  ▼
//!                    ┌─────────┐      ┌────────────┐      ┌──────────┐
//!                    │   CLI   │      │ REST /api  │      │ MCP /mcp │
//!                    │(autodoc)│      │ /tools/*   │      │          │
//!                    └─────────┘      └────────────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! autodoc resolve https://github.com/tokio-rs/axum
//! autodoc structure https://github.com/tokio-rs/axum
//! autodoc content https://github.com/tokio-rs/axum "Getting Started"
//! autodoc serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`identity`] | Repository location parsing and provider classification |
//! | [`backend`] | Documentation cache client |
//! | [`lookup`] | Structure and content lookups, error taxonomy |
//! | [`config`] | TOML + environment configuration |
//! | [`traits`] | Tool trait and registry |
//! | [`server`] | HTTP server |
//! | [`mcp`] | MCP protocol bridge |

pub mod backend;
pub mod config;
pub mod identity;
pub mod lookup;
pub mod mcp;
pub mod server;
pub mod traits;
