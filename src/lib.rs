//! # README Harness
//!
//! Resolve, cache, and serve the README of every entity in a software
//! catalog.
//!
//! The resolution logic (candidate list, symlink handling, markdown
//! stripping, cache gateway) lives in `readme-harness-core`. This crate
//! supplies the I/O around it: SCM integrations, an HTTP content reader,
//! catalog clients, a moka cache store, and three entry points sharing one
//! [`service::ReadmeService`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  ┌──────────┐  ┌────────────┐
//! │   CLI    │  │   HTTP   │  │  Collator  │
//! │ (readme) │  │ + actions│  │ (search)   │
//! └────┬─────┘  └────┬─────┘  └─────┬──────┘
//!      └─────────────┼──────────────┘
//!                    ▼
//!             ReadmeService ──▶ catalog (entities)
//!                    │
//!        ┌───────────┼────────────┐
//!        ▼           ▼            ▼
//!   ReadmeCache   Resolver   ScmIntegrations
//!   (moka)           │        + HttpUrlReader
//!                    ▼
//!              raw README bytes
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`scm`] | GitHub / GitLab / generic URL conventions |
//! | [`reader`] | HTTP content fetching |
//! | [`catalog`] | Entity directory implementations |
//! | [`cache`] | moka-backed cache store |
//! | [`service`] | README lookup shared by every entry point |
//! | [`actions`] | Tool-invocation actions |
//! | [`server`] | HTTP server |
//! | [`search`] | Search document collation and scheduling |

pub mod actions;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod reader;
pub mod scm;
pub mod search;
pub mod server;
pub mod service;
