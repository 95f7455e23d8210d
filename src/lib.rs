//! # Marginalia
//!
//! A read-it-later library core: turns web pages, PDFs, and pasted text into
//! clean, readable documents with derived metadata, and anchors highlights
//! and notes to stable character offsets in the rendered text.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────┐   ┌──────────┐
//! │  Sources    │──▶│  Ingestion pipeline  │──▶│  SQLite  │
//! │ URL/PDF/txt │   │ extract → normalize  │   │ library  │
//! └─────────────┘   │ → reading time, tags │   └────┬─────┘
//!                   │   headings           │        │
//!                   └──────────────────────┘        ▼
//!                                             ┌────────────┐
//!                                             │ highlights │
//!                                             │   notes    │
//!                                             └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! marginalia init
//! marginalia ingest url https://example.com/post --user alice
//! marginalia list --user alice
//! marginalia highlight <doc-id> --user alice --start 10 --end 42
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`normalize`] | Whitespace normalization |
//! | [`reading_time`] | Reading time estimate |
//! | [`tagger`] | Keyword topic tags |
//! | [`headings`] | Table-of-contents extraction |
//! | [`readability`] | Main-article isolation and HTML sanitizing |
//! | [`fetch`] | HTTP fetching |
//! | [`pdf`] | PDF text extraction |
//! | [`ingest`] | Pipeline orchestration |
//! | [`anchor`] | Highlight and note offsets |
//! | [`library`] | Document and tag storage |
//! | [`annotations`] | Highlight and note storage |
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Pipeline error kinds |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod anchor;
pub mod annotations;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod headings;
pub mod ingest;
pub mod library;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod pdf;
pub mod readability;
pub mod reading_time;
pub mod tagger;
