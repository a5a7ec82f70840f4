//! # Leeds Harvard
//!
//! Reference formatting and citation auditing in the Leeds Harvard style.
//!
//! The crate formats source details into bibliography entries, keeps them
//! sorted, audits an essay's in-text citations against the bibliography,
//! replaces known sources with gold-standard entries, and exports Word
//! documents. Everything is exposed as a library, through the `lhr` CLI,
//! and through a JSON HTTP service with per-user sessions.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌──────────────┐
//! │ Formatter  │──▶│Bibliography│──▶│ Word export  │
//! │  (spans)   │   │ sort/dedup │   │   (.docx)    │
//! └────────────┘   └─────┬──────┘   └──────────────┘
//!                        │
//! ┌────────────┐   ┌─────▼──────┐
//! │ Extraction │──▶│  Scanner   │──▶ AuditReport
//! │docx/pdf/txt│   │  (audit)   │
//! └────────────┘   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lhr format book --author "Smith, J." --year 2024 --title "Example" \
//!     --place London --publisher Pearson >> refs.txt
//! lhr sort refs.txt
//! lhr audit essay.docx --bib refs.txt --report report.docx
//! lhr serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`markup`] | `*italic*` / `**bold**` markup for spans |
//! | [`format`] | Reference formatting per source kind |
//! | [`sort`] | Bibliography sort key |
//! | [`bibliography`] | Ordered entry collection |
//! | [`text`] | Text cleaning and phrase matching |
//! | [`audit`] | In-text citation scanner |
//! | [`correct`] | Gold-standard correction table |
//! | [`extract`] | Essay paragraph extraction |
//! | [`export`] | Word document export |
//! | [`session`] | Per-user session state |
//! | [`server`] | HTTP server |
//! | [`commands`] | CLI command entry points |

pub mod audit;
pub mod bibliography;
pub mod commands;
pub mod config;
pub mod correct;
pub mod export;
pub mod extract;
pub mod format;
pub mod markup;
pub mod models;
pub mod server;
pub mod session;
pub mod sort;
pub mod text;
