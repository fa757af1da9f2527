//! Synchronous client for the POEditor localization API.
//!
//! # Overview
//! Maps each POEditor v2 endpoint (projects, languages, terms,
//! translations, contributors, export/upload) to a typed method. The token
//! is injected into every request; replies are checked and decoded into the
//! types in [`types`], or into a typed [`ApiError`].
//!
//! # Design
//! - [`PoEditorClient`] is stateless and does no I/O: each operation has a
//!   `build_*` method producing an [`HttpRequest`] and a `parse_*` method
//!   consuming an [`HttpResponse`].
//! - [`Transport`] executes requests; [`UreqTransport`] is the blocking
//!   implementation.
//! - [`BlockingClient`] ties the two together with one method per operation.
//! - The library logs through `tracing` and never installs a subscriber.
//!
//! ```no_run
//! use poeditor_core::{BlockingClient, ExportOptions, FileType};
//!
//! let client = BlockingClient::new("my_token")?;
//! let project = client.create_project("Website", Some("Marketing site"))?;
//! client.add_language_to_project(project.id, "fr")?;
//! let (url, path) = client.export_to_path(
//!     project.id,
//!     "fr",
//!     &ExportOptions::new(FileType::Po),
//!     None,
//! )?;
//! println!("{url} saved to {}", path.display());
//! # Ok::<(), poeditor_core::ApiError>(())
//! ```

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;
mod wire;

pub use blocking::BlockingClient;
pub use client::PoEditorClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use transport::{Transport, UreqTransport};
pub use types::{
    AvailableLanguage, Contributor, ContributorRole, ExportFilter, ExportOptions, ExportedFile,
    FileType, Language, NewTerm, Permission, Project, ProjectId, ProjectRef, ProjectUpdate, Term,
    TermComment, TermKey, TermUpdate, TermsSummary, Translation, TranslationContent,
    TranslationUpdate, TranslationValue, TranslationsSummary, UpdateMode, UploadOptions,
    UploadSummary, UploadTags,
};
pub use wire::parse_timestamp;
