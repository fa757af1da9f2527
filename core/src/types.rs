//! Domain DTOs for the POEditor API.
//!
//! # Design
//! Response types are decoded from the `result` object of each reply and
//! handed to the caller; nothing here is cached or tracked. Request types
//! list every optional field an endpoint recognizes, so a call cannot carry
//! a parameter the platform does not know about. Empty optional fields are
//! left off the wire.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::wire;

pub type ProjectId = u64;

/// A localization project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub id: ProjectId,
    pub name: String,
    #[serde(default, deserialize_with = "wire::empty_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "wire::flag")]
    pub public: bool,
    #[serde(default, deserialize_with = "wire::flag")]
    pub open: bool,
    #[serde(default, deserialize_with = "wire::empty_as_none")]
    pub reference_language: Option<String>,
    /// Number of terms. Only `projects/view` reports it.
    #[serde(default)]
    pub terms: Option<u64>,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub created: Option<DateTime<FixedOffset>>,
}

/// A language attached to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub code: String,
    #[serde(default, deserialize_with = "wire::u64_lenient")]
    pub translations: u64,
    #[serde(default, deserialize_with = "wire::f64_lenient")]
    pub percentage: f64,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub updated: Option<DateTime<FixedOffset>>,
}

/// A language the platform supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableLanguage {
    pub name: String,
    pub code: String,
}

/// A term, with its translation when the listing asked for a language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub term: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub plural: String,
    #[serde(default, deserialize_with = "wire::empty_as_none")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "wire::empty_as_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub created: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub updated: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub translation: Option<Translation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub content: TranslationContent,
    #[serde(default, deserialize_with = "wire::flag")]
    pub fuzzy: bool,
    #[serde(default, deserialize_with = "wire::flag")]
    pub proofread: bool,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub updated: Option<DateTime<FixedOffset>>,
}

/// Translation text: a single string, or plural forms keyed by category
/// (`one`, `few`, `other`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationContent {
    Text(String),
    Plural(BTreeMap<String, String>),
}

impl TranslationContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Plural(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Plural(forms) => forms.values().all(String::is_empty),
        }
    }
}

impl From<&str> for TranslationContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for TranslationContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A project member and the projects they can access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub project: ProjectRef,
    #[serde(rename = "type")]
    pub role: ContributorRole,
    /// Languages a contributor may translate. Empty for administrators.
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorRole {
    Administrator,
    Contributor,
    #[serde(other)]
    Other,
}

/// Counts the platform reports after a bulk term operation. Fields an
/// endpoint does not report stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermsSummary {
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub parsed: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub added: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub updated: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub deleted: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub with_added_comment: u64,
}

impl TermsSummary {
    /// Items the platform parsed but did not apply.
    pub fn skipped(&self) -> u64 {
        let applied = self
            .added
            .saturating_add(self.updated)
            .saturating_add(self.deleted)
            .saturating_add(self.with_added_comment);
        self.parsed.saturating_sub(applied)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationsSummary {
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub parsed: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub added: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub updated: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSummary {
    pub terms: TermsSummary,
    pub translations: TranslationsSummary,
}

/// Download location returned by `projects/export`. The link expires
/// after a few minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub url: String,
}

// Request payloads

/// A term to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTerm {
    pub term: String,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl NewTerm {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = Some(plural.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Identifies a term: the key plus its context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermKey {
    pub term: String,
    #[serde(default)]
    pub context: String,
}

impl TermKey {
    pub fn new(term: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            context: context.into(),
        }
    }
}

/// Changes to an existing term. Fields left `None` are not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermUpdate {
    pub term: String,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl TermUpdate {
    pub fn new(key: TermKey) -> Self {
        Self {
            term: key.term,
            context: key.context,
            ..Self::default()
        }
    }

    pub fn has_changes(&self) -> bool {
        self.new_term.is_some()
            || self.new_context.is_some()
            || self.reference.is_some()
            || self.plural.is_some()
            || self.comment.is_some()
            || self.tags.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermComment {
    pub term: String,
    #[serde(default)]
    pub context: String,
    pub comment: String,
}

/// A translation to insert or overwrite for one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUpdate {
    pub term: String,
    #[serde(default)]
    pub context: String,
    pub translation: TranslationValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationValue {
    pub content: TranslationContent,
    #[serde(default, serialize_with = "wire::flag_as_int", deserialize_with = "wire::flag")]
    pub fuzzy: bool,
}

impl TranslationUpdate {
    pub fn new(key: TermKey, content: impl Into<TranslationContent>) -> Self {
        Self {
            term: key.term,
            context: key.context,
            translation: TranslationValue {
                content: content.into(),
                fuzzy: false,
            },
        }
    }

    pub fn fuzzy(mut self, fuzzy: bool) -> Self {
        self.translation.fuzzy = fuzzy;
        self
    }
}

/// Project fields to change. At least one must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Some("")` clears the reference language.
    pub reference_language: Option<String>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.reference_language.is_none()
    }
}

/// Export file formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FileType {
    #[default]
    Po,
    Pot,
    Mo,
    Xls,
    Xlsx,
    Csv,
    Ini,
    Resw,
    Resx,
    AndroidStrings,
    AppleStrings,
    Xliff,
    Properties,
    KeyValueJson,
    Json,
    Yml,
    Xmb,
    Xtb,
    Arb,
}

impl FileType {
    pub const ALL: [FileType; 19] = [
        Self::Po,
        Self::Pot,
        Self::Mo,
        Self::Xls,
        Self::Xlsx,
        Self::Csv,
        Self::Ini,
        Self::Resw,
        Self::Resx,
        Self::AndroidStrings,
        Self::AppleStrings,
        Self::Xliff,
        Self::Properties,
        Self::KeyValueJson,
        Self::Json,
        Self::Yml,
        Self::Xmb,
        Self::Xtb,
        Self::Arb,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Po => "po",
            Self::Pot => "pot",
            Self::Mo => "mo",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Ini => "ini",
            Self::Resw => "resw",
            Self::Resx => "resx",
            Self::AndroidStrings => "android_strings",
            Self::AppleStrings => "apple_strings",
            Self::Xliff => "xliff",
            Self::Properties => "properties",
            Self::KeyValueJson => "key_value_json",
            Self::Json => "json",
            Self::Yml => "yml",
            Self::Xmb => "xmb",
            Self::Xtb => "xtb",
            Self::Arb => "arb",
        }
    }

    /// File extension for a downloaded export.
    pub fn extension(self) -> &'static str {
        match self {
            Self::AndroidStrings => "xml",
            Self::AppleStrings => "strings",
            Self::KeyValueJson => "json",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                ApiError::invalid(format!("file type {s:?} is not one of {}", known.join(", ")))
            })
    }
}

/// Restricts which terms an export includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFilter {
    Translated,
    Untranslated,
    Fuzzy,
    NotFuzzy,
    Automatic,
    NotAutomatic,
    Proofread,
    NotProofread,
}

impl ExportFilter {
    pub const ALL: [ExportFilter; 8] = [
        Self::Translated,
        Self::Untranslated,
        Self::Fuzzy,
        Self::NotFuzzy,
        Self::Automatic,
        Self::NotAutomatic,
        Self::Proofread,
        Self::NotProofread,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Translated => "translated",
            Self::Untranslated => "untranslated",
            Self::Fuzzy => "fuzzy",
            Self::NotFuzzy => "not_fuzzy",
            Self::Automatic => "automatic",
            Self::NotAutomatic => "not_automatic",
            Self::Proofread => "proofread",
            Self::NotProofread => "not_proofread",
        }
    }
}

impl FromStr for ExportFilter {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|f| f.as_str() == s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|f| f.as_str()).collect();
            ApiError::invalid(format!("filters - filter results by {}", known.join(", ")))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub file_type: FileType,
    pub filters: Vec<ExportFilter>,
    pub tags: Vec<String>,
}

impl ExportOptions {
    pub fn new(file_type: FileType) -> Self {
        Self {
            file_type,
            ..Self::default()
        }
    }

    pub fn filter(mut self, filter: ExportFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// What an upload updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateMode {
    Terms,
    TermsTranslations,
    Translations,
}

impl UpdateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Terms => "terms",
            Self::TermsTranslations => "terms_translations",
            Self::Translations => "translations",
        }
    }

    pub fn needs_language(self) -> bool {
        !matches!(self, Self::Terms)
    }
}

impl FromStr for UpdateMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terms" => Ok(Self::Terms),
            "terms_translations" => Ok(Self::TermsTranslations),
            "translations" => Ok(Self::Translations),
            other => Err(ApiError::invalid(format!(
                "updating must be one of terms, terms_translations, translations, got {other:?}"
            ))),
        }
    }
}

/// Tags applied to terms touched by an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTags {
    /// Every imported term.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<String>,
    /// Terms not previously in the project.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new: Vec<String>,
    /// Project terms missing from the file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obsolete: Vec<String>,
    /// Terms whose translation the file overwrote.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overridden_translations: Vec<String>,
}

impl UploadTags {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
            && self.new.is_empty()
            && self.obsolete.is_empty()
            && self.overridden_translations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub mode: UpdateMode,
    /// Required unless `mode` is `Terms`.
    pub language: Option<String>,
    /// Overwrite existing translations.
    pub overwrite: bool,
    /// Delete project terms missing from the file and add the new ones.
    pub sync_terms: bool,
    pub tags: UploadTags,
    /// Mark translations in other languages fuzzy for updated terms.
    pub fuzzy_trigger: bool,
}

impl UploadOptions {
    pub fn new(mode: UpdateMode) -> Self {
        Self {
            mode,
            language: None,
            overwrite: false,
            sync_terms: false,
            tags: UploadTags::default(),
            fuzzy_trigger: false,
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn sync_terms(mut self, sync_terms: bool) -> Self {
        self.sync_terms = sync_terms;
        self
    }

    pub fn tags(mut self, tags: UploadTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn fuzzy_trigger(mut self, fuzzy_trigger: bool) -> Self {
        self.fuzzy_trigger = fuzzy_trigger;
        self
    }
}
