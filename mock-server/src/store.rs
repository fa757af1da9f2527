//! In-memory state behind the emulated endpoints.
//!
//! Each operation takes the decoded form parameters and returns the JSON
//! `result` object, or a `Failure` carrying the platform-style error code.
//! Codes follow the real API where it documents them (`4011` invalid token);
//! the rest are local to this emulator.

use std::collections::{BTreeMap, HashMap};

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::formats::{self, Entry};

pub type Params = HashMap<String, String>;

/// Languages the emulator accepts, as (code, name).
pub const LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("de", "German"),
    ("en", "English"),
    ("en-us", "English (US)"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("nl", "Dutch"),
    ("pt-br", "Portuguese (BR)"),
    ("ru", "Russian"),
    ("zh-CN", "Chinese (simplified)"),
];

pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub http_status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl Failure {
    /// A platform failure: HTTP 200 with a `"fail"` envelope.
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            http_status: StatusCode::OK,
            code,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.http_status = status;
        self
    }

    pub fn invalid_token() -> Self {
        Self::new("4011", "Invalid API Token")
    }

    fn missing(param: &str) -> Self {
        Self::new("4031", format!("Missing parameter: {param}"))
    }
}

pub type Outcome = Result<Value, Failure>;

#[derive(Debug, Clone)]
pub struct TranslationRecord {
    pub content: Value,
    pub fuzzy: bool,
    pub updated: String,
}

impl TranslationRecord {
    fn text(&self) -> String {
        match &self.content {
            Value::String(text) => text.clone(),
            Value::Object(forms) => forms
                .get("other")
                .or_else(|| forms.values().next())
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TermRecord {
    pub term: String,
    pub context: String,
    pub plural: String,
    pub reference: String,
    pub comment: String,
    pub tags: Vec<String>,
    pub created: String,
    pub updated: String,
    pub translations: BTreeMap<String, TranslationRecord>,
}

impl TermRecord {
    fn new(term: &str, context: &str, now: &str) -> Self {
        Self {
            term: term.to_string(),
            context: context.to_string(),
            plural: String::new(),
            reference: String::new(),
            comment: String::new(),
            tags: Vec::new(),
            created: now.to_string(),
            updated: String::new(),
            translations: BTreeMap::new(),
        }
    }

    fn matches(&self, term: &str, context: &str) -> bool {
        self.term == term && self.context == context
    }

    fn translated(&self, language: &str) -> Option<&TranslationRecord> {
        self.translations.get(language).filter(|t| !t.is_empty())
    }

    fn add_tags(&mut self, tags: &[String]) {
        for tag in tags {
            if !self.tags.contains(tag) {
                self.tags.push(tag.clone());
            }
        }
    }

    fn view(&self, language: Option<&str>) -> Value {
        let mut view = json!({
            "term": self.term,
            "context": self.context,
            "plural": self.plural,
            "created": self.created,
            "updated": self.updated,
            "reference": self.reference,
            "tags": self.tags,
            "comment": self.comment,
        });
        if let Some(language) = language {
            let translation = match self.translations.get(language) {
                Some(t) => json!({"content": t.content, "fuzzy": u8::from(t.fuzzy), "updated": t.updated}),
                None => json!({"content": "", "fuzzy": 0, "updated": ""}),
            };
            view["translation"] = translation;
        }
        view
    }
}

#[derive(Debug, Clone)]
pub struct LanguageRecord {
    pub code: String,
    pub updated: String,
}

#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub public: bool,
    pub open: bool,
    pub reference_language: String,
    pub created: String,
    pub languages: Vec<LanguageRecord>,
    pub terms: Vec<TermRecord>,
}

impl ProjectRecord {
    fn summary(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "public": u8::from(self.public),
            "open": u8::from(self.open),
            "created": self.created,
        })
    }

    fn details(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "public": u8::from(self.public),
            "open": u8::from(self.open),
            "reference_language": self.reference_language,
            "terms": self.terms.len(),
            "created": self.created,
        })
    }

    fn has_language(&self, code: &str) -> bool {
        self.languages.iter().any(|l| l.code == code)
    }

    fn require_language(&self, code: &str) -> Result<(), Failure> {
        if self.has_language(code) {
            Ok(())
        } else {
            Err(Failure::new("4025", format!("Language {code} is not in the project")))
        }
    }

    fn find_term(&mut self, term: &str, context: &str) -> Option<&mut TermRecord> {
        self.terms.iter_mut().find(|t| t.matches(term, context))
    }

    fn touch_language(&mut self, code: &str, now: &str) {
        if let Some(language) = self.languages.iter_mut().find(|l| l.code == code) {
            language.updated = now.to_string();
        }
    }

    /// Store a translation; returns (added, updated).
    fn set_translation(
        &mut self,
        term: &str,
        context: &str,
        language: &str,
        content: Value,
        fuzzy: bool,
        overwrite: bool,
        now: &str,
    ) -> (u64, u64) {
        let Some(record) = self.find_term(term, context) else {
            return (0, 0);
        };
        let existing = record.translated(language).map(TranslationRecord::text);
        let incoming = TranslationRecord {
            content,
            fuzzy,
            updated: now.to_string(),
        };
        if incoming.is_empty() {
            return (0, 0);
        }
        let counts = match existing {
            None => (1, 0),
            Some(text) if text == incoming.text() => return (0, 0),
            Some(_) if overwrite => (0, 1),
            Some(_) => return (0, 0),
        };
        record.translations.insert(language.to_string(), incoming);
        counts
    }
}

#[derive(Debug, Clone)]
pub struct ContributorRecord {
    pub name: String,
    pub email: String,
    pub permissions: Vec<PermissionRecord>,
}

#[derive(Debug, Clone)]
pub struct PermissionRecord {
    pub project_id: u64,
    pub admin: bool,
    pub languages: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Tags {
    One(String),
    Many(Vec<String>),
}

impl Tags {
    fn into_vec(self) -> Vec<String> {
        match self {
            Tags::One(tag) if tag.is_empty() => Vec::new(),
            Tags::One(tag) => vec![tag],
            Tags::Many(tags) => tags,
        }
    }
}

#[derive(Deserialize)]
struct TermInput {
    term: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    plural: Option<String>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    tags: Option<Tags>,
}

#[derive(Deserialize)]
struct TermChange {
    term: String,
    #[serde(default)]
    context: String,
    new_term: Option<String>,
    new_context: Option<String>,
    reference: Option<String>,
    plural: Option<String>,
    comment: Option<String>,
    tags: Option<Tags>,
}

#[derive(Deserialize)]
struct TranslationInput {
    term: String,
    #[serde(default)]
    context: String,
    translation: TranslationBody,
}

#[derive(Deserialize)]
struct TranslationBody {
    content: Value,
    #[serde(default)]
    fuzzy: Value,
}

#[derive(Deserialize, Default)]
struct UploadTags {
    #[serde(default)]
    all: Option<Tags>,
    #[serde(default)]
    new: Option<Tags>,
    #[serde(default)]
    obsolete: Option<Tags>,
    #[serde(default)]
    overridden_translations: Option<Tags>,
}

fn truthy(value: Option<&String>) -> bool {
    matches!(value.map(String::as_str), Some("1") | Some("true"))
}

fn fuzzy_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_u64().unwrap_or(0) != 0,
        Value::String(s) => s == "1",
        _ => false,
    }
}

fn data<T: for<'de> Deserialize<'de>>(params: &Params) -> Result<Vec<T>, Failure> {
    let raw = params.get("data").ok_or_else(|| Failure::missing("data"))?;
    serde_json::from_str(raw).map_err(|e| Failure::new("4032", format!("Invalid data: {e}")))
}

fn required<'a>(params: &'a Params, name: &str) -> Result<&'a str, Failure> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Failure::missing(name))
}

pub fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%z").to_string()
}

/// Everything the emulator knows.
#[derive(Debug, Default)]
pub struct Store {
    next_project_id: u64,
    projects: BTreeMap<u64, ProjectRecord>,
    contributors: Vec<ContributorRecord>,
    downloads: HashMap<Uuid, Vec<u8>>,
}

impl Store {
    fn project_id(params: &Params) -> Result<u64, Failure> {
        required(params, "id")?
            .parse()
            .map_err(|_| Failure::new("4012", "Invalid project ID"))
    }

    fn project(&self, params: &Params) -> Result<&ProjectRecord, Failure> {
        let id = Self::project_id(params)?;
        self.projects
            .get(&id)
            .ok_or_else(|| Failure::new("4012", "Invalid project ID"))
    }

    fn project_mut(&mut self, params: &Params) -> Result<&mut ProjectRecord, Failure> {
        let id = Self::project_id(params)?;
        self.projects
            .get_mut(&id)
            .ok_or_else(|| Failure::new("4012", "Invalid project ID"))
    }

    pub fn download(&self, token: &Uuid) -> Option<Vec<u8>> {
        self.downloads.get(token).cloned()
    }

    // Projects

    pub fn list_projects(&self, _params: &Params) -> Outcome {
        let projects: Vec<Value> = self.projects.values().map(ProjectRecord::summary).collect();
        Ok(json!({ "projects": projects }))
    }

    pub fn add_project(&mut self, params: &Params) -> Outcome {
        let name = required(params, "name")?;
        self.next_project_id += 1;
        let project = ProjectRecord {
            id: self.next_project_id,
            name: name.to_string(),
            description: params.get("description").cloned().unwrap_or_default(),
            public: false,
            open: false,
            reference_language: String::new(),
            created: now(),
            languages: Vec::new(),
            terms: Vec::new(),
        };
        let details = project.details();
        self.projects.insert(project.id, project);
        Ok(json!({ "project": details }))
    }

    pub fn view_project(&self, params: &Params) -> Outcome {
        Ok(json!({ "project": self.project(params)?.details() }))
    }

    pub fn update_project(&mut self, params: &Params) -> Outcome {
        let project = self.project_mut(params)?;
        if let Some(name) = params.get("name") {
            if name.is_empty() {
                return Err(Failure::new("4033", "Project name cannot be empty"));
            }
            project.name = name.clone();
        }
        if let Some(description) = params.get("description") {
            project.description = description.clone();
        }
        if let Some(language) = params.get("reference_language") {
            if !language.is_empty() {
                project.require_language(language)?;
            }
            project.reference_language = language.clone();
        }
        Ok(json!({ "project": project.details() }))
    }

    pub fn delete_project(&mut self, params: &Params) -> Outcome {
        let id = self.project(params)?.id;
        self.projects.remove(&id);
        for contributor in &mut self.contributors {
            contributor.permissions.retain(|p| p.project_id != id);
        }
        self.contributors.retain(|c| !c.permissions.is_empty());
        Ok(Value::Null)
    }

    // Languages

    pub fn available_languages(&self, _params: &Params) -> Outcome {
        let languages: Vec<Value> = LANGUAGES
            .iter()
            .map(|(code, name)| json!({ "name": name, "code": code }))
            .collect();
        Ok(json!({ "languages": languages }))
    }

    pub fn list_languages(&self, params: &Params) -> Outcome {
        let project = self.project(params)?;
        let total = project.terms.len();
        let languages: Vec<Value> = project
            .languages
            .iter()
            .map(|language| {
                let done = project
                    .terms
                    .iter()
                    .filter(|t| t.translated(&language.code).is_some())
                    .count();
                let percentage = if total == 0 {
                    0.0
                } else {
                    (done as f64 * 10_000.0 / total as f64).round() / 100.0
                };
                json!({
                    "name": language_name(&language.code).unwrap_or_default(),
                    "code": language.code,
                    "translations": done,
                    "percentage": percentage,
                    "updated": language.updated,
                })
            })
            .collect();
        Ok(json!({ "languages": languages }))
    }

    pub fn add_language(&mut self, params: &Params) -> Outcome {
        let code = required(params, "language")?.to_string();
        if language_name(&code).is_none() {
            return Err(Failure::new("4013", "Invalid language code"));
        }
        let project = self.project_mut(params)?;
        if project.has_language(&code) {
            return Err(Failure::new("4024", "Language already added"));
        }
        project.languages.push(LanguageRecord {
            code,
            updated: String::new(),
        });
        Ok(Value::Null)
    }

    pub fn delete_language(&mut self, params: &Params) -> Outcome {
        let code = required(params, "language")?.to_string();
        let project = self.project_mut(params)?;
        project.require_language(&code)?;
        project.languages.retain(|l| l.code != code);
        for term in &mut project.terms {
            term.translations.remove(&code);
        }
        if project.reference_language == code {
            project.reference_language.clear();
        }
        Ok(Value::Null)
    }

    pub fn update_language(&mut self, params: &Params) -> Outcome {
        let code = required(params, "language")?.to_string();
        let items: Vec<TranslationInput> = data(params)?;
        let project = self.project_mut(params)?;
        project.require_language(&code)?;
        let now = now();
        let parsed = items.len();
        let (mut added, mut updated) = (0, 0);
        for item in items {
            let (a, u) = project.set_translation(
                &item.term,
                &item.context,
                &code,
                item.translation.content,
                fuzzy_flag(&item.translation.fuzzy),
                true,
                &now,
            );
            added += a;
            updated += u;
        }
        if added + updated > 0 {
            project.touch_language(&code, &now);
        }
        Ok(json!({ "translations": { "parsed": parsed, "added": added, "updated": updated } }))
    }

    // Terms

    pub fn list_terms(&self, params: &Params) -> Outcome {
        let project = self.project(params)?;
        let language = params.get("language").map(String::as_str).filter(|l| !l.is_empty());
        if let Some(language) = language {
            project.require_language(language)?;
        }
        let terms: Vec<Value> = project.terms.iter().map(|t| t.view(language)).collect();
        Ok(json!({ "terms": terms }))
    }

    pub fn add_terms(&mut self, params: &Params) -> Outcome {
        let items: Vec<TermInput> = data(params)?;
        let project = self.project_mut(params)?;
        let now = now();
        let parsed = items.len();
        let mut added = 0;
        for item in items {
            if item.term.is_empty() || project.find_term(&item.term, &item.context).is_some() {
                continue;
            }
            let mut record = TermRecord::new(&item.term, &item.context, &now);
            record.reference = item.reference.unwrap_or_default();
            record.plural = item.plural.unwrap_or_default();
            record.comment = item.comment.unwrap_or_default();
            record.tags = item.tags.map(Tags::into_vec).unwrap_or_default();
            project.terms.push(record);
            added += 1;
        }
        Ok(json!({ "terms": { "parsed": parsed, "added": added } }))
    }

    pub fn update_terms(&mut self, params: &Params) -> Outcome {
        let items: Vec<TermChange> = data(params)?;
        let project = self.project_mut(params)?;
        let now = now();
        let parsed = items.len();
        let mut updated = 0;
        for item in items {
            let new_key = (
                item.new_term.clone().unwrap_or_else(|| item.term.clone()),
                item.new_context.clone().unwrap_or_else(|| item.context.clone()),
            );
            let renamed = new_key != (item.term.clone(), item.context.clone());
            if renamed && project.find_term(&new_key.0, &new_key.1).is_some() {
                continue;
            }
            let Some(record) = project.find_term(&item.term, &item.context) else {
                continue;
            };
            (record.term, record.context) = new_key;
            if let Some(reference) = item.reference {
                record.reference = reference;
            }
            if let Some(plural) = item.plural {
                record.plural = plural;
            }
            if let Some(comment) = item.comment {
                record.comment = comment;
            }
            if let Some(tags) = item.tags {
                record.tags = tags.into_vec();
            }
            record.updated = now.clone();
            updated += 1;
        }
        Ok(json!({ "terms": { "parsed": parsed, "updated": updated } }))
    }

    pub fn delete_terms(&mut self, params: &Params) -> Outcome {
        let items: Vec<TermInput> = data(params)?;
        let project = self.project_mut(params)?;
        let parsed = items.len();
        let before = project.terms.len();
        project
            .terms
            .retain(|t| !items.iter().any(|i| t.matches(&i.term, &i.context)));
        let deleted = before - project.terms.len();
        Ok(json!({ "terms": { "parsed": parsed, "deleted": deleted } }))
    }

    pub fn add_comments(&mut self, params: &Params) -> Outcome {
        let items: Vec<TermInput> = data(params)?;
        let project = self.project_mut(params)?;
        let parsed = items.len();
        let mut commented = 0;
        for item in items {
            let Some(comment) = item.comment.filter(|c| !c.is_empty()) else {
                continue;
            };
            if let Some(record) = project.find_term(&item.term, &item.context) {
                if record.comment.is_empty() {
                    record.comment = comment;
                } else {
                    record.comment = format!("{}\n{comment}", record.comment);
                }
                commented += 1;
            }
        }
        Ok(json!({ "terms": { "parsed": parsed, "with_added_comment": commented } }))
    }

    pub fn sync_terms(&mut self, params: &Params) -> Outcome {
        let items: Vec<TermInput> = data(params)?;
        let project = self.project_mut(params)?;
        let now = now();
        let parsed = items.len();
        let (mut added, mut updated) = (0, 0);
        for item in &items {
            let tags = item.tags.as_ref().map(|t| match t {
                Tags::One(tag) => Tags::One(tag.clone()).into_vec(),
                Tags::Many(tags) => tags.clone(),
            });
            match project.find_term(&item.term, &item.context) {
                Some(record) => {
                    let reference = item.reference.clone().unwrap_or_default();
                    let plural = item.plural.clone().unwrap_or_default();
                    let tags = tags.unwrap_or_default();
                    if record.reference != reference || record.plural != plural || record.tags != tags {
                        record.reference = reference;
                        record.plural = plural;
                        record.tags = tags;
                        record.updated = now.clone();
                        updated += 1;
                    }
                }
                None => {
                    let mut record = TermRecord::new(&item.term, &item.context, &now);
                    record.reference = item.reference.clone().unwrap_or_default();
                    record.plural = item.plural.clone().unwrap_or_default();
                    record.comment = item.comment.clone().unwrap_or_default();
                    record.tags = tags.unwrap_or_default();
                    project.terms.push(record);
                    added += 1;
                }
            }
        }
        let before = project.terms.len();
        project
            .terms
            .retain(|t| items.iter().any(|i| t.matches(&i.term, &i.context)));
        let deleted = before - project.terms.len();
        Ok(json!({
            "terms": { "parsed": parsed, "added": added, "updated": updated, "deleted": deleted }
        }))
    }

    // Export / upload

    /// Render the export and keep it for download under a fresh token.
    pub fn export(&mut self, params: &Params) -> Result<Uuid, Failure> {
        let language = required(params, "language")?.to_string();
        let file_type = required(params, "type")?.to_string();
        let filters: Vec<String> = match params.get("filters").filter(|f| !f.is_empty()) {
            Some(raw) => parse_list(raw),
            None => Vec::new(),
        };
        let tags: Vec<String> = params.get("tags").map(|raw| parse_list(raw)).unwrap_or_default();
        let project = self.project(params)?;
        project.require_language(&language)?;

        let entries: Vec<Entry> = project
            .terms
            .iter()
            .filter(|t| tags.is_empty() || t.tags.iter().any(|tag| tags.contains(tag)))
            .filter(|t| filters.iter().all(|f| passes_filter(t, &language, f)))
            .map(|t| {
                let translation = t.translated(&language).map(TranslationRecord::text);
                Entry::new(&t.term, &t.context, translation.as_deref())
            })
            .collect();
        let bytes = formats::render(&file_type, &language, &entries)
            .ok_or_else(|| Failure::new(
                "4040",
                format!("Unsupported export type {file_type}, expected one of {}", formats::SUPPORTED.join(", ")),
            ))?;
        let token = Uuid::new_v4();
        self.downloads.insert(token, bytes);
        Ok(token)
    }

    pub fn upload(&mut self, params: &Params, file_name: &str, content: &[u8]) -> Outcome {
        let updating = required(params, "updating")?.to_string();
        if !["terms", "terms_translations", "translations"].contains(&updating.as_str()) {
            return Err(Failure::new("4034", "Invalid updating value"));
        }
        let language = params.get("language").cloned().unwrap_or_default();
        let touches_terms = updating != "translations";
        let touches_translations = updating != "terms";
        if touches_translations && language.is_empty() {
            return Err(Failure::missing("language"));
        }
        let overwrite = truthy(params.get("overwrite"));
        let sync = touches_terms && truthy(params.get("sync_terms"));
        let tags: UploadTags = match params.get("tags").filter(|t| !t.is_empty() && touches_terms) {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| UploadTags {
                all: Some(Tags::One(raw.clone())),
                ..UploadTags::default()
            }),
            None => UploadTags::default(),
        };
        let tag_all = tags.all.map(Tags::into_vec).unwrap_or_default();
        let tag_new = tags.new.map(Tags::into_vec).unwrap_or_default();
        let tag_obsolete = tags.obsolete.map(Tags::into_vec).unwrap_or_default();
        let tag_overridden = tags.overridden_translations.map(Tags::into_vec).unwrap_or_default();

        let entries =
            formats::parse(file_name, content).map_err(|e| Failure::new("4048", format!("Could not parse file: {e}")))?;
        let project = self.project_mut(params)?;
        if touches_translations {
            project.require_language(&language)?;
        }
        let now = now();

        let mut terms = json!({ "parsed": 0, "added": 0, "deleted": 0 });
        if touches_terms {
            let mut added = 0;
            for entry in &entries {
                match project.find_term(&entry.term, &entry.context) {
                    Some(record) => record.add_tags(&tag_all),
                    None => {
                        let mut record = TermRecord::new(&entry.term, &entry.context, &now);
                        record.add_tags(&tag_all);
                        record.add_tags(&tag_new);
                        project.terms.push(record);
                        added += 1;
                    }
                }
            }
            let in_file = |t: &TermRecord| entries.iter().any(|e| t.matches(&e.term, &e.context));
            let mut deleted = 0;
            if sync {
                let before = project.terms.len();
                project.terms.retain(|t| in_file(t));
                deleted = before - project.terms.len();
            } else if !tag_obsolete.is_empty() {
                for record in project.terms.iter_mut().filter(|t| !in_file(&**t)) {
                    record.add_tags(&tag_obsolete);
                }
            }
            terms = json!({ "parsed": entries.len(), "added": added, "deleted": deleted });
        }

        let mut translations = json!({ "parsed": 0, "added": 0, "updated": 0 });
        if touches_translations {
            let (mut parsed, mut added, mut updated) = (0, 0, 0);
            for entry in &entries {
                let Some(text) = &entry.translation else { continue };
                parsed += 1;
                let (a, u) = project.set_translation(
                    &entry.term,
                    &entry.context,
                    &language,
                    Value::String(text.clone()),
                    false,
                    overwrite,
                    &now,
                );
                if u > 0 {
                    if let Some(record) = project.find_term(&entry.term, &entry.context) {
                        record.add_tags(&tag_overridden);
                    }
                }
                added += a;
                updated += u;
            }
            if added + updated > 0 {
                project.touch_language(&language, &now);
            }
            translations = json!({ "parsed": parsed, "added": added, "updated": updated });
        }

        Ok(json!({ "terms": terms, "translations": translations }))
    }

    // Contributors

    pub fn list_contributors(&self, params: &Params) -> Outcome {
        let project_id = match params.get("id").filter(|id| !id.is_empty()) {
            Some(_) => Some(self.project(params)?.id),
            None => None,
        };
        let language = params.get("language").filter(|l| !l.is_empty());
        let contributors: Vec<Value> = self
            .contributors
            .iter()
            .filter_map(|contributor| {
                let permissions: Vec<Value> = contributor
                    .permissions
                    .iter()
                    .filter(|p| project_id.map_or(true, |id| p.project_id == id))
                    .filter(|p| language.map_or(true, |l| p.admin || p.languages.contains(l)))
                    .filter_map(|p| {
                        let project = self.projects.get(&p.project_id)?;
                        Some(json!({
                            "project": { "id": project.id, "name": project.name },
                            "type": if p.admin { "administrator" } else { "contributor" },
                            "languages": p.languages,
                        }))
                    })
                    .collect();
                (!permissions.is_empty()).then(|| {
                    json!({
                        "name": contributor.name,
                        "email": contributor.email,
                        "permissions": permissions,
                    })
                })
            })
            .collect();
        Ok(json!({ "contributors": contributors }))
    }

    pub fn add_contributor(&mut self, params: &Params) -> Outcome {
        let name = required(params, "name")?.to_string();
        let email = required(params, "email")?.to_string();
        let admin = truthy(params.get("admin"));
        let language = params.get("language").cloned().filter(|l| !l.is_empty());
        let project = self.project(params)?;
        let project_id = project.id;
        if !admin {
            let language = language.as_deref().ok_or_else(|| Failure::missing("language"))?;
            project.require_language(language)?;
        }

        let index = match self.contributors.iter().position(|c| c.email == email) {
            Some(index) => index,
            None => {
                self.contributors.push(ContributorRecord {
                    name,
                    email,
                    permissions: Vec::new(),
                });
                self.contributors.len() - 1
            }
        };
        let contributor = &mut self.contributors[index];
        let permission = match contributor.permissions.iter().position(|p| p.project_id == project_id) {
            Some(i) => &mut contributor.permissions[i],
            None => {
                contributor.permissions.push(PermissionRecord {
                    project_id,
                    admin: false,
                    languages: Vec::new(),
                });
                let last = contributor.permissions.len() - 1;
                &mut contributor.permissions[last]
            }
        };
        if admin {
            permission.admin = true;
            permission.languages.clear();
        } else if let Some(language) = language {
            if !permission.admin && !permission.languages.contains(&language) {
                permission.languages.push(language);
            }
        }
        Ok(Value::Null)
    }

    pub fn remove_contributor(&mut self, params: &Params) -> Outcome {
        let email = required(params, "email")?.to_string();
        let project_id = self.project(params)?.id;
        let language = params.get("language").filter(|l| !l.is_empty());
        let contributor = self
            .contributors
            .iter_mut()
            .find(|c| c.email == email)
            .ok_or_else(|| Failure::new("4035", "Contributor not found"))?;
        match language {
            Some(language) => {
                for permission in contributor.permissions.iter_mut().filter(|p| p.project_id == project_id) {
                    permission.languages.retain(|l| l != language);
                }
                contributor
                    .permissions
                    .retain(|p| p.project_id != project_id || p.admin || !p.languages.is_empty());
            }
            None => contributor.permissions.retain(|p| p.project_id != project_id),
        }
        self.contributors.retain(|c| !c.permissions.is_empty());
        Ok(Value::Null)
    }
}

/// Accept a JSON array of strings or a bare string.
fn parse_list(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Tags>(raw) {
        Ok(tags) => tags.into_vec(),
        Err(_) => vec![raw.to_string()],
    }
}

fn passes_filter(term: &TermRecord, language: &str, filter: &str) -> bool {
    let translation = term.translated(language);
    match filter {
        "translated" => translation.is_some(),
        "untranslated" => translation.is_none(),
        "fuzzy" => translation.is_some_and(|t| t.fuzzy),
        "not_fuzzy" => translation.is_some_and(|t| !t.fuzzy),
        // Nothing here is machine translated or proofread.
        "automatic" | "proofread" => false,
        "not_automatic" | "not_proofread" => true,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn store_with_project() -> (Store, String) {
        let mut store = Store::default();
        store.add_project(&params(&[("name", "Site")])).unwrap();
        store
            .add_language(&params(&[("id", "1"), ("language", "fr")]))
            .unwrap();
        (store, "1".to_string())
    }

    #[test]
    fn projects_get_sequential_ids() {
        let mut store = Store::default();
        let a = store.add_project(&params(&[("name", "A")])).unwrap();
        let b = store.add_project(&params(&[("name", "B")])).unwrap();
        assert_eq!(a["project"]["id"], 1);
        assert_eq!(b["project"]["id"], 2);
    }

    #[test]
    fn unknown_project_is_4012() {
        let store = Store::default();
        let err = store.view_project(&params(&[("id", "99")])).unwrap_err();
        assert_eq!(err.code, "4012");
    }

    #[test]
    fn adding_a_language_twice_fails() {
        let (mut store, id) = store_with_project();
        let err = store
            .add_language(&params(&[("id", &id), ("language", "fr")]))
            .unwrap_err();
        assert_eq!(err.code, "4024");
    }

    #[test]
    fn add_terms_skips_duplicates() {
        let (mut store, id) = store_with_project();
        let data = r#"[{"term":"a"},{"term":"a"},{"term":"b","context":"x"}]"#;
        let result = store.add_terms(&params(&[("id", &id), ("data", data)])).unwrap();
        assert_eq!(result["terms"]["parsed"], 3);
        assert_eq!(result["terms"]["added"], 2);
    }

    #[test]
    fn translations_update_percentage() {
        let (mut store, id) = store_with_project();
        store
            .add_terms(&params(&[("id", &id), ("data", r#"[{"term":"a"},{"term":"b"}]"#)]))
            .unwrap();
        let data = r#"[{"term":"a","context":"","translation":{"content":"A","fuzzy":0}}]"#;
        let result = store
            .update_language(&params(&[("id", &id), ("language", "fr"), ("data", data)]))
            .unwrap();
        assert_eq!(result["translations"]["added"], 1);

        let languages = store.list_languages(&params(&[("id", &id)])).unwrap();
        assert_eq!(languages["languages"][0]["percentage"], 50.0);
        assert_eq!(languages["languages"][0]["translations"], 1);
    }

    #[test]
    fn upload_without_overwrite_keeps_existing_translation() {
        let (mut store, id) = store_with_project();
        store.add_terms(&params(&[("id", &id), ("data", r#"[{"term":"a"}]"#)])).unwrap();
        let upload = |store: &mut Store, overwrite: &str, text: &str| {
            let p = params(&[
                ("id", &id),
                ("updating", "translations"),
                ("language", "fr"),
                ("overwrite", overwrite),
            ]);
            store.upload(&p, "fr.json", format!(r#"{{"a":"{text}"}}"#).as_bytes()).unwrap()
        };
        assert_eq!(upload(&mut store, "0", "one")["translations"]["added"], 1);
        assert_eq!(upload(&mut store, "0", "two")["translations"]["updated"], 0);
        assert_eq!(upload(&mut store, "1", "two")["translations"]["updated"], 1);
    }

    #[test]
    fn sync_terms_deletes_missing() {
        let (mut store, id) = store_with_project();
        store
            .add_terms(&params(&[("id", &id), ("data", r#"[{"term":"a"},{"term":"b"}]"#)]))
            .unwrap();
        let result = store
            .sync_terms(&params(&[("id", &id), ("data", r#"[{"term":"a"},{"term":"c"}]"#)]))
            .unwrap();
        assert_eq!(result["terms"]["added"], 1);
        assert_eq!(result["terms"]["deleted"], 1);
    }

    #[test]
    fn deleting_a_project_drops_its_contributors() {
        let (mut store, id) = store_with_project();
        store
            .add_contributor(&params(&[
                ("id", &id),
                ("name", "Peter"),
                ("email", "peter@example.org"),
                ("language", "fr"),
            ]))
            .unwrap();
        store.delete_project(&params(&[("id", &id)])).unwrap();
        let list = store.list_contributors(&params(&[])).unwrap();
        assert_eq!(list["contributors"].as_array().unwrap().len(), 0);
    }
}
