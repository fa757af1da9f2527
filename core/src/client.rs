//! Stateless request builder and response parser for the POEditor API.
//!
//! # Design
//! `PoEditorClient` holds only its `ClientConfig` and carries no mutable
//! state between calls. Each operation is split into a `build_*` method that
//! validates its arguments and produces an `HttpRequest`, and a `parse_*`
//! method that consumes an `HttpResponse`. A `Transport` executes the round
//! trip in between, so everything here is deterministic and testable without
//! a network.
//!
//! Every endpoint is a POST to `{base_url}/{resource}/{action}` carrying
//! `api_token` plus the operation's parameters.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{FilePart, HttpMethod, HttpRequest, HttpResponse, Multipart, RequestBody};
use crate::types::{
    AvailableLanguage, Contributor, ExportOptions, ExportedFile, Language, NewTerm, Project,
    ProjectId, ProjectUpdate, Term, TermComment, TermKey, TermUpdate, TermsSummary,
    TranslationUpdate, TranslationsSummary, UpdateMode, UploadOptions, UploadSummary,
};
use crate::wire::{self, Envelope};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Synchronous, stateless client for the POEditor API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct PoEditorClient {
    config: ClientConfig,
}

impl PoEditorClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // Projects

    pub fn build_list_projects(&self) -> HttpRequest {
        self.form("projects/list", Vec::new())
    }

    pub fn parse_list_projects(&self, response: HttpResponse) -> Result<Vec<Project>> {
        check_envelope(&response)?.take_or_default("projects")
    }

    pub fn build_create_project(&self, name: &str, description: Option<&str>) -> Result<HttpRequest> {
        require_text("project name", name)?;
        let mut params = vec![("name", name.to_string())];
        if let Some(description) = description {
            params.push(("description", description.to_string()));
        }
        Ok(self.form("projects/add", params))
    }

    pub fn parse_create_project(&self, response: HttpResponse) -> Result<Project> {
        check_envelope(&response)?.take("project")
    }

    pub fn build_view_project(&self, project_id: ProjectId) -> Result<HttpRequest> {
        require_project(project_id)?;
        Ok(self.form("projects/view", vec![("id", project_id.to_string())]))
    }

    pub fn parse_view_project(&self, response: HttpResponse) -> Result<Project> {
        check_envelope(&response)?.take("project")
    }

    pub fn build_update_project(&self, project_id: ProjectId, update: &ProjectUpdate) -> Result<HttpRequest> {
        require_project(project_id)?;
        if update.is_empty() {
            return Err(ApiError::invalid("project update has no fields set"));
        }
        if let Some(name) = &update.name {
            require_text("project name", name)?;
        }
        let mut params = vec![("id", project_id.to_string())];
        if let Some(name) = &update.name {
            params.push(("name", name.clone()));
        }
        if let Some(description) = &update.description {
            params.push(("description", description.clone()));
        }
        if let Some(language) = &update.reference_language {
            params.push(("reference_language", language.clone()));
        }
        Ok(self.form("projects/update", params))
    }

    pub fn parse_update_project(&self, response: HttpResponse) -> Result<Project> {
        check_envelope(&response)?.take("project")
    }

    pub fn build_set_reference_language(&self, project_id: ProjectId, language: &str) -> Result<HttpRequest> {
        require_text("language code", language)?;
        self.build_update_project(
            project_id,
            &ProjectUpdate {
                reference_language: Some(language.to_string()),
                ..ProjectUpdate::default()
            },
        )
    }

    pub fn build_clear_reference_language(&self, project_id: ProjectId) -> Result<HttpRequest> {
        self.build_update_project(
            project_id,
            &ProjectUpdate {
                reference_language: Some(String::new()),
                ..ProjectUpdate::default()
            },
        )
    }

    pub fn build_delete_project(&self, project_id: ProjectId) -> Result<HttpRequest> {
        require_project(project_id)?;
        Ok(self.form("projects/delete", vec![("id", project_id.to_string())]))
    }

    /// Parse a reply that carries no `result`.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<()> {
        check_envelope(&response).map(|_| ())
    }

    // Languages

    pub fn build_list_languages(&self, project_id: ProjectId) -> Result<HttpRequest> {
        require_project(project_id)?;
        Ok(self.form("languages/list", vec![("id", project_id.to_string())]))
    }

    pub fn parse_list_languages(&self, response: HttpResponse) -> Result<Vec<Language>> {
        check_envelope(&response)?.take_or_default("languages")
    }

    pub fn build_available_languages(&self) -> HttpRequest {
        self.form("languages/available", Vec::new())
    }

    pub fn parse_available_languages(&self, response: HttpResponse) -> Result<Vec<AvailableLanguage>> {
        check_envelope(&response)?.take_or_default("languages")
    }

    pub fn build_add_language(&self, project_id: ProjectId, language: &str) -> Result<HttpRequest> {
        self.language_request("languages/add", project_id, language)
    }

    pub fn build_delete_language(&self, project_id: ProjectId, language: &str) -> Result<HttpRequest> {
        self.language_request("languages/delete", project_id, language)
    }

    pub fn build_update_language(
        &self,
        project_id: ProjectId,
        language: &str,
        translations: &[TranslationUpdate],
        fuzzy_trigger: bool,
    ) -> Result<HttpRequest> {
        require_project(project_id)?;
        require_text("language code", language)?;
        require_items("translations", translations)?;
        for update in translations {
            require_text("term", &update.term)?;
        }
        Ok(self.form(
            "languages/update",
            vec![
                ("id", project_id.to_string()),
                ("language", language.to_string()),
                ("data", wire::json_param(translations)?),
                ("fuzzy_trigger", flag(fuzzy_trigger)),
            ],
        ))
    }

    pub fn parse_update_language(&self, response: HttpResponse) -> Result<TranslationsSummary> {
        check_envelope(&response)?.take_or_default("translations")
    }

    // Terms

    /// List terms; with a language, each term carries its translation.
    pub fn build_list_terms(&self, project_id: ProjectId, language: Option<&str>) -> Result<HttpRequest> {
        require_project(project_id)?;
        let mut params = vec![("id", project_id.to_string())];
        if let Some(language) = language {
            require_text("language code", language)?;
            params.push(("language", language.to_string()));
        }
        Ok(self.form("terms/list", params))
    }

    pub fn parse_list_terms(&self, response: HttpResponse) -> Result<Vec<Term>> {
        check_envelope(&response)?.take_or_default("terms")
    }

    pub fn build_add_terms(&self, project_id: ProjectId, terms: &[NewTerm]) -> Result<HttpRequest> {
        require_project(project_id)?;
        require_items("terms", terms)?;
        for term in terms {
            require_text("term", &term.term)?;
        }
        self.terms_request("terms/add", project_id, terms, None)
    }

    pub fn build_update_terms(
        &self,
        project_id: ProjectId,
        terms: &[TermUpdate],
        fuzzy_trigger: bool,
    ) -> Result<HttpRequest> {
        require_project(project_id)?;
        require_items("terms", terms)?;
        for term in terms {
            require_text("term", &term.term)?;
            if !term.has_changes() {
                return Err(ApiError::invalid(format!("term {:?} has no changes", term.term)));
            }
        }
        self.terms_request("terms/update", project_id, terms, Some(fuzzy_trigger))
    }

    pub fn build_delete_terms(&self, project_id: ProjectId, terms: &[TermKey]) -> Result<HttpRequest> {
        require_project(project_id)?;
        require_items("terms", terms)?;
        for term in terms {
            require_text("term", &term.term)?;
        }
        self.terms_request("terms/delete", project_id, terms, None)
    }

    pub fn build_add_comments(&self, project_id: ProjectId, comments: &[TermComment]) -> Result<HttpRequest> {
        require_project(project_id)?;
        require_items("comments", comments)?;
        for comment in comments {
            require_text("term", &comment.term)?;
            require_text("comment", &comment.comment)?;
        }
        self.terms_request("terms/add_comment", project_id, comments, None)
    }

    /// Replace the project's terms with `terms`. An empty slice deletes
    /// every term, which is why it is not rejected.
    pub fn build_sync_terms(&self, project_id: ProjectId, terms: &[NewTerm]) -> Result<HttpRequest> {
        require_project(project_id)?;
        for term in terms {
            require_text("term", &term.term)?;
        }
        self.terms_request("projects/sync", project_id, terms, None)
    }

    /// Parse the summary returned by every bulk term operation.
    pub fn parse_terms_summary(&self, response: HttpResponse) -> Result<TermsSummary> {
        check_envelope(&response)?.take_or_default("terms")
    }

    // Export / upload

    pub fn build_export(
        &self,
        project_id: ProjectId,
        language: &str,
        options: &ExportOptions,
    ) -> Result<HttpRequest> {
        require_project(project_id)?;
        require_text("language code", language)?;
        let mut params = vec![
            ("id", project_id.to_string()),
            ("language", language.to_string()),
            ("type", options.file_type.as_str().to_string()),
        ];
        if !options.filters.is_empty() {
            params.push(("filters", wire::json_param(&options.filters)?));
        }
        if !options.tags.is_empty() {
            params.push(("tags", wire::json_param(&options.tags)?));
        }
        Ok(self.form("projects/export", params))
    }

    pub fn parse_export(&self, response: HttpResponse) -> Result<ExportedFile> {
        let url: String = check_envelope(&response)?.take("url")?;
        if url.is_empty() {
            return Err(ApiError::Deserialization("\"result.url\" is empty".to_string()));
        }
        Ok(ExportedFile { url })
    }

    /// GET the file an export points to. The link is pre-authorized, so no
    /// token is attached.
    pub fn build_download(&self, file: &ExportedFile) -> Result<HttpRequest> {
        if !(file.url.starts_with("http://") || file.url.starts_with("https://")) {
            return Err(ApiError::invalid(format!("export url {:?} is not absolute", file.url)));
        }
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: file.url.clone(),
            headers: Vec::new(),
            body: None,
        })
    }

    pub fn parse_download(&self, response: HttpResponse) -> Result<Vec<u8>> {
        if response.status != 200 {
            return Err(http_failure(&response));
        }
        Ok(response.body)
    }

    /// Build a multipart upload of the file at `path`.
    ///
    /// The file is read here, so a missing file fails before any request.
    pub fn build_upload(
        &self,
        project_id: ProjectId,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<HttpRequest> {
        require_project(project_id)?;
        if !path.is_file() {
            return Err(ApiError::invalid(format!("{} is not a file", path.display())));
        }
        let language = options.language.as_deref().filter(|l| !l.trim().is_empty());
        if options.mode.needs_language() && language.is_none() {
            return Err(ApiError::invalid(format!(
                "language code is required when updating {}",
                options.mode.as_str()
            )));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content = std::fs::read(path)?;

        let mut fields = vec![
            ("api_token".to_string(), self.config.api_token().to_string()),
            ("id".to_string(), project_id.to_string()),
            ("updating".to_string(), options.mode.as_str().to_string()),
        ];
        if let Some(language) = language {
            fields.push(("language".to_string(), language.to_string()));
        }
        fields.push(("overwrite".to_string(), flag(options.overwrite)));
        // Translations-only uploads do not touch terms.
        if options.mode != UpdateMode::Translations {
            fields.push(("sync_terms".to_string(), flag(options.sync_terms)));
            if !options.tags.is_empty() {
                fields.push(("tags".to_string(), wire::json_param(&options.tags)?));
            }
        }
        fields.push(("fuzzy_trigger".to_string(), flag(options.fuzzy_trigger)));

        let multipart = Multipart::new(
            fields,
            FilePart {
                field: "file".to_string(),
                file_name,
                content,
            },
        );
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url("projects/upload"),
            headers: vec![("content-type".to_string(), multipart.content_type())],
            body: Some(RequestBody::Multipart(multipart)),
        })
    }

    pub fn parse_upload(&self, response: HttpResponse) -> Result<UploadSummary> {
        let envelope = check_envelope(&response)?;
        decode_result(envelope)
    }

    // Contributors

    /// List contributors, optionally narrowed to a project and language.
    pub fn build_list_contributors(
        &self,
        project_id: Option<ProjectId>,
        language: Option<&str>,
    ) -> Result<HttpRequest> {
        let mut params = Vec::new();
        if let Some(project_id) = project_id {
            require_project(project_id)?;
            params.push(("id", project_id.to_string()));
        }
        if let Some(language) = language {
            if project_id.is_none() {
                return Err(ApiError::invalid("language filter needs a project id"));
            }
            require_text("language code", language)?;
            params.push(("language", language.to_string()));
        }
        Ok(self.form("contributors/list", params))
    }

    pub fn parse_list_contributors(&self, response: HttpResponse) -> Result<Vec<Contributor>> {
        check_envelope(&response)?.take_or_default("contributors")
    }

    pub fn build_add_contributor(
        &self,
        project_id: ProjectId,
        name: &str,
        email: &str,
        language: &str,
    ) -> Result<HttpRequest> {
        require_project(project_id)?;
        require_text("contributor name", name)?;
        require_email(email)?;
        require_text("language code", language)?;
        Ok(self.form(
            "contributors/add",
            vec![
                ("id", project_id.to_string()),
                ("name", name.to_string()),
                ("email", email.to_string()),
                ("language", language.to_string()),
            ],
        ))
    }

    pub fn build_add_administrator(&self, project_id: ProjectId, name: &str, email: &str) -> Result<HttpRequest> {
        require_project(project_id)?;
        require_text("administrator name", name)?;
        require_email(email)?;
        Ok(self.form(
            "contributors/add",
            vec![
                ("id", project_id.to_string()),
                ("name", name.to_string()),
                ("email", email.to_string()),
                ("admin", flag(true)),
            ],
        ))
    }

    /// Remove a contributor from a project, or only from one of its
    /// languages when `language` is given.
    pub fn build_remove_contributor(
        &self,
        project_id: ProjectId,
        email: &str,
        language: Option<&str>,
    ) -> Result<HttpRequest> {
        require_project(project_id)?;
        require_email(email)?;
        let mut params = vec![("id", project_id.to_string()), ("email", email.to_string())];
        if let Some(language) = language {
            require_text("language code", language)?;
            params.push(("language", language.to_string()));
        }
        Ok(self.form("contributors/remove", params))
    }

    // Helpers

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.config.base_url())
    }

    fn form(&self, endpoint: &str, params: Vec<(&str, String)>) -> HttpRequest {
        let mut fields = Vec::with_capacity(params.len() + 1);
        fields.push(("api_token".to_string(), self.config.api_token().to_string()));
        fields.extend(params.into_iter().map(|(key, value)| (key.to_string(), value)));
        HttpRequest {
            method: HttpMethod::Post,
            url: self.url(endpoint),
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(RequestBody::Form(fields)),
        }
    }

    fn language_request(&self, endpoint: &str, project_id: ProjectId, language: &str) -> Result<HttpRequest> {
        require_project(project_id)?;
        require_text("language code", language)?;
        Ok(self.form(
            endpoint,
            vec![("id", project_id.to_string()), ("language", language.to_string())],
        ))
    }

    fn terms_request<T: serde::Serialize>(
        &self,
        endpoint: &str,
        project_id: ProjectId,
        terms: &[T],
        fuzzy_trigger: Option<bool>,
    ) -> Result<HttpRequest> {
        let mut params = vec![("id", project_id.to_string()), ("data", wire::json_param(terms)?)];
        if let Some(fuzzy_trigger) = fuzzy_trigger {
            params.push(("fuzzy_trigger", flag(fuzzy_trigger)));
        }
        Ok(self.form(endpoint, params))
    }
}

fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

fn require_project(project_id: ProjectId) -> Result<()> {
    if project_id == 0 {
        return Err(ApiError::invalid("project id is required"));
    }
    Ok(())
}

fn require_text(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(format!("{what} is required")));
    }
    Ok(())
}

fn require_items<T>(what: &str, items: &[T]) -> Result<()> {
    if items.is_empty() {
        return Err(ApiError::invalid(format!("{what} must not be empty")));
    }
    Ok(())
}

fn require_email(email: &str) -> Result<()> {
    require_text("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::invalid(format!("{email:?} is not an email address"))),
    }
}

fn decode_result<T: DeserializeOwned + Default>(envelope: Envelope) -> Result<T> {
    match envelope.result {
        Some(result) => Ok(serde_json::from_value(result)?),
        None => Ok(T::default()),
    }
}

/// Map a reply to its envelope, turning every failure the platform reports
/// into `ApiError::Api`.
fn check_envelope(response: &HttpResponse) -> Result<Envelope> {
    if response.status != 200 {
        return Err(http_failure(response));
    }
    let envelope: Envelope = serde_json::from_slice(&response.body)?;
    let Some(status) = &envelope.response else {
        return Err(ApiError::Api {
            status: "fail".to_string(),
            code: "-1".to_string(),
            message: "\"response\" key is not present".to_string(),
        });
    };
    if let Some(outcome) = status.status.as_deref().filter(|s| *s != wire::SUCCESS) {
        tracing::warn!(code = %status.code, message = %status.message, "request rejected");
        return Err(ApiError::Api {
            status: outcome.to_string(),
            code: status.code.clone(),
            message: status.message.clone(),
        });
    }
    Ok(envelope)
}

/// Error for a non-200 reply. The platform's own code and message win when
/// the body is an envelope; otherwise the HTTP status stands in for both.
fn http_failure(response: &HttpResponse) -> ApiError {
    if let Ok(Envelope { response: Some(status), .. }) = serde_json::from_slice::<Envelope>(&response.body) {
        if !status.code.is_empty() || !status.message.is_empty() {
            tracing::warn!(http_status = response.status, code = %status.code, "request failed");
            return ApiError::Api {
                status: status.status.filter(|s| !s.is_empty()).unwrap_or_else(|| "fail".to_string()),
                code: status.code,
                message: status.message,
            };
        }
    }
    tracing::warn!(http_status = response.status, "request failed");
    let body = response.text();
    let message = match body.trim() {
        "" => ureq::http::StatusCode::from_u16(response.status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("HTTP error")
            .to_string(),
        text => text.to_string(),
    };
    ApiError::Api {
        status: "fail".to_string(),
        code: response.status.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExportFilter, FileType, UploadTags};
    use std::io::Write;

    fn client() -> PoEditorClient {
        let config = ClientConfig::new("tok")
            .unwrap()
            .with_base_url("http://localhost:3000")
            .unwrap();
        PoEditorClient::new(config)
    }

    fn form_fields(req: &HttpRequest) -> &[(String, String)] {
        match &req.body {
            Some(RequestBody::Form(fields)) => fields,
            other => panic!("expected form body, got {other:?}"),
        }
    }

    fn ok(result: &str) -> HttpResponse {
        HttpResponse::new(
            200,
            format!(r#"{{"response":{{"status":"success","code":"200","message":"OK"}},"result":{result}}}"#),
        )
    }

    #[test]
    fn build_list_projects_injects_token() {
        let req = client().build_list_projects();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/projects/list");
        assert_eq!(
            form_fields(&req),
            &[("api_token".to_string(), "tok".to_string())]
        );
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())]
        );
    }

    #[test]
    fn build_create_project_omits_missing_description() {
        let req = client().build_create_project("Site", None).unwrap();
        assert_eq!(req.url, "http://localhost:3000/projects/add");
        assert_eq!(req.field("name"), Some("Site"));
        assert_eq!(req.field("description"), None);
    }

    #[test]
    fn build_create_project_requires_name() {
        let err = client().build_create_project(" ", Some("d")).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn project_id_zero_is_rejected_everywhere() {
        let c = client();
        let term = [NewTerm::new("a")];
        let key = [TermKey::new("a", "")];
        let translation = [TranslationUpdate::new(TermKey::new("a", ""), "b")];
        let mut update = TermUpdate::new(TermKey::new("a", ""));
        update.new_term = Some("b".to_string());
        let comment = [TermComment {
            term: "a".to_string(),
            context: String::new(),
            comment: "c".to_string(),
        }];
        let file = tempfile::NamedTempFile::new().unwrap();
        let results = [
            c.build_view_project(0),
            c.build_delete_project(0),
            c.build_update_project(0, &ProjectUpdate { name: Some("n".into()), ..Default::default() }),
            c.build_set_reference_language(0, "fr"),
            c.build_clear_reference_language(0),
            c.build_list_languages(0),
            c.build_add_language(0, "fr"),
            c.build_delete_language(0, "fr"),
            c.build_list_terms(0, None),
            c.build_add_terms(0, &term),
            c.build_delete_terms(0, &key),
            c.build_sync_terms(0, &term),
            c.build_export(0, "fr", &ExportOptions::default()),
            c.build_add_contributor(0, "Peter", "peter@example.org", "fr"),
            c.build_add_administrator(0, "John", "john@example.org"),
            c.build_remove_contributor(0, "john@example.org", None),
            c.build_update_language(0, "fr", &translation, false),
            c.build_update_terms(0, &[update], false),
            c.build_add_comments(0, &comment),
            c.build_upload(0, file.path(), &UploadOptions::new(UpdateMode::Terms)),
            c.build_list_contributors(Some(0), None),
        ];
        for result in results {
            let err = result.unwrap_err();
            assert!(err.is_invalid_argument(), "unexpected error {err}");
        }
    }

    #[test]
    fn build_update_project_needs_a_field() {
        let err = client().build_update_project(1, &ProjectUpdate::default()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn clear_reference_language_sends_empty_value() {
        let req = client().build_clear_reference_language(5).unwrap();
        assert_eq!(req.url, "http://localhost:3000/projects/update");
        assert_eq!(req.field("reference_language"), Some(""));
    }

    #[test]
    fn build_add_terms_encodes_data_as_json() {
        let terms = [
            NewTerm::new("Welcome").reference("Homepage title"),
            NewTerm::new("one project found")
                .plural("%d projects found")
                .tag("first_tag"),
        ];
        let req = client().build_add_terms(9, &terms).unwrap();
        assert_eq!(req.url, "http://localhost:3000/terms/add");
        let data: serde_json::Value = serde_json::from_str(req.field("data").unwrap()).unwrap();
        assert_eq!(data.as_array().unwrap().len(), 2);
        assert_eq!(data[1]["plural"], "%d projects found");
        assert_eq!(data[1]["tags"][0], "first_tag");
    }

    #[test]
    fn build_add_terms_rejects_empty_list_and_blank_term() {
        assert!(client().build_add_terms(9, &[]).unwrap_err().is_invalid_argument());
        assert!(client()
            .build_add_terms(9, &[NewTerm::new("")])
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn build_update_terms_requires_changes() {
        let unchanged = [TermUpdate::new(TermKey::new("a", ""))];
        assert!(client().build_update_terms(1, &unchanged, false).unwrap_err().is_invalid_argument());

        let mut update = TermUpdate::new(TermKey::new("a", ""));
        update.new_term = Some("b".to_string());
        let req = client().build_update_terms(1, &[update], true).unwrap();
        assert_eq!(req.field("fuzzy_trigger"), Some("1"));
    }

    #[test]
    fn build_sync_terms_accepts_empty_list() {
        let req = client().build_sync_terms(3, &[]).unwrap();
        assert_eq!(req.url, "http://localhost:3000/projects/sync");
        assert_eq!(req.field("data"), Some("[]"));
    }

    #[test]
    fn build_export_serializes_filters_and_tags() {
        let options = ExportOptions::new(FileType::KeyValueJson)
            .filter(ExportFilter::Translated)
            .filter(ExportFilter::NotFuzzy)
            .tag("release");
        let req = client().build_export(4, "fr", &options).unwrap();
        assert_eq!(req.field("type"), Some("key_value_json"));
        assert_eq!(req.field("filters"), Some(r#"["translated","not_fuzzy"]"#));
        assert_eq!(req.field("tags"), Some(r#"["release"]"#));
    }

    #[test]
    fn build_export_defaults_to_po_without_filters() {
        let req = client().build_export(4, "fr", &ExportOptions::default()).unwrap();
        assert_eq!(req.field("type"), Some("po"));
        assert_eq!(req.field("filters"), None);
        assert!(client().build_export(4, "", &ExportOptions::default()).is_err());
    }

    #[test]
    fn build_download_requires_absolute_url() {
        let file = ExportedFile { url: "/download/file/x".to_string() };
        assert!(client().build_download(&file).unwrap_err().is_invalid_argument());
        let file = ExportedFile { url: "https://api.poeditor.com/v2/download/file/x".to_string() };
        let req = client().build_download(&file).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.body.is_none());
    }

    #[test]
    fn build_upload_reads_file_into_multipart() {
        let mut file = tempfile::Builder::new().suffix(".po").tempfile().unwrap();
        file.write_all(b"msgid \"a\"\nmsgstr \"b\"\n").unwrap();

        let options = UploadOptions::new(UpdateMode::Translations)
            .language("fr")
            .overwrite(true)
            .sync_terms(true)
            .tags(UploadTags { all: vec!["x".into()], ..Default::default() });
        let req = client().build_upload(2, file.path(), &options).unwrap();
        assert_eq!(req.url, "http://localhost:3000/projects/upload");
        let Some(RequestBody::Multipart(multipart)) = &req.body else {
            panic!("expected multipart body");
        };
        assert_eq!(multipart.file.content, b"msgid \"a\"\nmsgstr \"b\"\n");
        assert_eq!(req.field("api_token"), Some("tok"));
        assert_eq!(req.field("updating"), Some("translations"));
        assert_eq!(req.field("overwrite"), Some("1"));
        // Translations mode drops term-only options.
        assert_eq!(req.field("sync_terms"), None);
        assert_eq!(req.field("tags"), None);
        assert_eq!(req.headers[0].1, multipart.content_type());
    }

    #[test]
    fn build_upload_validates_before_reading() {
        let c = client();
        let missing = Path::new("/definitely/not/here.po");
        let err = c.build_upload(2, missing, &UploadOptions::new(UpdateMode::Terms)).unwrap_err();
        assert!(err.is_invalid_argument());

        let file = tempfile::NamedTempFile::new().unwrap();
        let err = c
            .build_upload(2, file.path(), &UploadOptions::new(UpdateMode::TermsTranslations))
            .unwrap_err();
        assert!(err.to_string().contains("language code is required"));
    }

    #[test]
    fn build_contributor_requests() {
        let c = client();
        let req = c.build_add_administrator(1, "John", "john@example.org").unwrap();
        assert_eq!(req.field("admin"), Some("1"));
        assert_eq!(req.field("language"), None);
        assert!(c.build_add_contributor(1, "Peter", "not-an-email", "fr").is_err());
        assert!(c.build_list_contributors(None, Some("fr")).is_err());
        let req = c.build_list_contributors(None, None).unwrap();
        assert_eq!(form_fields(&req).len(), 1);
    }

    #[test]
    fn parse_list_projects_success() {
        let response = ok(
            r#"{"projects":[
                {"id":1,"name":"A","public":0,"open":0,"created":"2013-06-10T11:08:54+0000"},
                {"id":2,"name":"B","public":1,"open":1,"created":"2013-06-11T11:08:54+0000"}]}"#,
        );
        let projects = client().parse_list_projects(response).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].name, "B");
        assert!(projects[1].public);
    }

    #[test]
    fn parse_list_projects_missing_list_is_empty() {
        let projects = client().parse_list_projects(ok("{}")).unwrap();
        assert!(projects.is_empty());
    }

    #[test]
    fn parse_fail_envelope_preserves_code_and_message() {
        let response = HttpResponse::new(
            200,
            r#"{"response":{"status":"fail","code":"4011","message":"Invalid API Token"}}"#,
        );
        let err = client().parse_list_projects(response).unwrap_err();
        assert_eq!(err.to_string(), "Status 'fail', code 4011: Invalid API Token");
    }

    #[test]
    fn parse_envelope_without_status_is_success() {
        let response = HttpResponse::new(
            200,
            r#"{"response":{"code":"200","message":"OK"},"result":{"projects":[]}}"#,
        );
        let projects = client().parse_list_projects(response).unwrap();
        assert!(projects.is_empty());
    }

    #[test]
    fn parse_http_403_with_envelope() {
        let response = HttpResponse::new(
            403,
            r#"{"response":{"status":"fail","code":"4031","message":"You don't have permission"}}"#,
        );
        match client().parse_view_project(response).unwrap_err() {
            ApiError::Api { code, message, .. } => {
                assert_eq!(code, "4031");
                assert_eq!(message, "You don't have permission");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn parse_http_404_without_body_uses_reason() {
        let err = client().parse_view_project(HttpResponse::new(404, "")).unwrap_err();
        match err {
            ApiError::Api { status, code, message } => {
                assert_eq!(status, "fail");
                assert_eq!(code, "404");
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn parse_missing_response_key() {
        let err = client().parse_list_projects(HttpResponse::new(200, r#"{"list":[]}"#)).unwrap_err();
        assert_eq!(err.remote_code(), Some("-1"));
    }

    #[test]
    fn parse_non_json_is_deserialization_error() {
        let err = client()
            .parse_list_languages(HttpResponse::new(200, "<html>oops</html>"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_upload_summary() {
        let response = ok(
            r#"{"terms":{"parsed":2,"added":0,"deleted":0},
                "translations":{"parsed":1,"added":0,"updated":1}}"#,
        );
        let summary = client().parse_upload(response).unwrap();
        assert_eq!(summary.terms.parsed, 2);
        assert_eq!(summary.translations.updated, 1);
    }

    #[test]
    fn parse_export_requires_url() {
        assert!(client().parse_export(ok("{}")).is_err());
        let file = client()
            .parse_export(ok(r#"{"url":"https://api.poeditor.com/v2/download/file/abc"}"#))
            .unwrap();
        assert!(file.url.ends_with("/abc"));
    }

    #[test]
    fn parse_download_returns_raw_bytes() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: vec![0, 159, 146, 150],
        };
        assert_eq!(client().parse_download(response).unwrap(), vec![0, 159, 146, 150]);
        let err = client().parse_download(HttpResponse::new(410, "expired")).unwrap_err();
        assert_eq!(err.remote_code(), Some("410"));
    }
}
