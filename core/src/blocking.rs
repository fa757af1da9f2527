//! Blocking facade: one method per POEditor operation.
//!
//! Each call builds its request, validates locally, sends it through the
//! `Transport` and parses the reply. Nothing is retried and nothing is
//! cached; the only state is the immutable configuration.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::client::PoEditorClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    AvailableLanguage, Contributor, ExportOptions, ExportedFile, Language, NewTerm, Project,
    ProjectId, ProjectUpdate, Term, TermComment, TermKey, TermUpdate, TermsSummary,
    TranslationUpdate, TranslationsSummary, UpdateMode, UploadOptions, UploadSummary,
};

/// POEditor API client that performs the HTTP round trip itself.
///
/// ```no_run
/// use poeditor_core::BlockingClient;
///
/// let client = BlockingClient::new("my_token")?;
/// let projects = client.list_projects()?;
/// # Ok::<(), poeditor_core::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BlockingClient<T: Transport = UreqTransport> {
    inner: PoEditorClient,
    transport: T,
}

impl BlockingClient<UreqTransport> {
    /// Client for the public API with default settings.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Ok(Self::with_config(ClientConfig::new(api_token)?))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }

    /// See [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Ok(Self::with_config(ClientConfig::from_env()?))
    }
}

impl<T: Transport> BlockingClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            inner: PoEditorClient::new(config),
            transport,
        }
    }

    /// The request builder/parser this client drives.
    pub fn requests(&self) -> &PoEditorClient {
        &self.inner
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = ?request.method, url = %request.url, "sending request");
        let response = self.transport.execute(&request)?;
        debug!(status = response.status, bytes = response.body.len(), "received response");
        Ok(response)
    }

    // Projects

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let response = self.send(self.inner.build_list_projects())?;
        self.inner.parse_list_projects(response)
    }

    pub fn create_project(&self, name: &str, description: Option<&str>) -> Result<Project> {
        let response = self.send(self.inner.build_create_project(name, description)?)?;
        self.inner.parse_create_project(response)
    }

    pub fn view_project_details(&self, project_id: ProjectId) -> Result<Project> {
        let response = self.send(self.inner.build_view_project(project_id)?)?;
        self.inner.parse_view_project(response)
    }

    pub fn update_project(&self, project_id: ProjectId, update: &ProjectUpdate) -> Result<Project> {
        let response = self.send(self.inner.build_update_project(project_id, update)?)?;
        self.inner.parse_update_project(response)
    }

    pub fn set_reference_language(&self, project_id: ProjectId, language: &str) -> Result<Project> {
        let response = self.send(self.inner.build_set_reference_language(project_id, language)?)?;
        self.inner.parse_update_project(response)
    }

    pub fn clear_reference_language(&self, project_id: ProjectId) -> Result<Project> {
        let response = self.send(self.inner.build_clear_reference_language(project_id)?)?;
        self.inner.parse_update_project(response)
    }

    pub fn delete_project(&self, project_id: ProjectId) -> Result<()> {
        let response = self.send(self.inner.build_delete_project(project_id)?)?;
        self.inner.parse_empty(response)
    }

    // Languages

    pub fn list_project_languages(&self, project_id: ProjectId) -> Result<Vec<Language>> {
        let response = self.send(self.inner.build_list_languages(project_id)?)?;
        self.inner.parse_list_languages(response)
    }

    pub fn available_languages(&self) -> Result<Vec<AvailableLanguage>> {
        let response = self.send(self.inner.build_available_languages())?;
        self.inner.parse_available_languages(response)
    }

    pub fn add_language_to_project(&self, project_id: ProjectId, language: &str) -> Result<()> {
        let response = self.send(self.inner.build_add_language(project_id, language)?)?;
        self.inner.parse_empty(response)
    }

    pub fn delete_language_from_project(&self, project_id: ProjectId, language: &str) -> Result<()> {
        let response = self.send(self.inner.build_delete_language(project_id, language)?)?;
        self.inner.parse_empty(response)
    }

    /// Insert or overwrite translations for one language.
    pub fn update_project_language(
        &self,
        project_id: ProjectId,
        language: &str,
        translations: &[TranslationUpdate],
        fuzzy_trigger: bool,
    ) -> Result<TranslationsSummary> {
        let request = self
            .inner
            .build_update_language(project_id, language, translations, fuzzy_trigger)?;
        let response = self.send(request)?;
        self.inner.parse_update_language(response)
    }

    // Terms

    pub fn view_project_terms(&self, project_id: ProjectId, language: Option<&str>) -> Result<Vec<Term>> {
        let response = self.send(self.inner.build_list_terms(project_id, language)?)?;
        self.inner.parse_list_terms(response)
    }

    pub fn add_terms(&self, project_id: ProjectId, terms: &[NewTerm]) -> Result<TermsSummary> {
        let response = self.send(self.inner.build_add_terms(project_id, terms)?)?;
        self.inner.parse_terms_summary(response)
    }

    pub fn update_terms(
        &self,
        project_id: ProjectId,
        terms: &[TermUpdate],
        fuzzy_trigger: bool,
    ) -> Result<TermsSummary> {
        let response = self.send(self.inner.build_update_terms(project_id, terms, fuzzy_trigger)?)?;
        self.inner.parse_terms_summary(response)
    }

    pub fn delete_terms(&self, project_id: ProjectId, terms: &[TermKey]) -> Result<TermsSummary> {
        let response = self.send(self.inner.build_delete_terms(project_id, terms)?)?;
        self.inner.parse_terms_summary(response)
    }

    pub fn add_comments(&self, project_id: ProjectId, comments: &[TermComment]) -> Result<TermsSummary> {
        let response = self.send(self.inner.build_add_comments(project_id, comments)?)?;
        self.inner.parse_terms_summary(response)
    }

    /// Make the project's terms match `terms`: missing ones are deleted,
    /// new ones added.
    pub fn sync_terms(&self, project_id: ProjectId, terms: &[NewTerm]) -> Result<TermsSummary> {
        let response = self.send(self.inner.build_sync_terms(project_id, terms)?)?;
        self.inner.parse_terms_summary(response)
    }

    // Export

    /// Ask the platform to prepare an export and return its download link.
    pub fn export(&self, project_id: ProjectId, language: &str, options: &ExportOptions) -> Result<ExportedFile> {
        let response = self.send(self.inner.build_export(project_id, language, options)?)?;
        self.inner.parse_export(response)
    }

    /// Export and download the file contents.
    pub fn export_bytes(
        &self,
        project_id: ProjectId,
        language: &str,
        options: &ExportOptions,
    ) -> Result<(String, Vec<u8>)> {
        let file = self.export(project_id, language, options)?;
        let response = self.send(self.inner.build_download(&file)?)?;
        let bytes = self.inner.parse_download(response)?;
        Ok((file.url, bytes))
    }

    /// Export and write the file to `local_file`, or to a new temporary
    /// file named after the export format when `local_file` is `None`.
    /// The temporary file is kept; removing it is up to the caller.
    pub fn export_to_path(
        &self,
        project_id: ProjectId,
        language: &str,
        options: &ExportOptions,
        local_file: Option<&Path>,
    ) -> Result<(String, PathBuf)> {
        let (url, bytes) = self.export_bytes(project_id, language, options)?;
        let path = match local_file {
            Some(path) => path.to_path_buf(),
            None => {
                let (_, path) = tempfile::Builder::new()
                    .prefix("poeditor-")
                    .suffix(&format!(".{}", options.file_type.extension()))
                    .tempfile()?
                    .keep()
                    .map_err(|e| e.error)?;
                path
            }
        };
        std::fs::write(&path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "export written");
        Ok((url, path))
    }

    // Upload

    /// Upload a translation file. The platform accepts at most one upload
    /// every 30 seconds per project; pacing is up to the caller.
    pub fn upload(&self, project_id: ProjectId, file_path: &Path, options: &UploadOptions) -> Result<UploadSummary> {
        let response = self.send(self.inner.build_upload(project_id, file_path, options)?)?;
        self.inner.parse_upload(response)
    }

    /// Import terms only.
    pub fn update_terms_from_file(
        &self,
        project_id: ProjectId,
        file_path: &Path,
        options: UploadOptions,
    ) -> Result<UploadSummary> {
        let options = UploadOptions { mode: UpdateMode::Terms, ..options };
        self.upload(project_id, file_path, &options)
    }

    /// Import terms and the translations for `options.language`.
    pub fn update_terms_translations(
        &self,
        project_id: ProjectId,
        file_path: &Path,
        options: UploadOptions,
    ) -> Result<UploadSummary> {
        let options = UploadOptions { mode: UpdateMode::TermsTranslations, ..options };
        self.upload(project_id, file_path, &options)
    }

    /// Import translations for `options.language` without touching terms.
    pub fn update_translations(
        &self,
        project_id: ProjectId,
        file_path: &Path,
        options: UploadOptions,
    ) -> Result<UploadSummary> {
        let options = UploadOptions { mode: UpdateMode::Translations, ..options };
        self.upload(project_id, file_path, &options)
    }

    // Contributors

    pub fn list_contributors(
        &self,
        project_id: Option<ProjectId>,
        language: Option<&str>,
    ) -> Result<Vec<Contributor>> {
        let response = self.send(self.inner.build_list_contributors(project_id, language)?)?;
        self.inner.parse_list_contributors(response)
    }

    pub fn add_contributor(&self, project_id: ProjectId, name: &str, email: &str, language: &str) -> Result<()> {
        let response = self.send(self.inner.build_add_contributor(project_id, name, email, language)?)?;
        self.inner.parse_empty(response)
    }

    pub fn add_administrator(&self, project_id: ProjectId, name: &str, email: &str) -> Result<()> {
        let response = self.send(self.inner.build_add_administrator(project_id, name, email)?)?;
        self.inner.parse_empty(response)
    }

    pub fn remove_contributor(&self, project_id: ProjectId, email: &str, language: Option<&str>) -> Result<()> {
        let response = self.send(self.inner.build_remove_contributor(project_id, email, language)?)?;
        self.inner.parse_empty(response)
    }
}
