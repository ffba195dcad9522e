//! CSV import dialog as a state machine.
//!
//! ```text
//!   Upload --preview()--> Preview --commit()--> Importing --> Complete
//!     ^                     |  ^                    |
//!     +------back()---------+  +------on error------+
//! ```
//!
//! A file is checked locally (extension and size) before anything is sent.
//! A failed preview stays in `Upload`; a failed commit returns to
//! `Preview`. Both keep the selected file so the action can be retried.
//! Every request is bounded by the workflow timeout and can be cancelled.

use std::future::Future;
use std::time::Duration;

use chooseme_core::csv_import::{check_upload, CsvImportReport};
use tokio_util::sync::CancellationToken;

use crate::api::ImportApi;
use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStep {
    Upload,
    Preview,
    Importing,
    Complete,
}

/// A file accepted by the local checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

pub struct ImportWorkflow<A> {
    api: A,
    step: ImportStep,
    file: Option<SelectedFile>,
    preview: Option<CsvImportReport>,
    result: Option<CsvImportReport>,
    error: Option<String>,
    timeout: Duration,
}

impl<A: ImportApi> ImportWorkflow<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            step: ImportStep::Upload,
            file: None,
            preview: None,
            result: None,
            error: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn step(&self) -> ImportStep {
        self.step
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn preview_report(&self) -> Option<&CsvImportReport> {
        self.preview.as_ref()
    }

    pub fn result(&self) -> Option<&CsvImportReport> {
        self.result.as_ref()
    }

    /// Message to show under the dialog, if the last action failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn fail(&mut self, err: ClientError) -> ClientError {
        self.error = Some(err.user_message());
        err
    }

    /// Pick a file. Only possible in `Upload`. A rejected file leaves the
    /// previous selection in place.
    pub fn select_file(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), ClientError> {
        if self.step != ImportStep::Upload {
            return Err(ClientError::Validation(
                "Go back to the upload step to choose another file".into(),
            ));
        }
        if let Err(e) = check_upload(name, bytes.len()) {
            return Err(self.fail(ClientError::Validation(e.to_string())));
        }
        self.file = Some(SelectedFile {
            name: name.to_string(),
            bytes,
        });
        self.error = None;
        Ok(())
    }

    async fn bounded<T>(
        &self,
        cancel: &CancellationToken,
        request: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, request) => {
                outcome.unwrap_or(Err(ClientError::Timeout))
            }
        }
    }

    /// Dry-run the selected file. On success moves to `Preview`.
    pub async fn preview(&mut self, cancel: &CancellationToken) -> Result<&CsvImportReport, ClientError> {
        if self.step != ImportStep::Upload {
            return Err(ClientError::Validation("Preview is only available before importing".into()));
        }
        let Some(file) = self.file.clone() else {
            return Err(self.fail(ClientError::Validation("Please select a CSV file".into())));
        };
        self.error = None;

        let outcome = self
            .bounded(cancel, self.api.import_csv(&file.name, &file.bytes, true))
            .await;
        match outcome {
            Ok(report) => {
                tracing::debug!(
                    to_create = report.counts.to_create,
                    to_update = report.counts.to_update,
                    skipped = report.counts.skipped,
                    "CSV preview received"
                );
                self.step = ImportStep::Preview;
                Ok(self.preview.insert(report))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Import the previewed file for real. The server validates it again.
    pub async fn commit(&mut self, cancel: &CancellationToken) -> Result<&CsvImportReport, ClientError> {
        if self.step != ImportStep::Preview {
            return Err(ClientError::Validation("Preview the file before importing".into()));
        }
        let Some(file) = self.file.clone() else {
            return Err(self.fail(ClientError::Validation("Please select a CSV file".into())));
        };
        self.step = ImportStep::Importing;
        self.error = None;

        let outcome = self
            .bounded(cancel, self.api.import_csv(&file.name, &file.bytes, false))
            .await;
        match outcome {
            Ok(report) => {
                tracing::info!(
                    created = report.counts.created,
                    updated = report.counts.updated,
                    skipped = report.counts.skipped,
                    "CSV import finished"
                );
                self.step = ImportStep::Complete;
                Ok(self.result.insert(report))
            }
            Err(e) => {
                self.step = ImportStep::Preview;
                Err(self.fail(e))
            }
        }
    }

    /// From `Preview` back to `Upload`, keeping the file.
    pub fn back(&mut self) {
        if self.step == ImportStep::Preview {
            self.step = ImportStep::Upload;
            self.preview = None;
            self.error = None;
        }
    }

    /// Start over with nothing selected.
    pub fn reset(&mut self) {
        self.step = ImportStep::Upload;
        self.file = None;
        self.preview = None;
        self.result = None;
        self.error = None;
    }
}
