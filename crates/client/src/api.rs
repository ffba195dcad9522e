//! Typed HTTP client for the Choose Me Auto REST API.
//!
//! The import workflow and the listing flow talk to the server through the
//! [`ImportApi`] and [`ListingApi`] traits so they can be driven by a fake
//! in tests.

use async_trait::async_trait;
use chooseme_core::csv_import::CsvImportReport;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::{AdminSession, SessionStore};

/// Header carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Server endpoints used by the admin panel.
pub mod paths {
    pub const LOGIN: &str = "/api/admin/login";
    pub const ADMIN_VEHICLES: &str = "/api/admin/vehicles";
    pub const IMPORT_CSV: &str = "/api/admin/vehicles/import-csv";
    pub const CSV_TEMPLATE: &str = "/api/admin/vehicles/csv-template";
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ImportApi: Send + Sync {
    /// Upload a CSV file. With `dry_run` the server only plans the import.
    async fn import_csv(
        &self,
        file_name: &str,
        bytes: &[u8],
        dry_run: bool,
    ) -> Result<CsvImportReport, ClientError>;
}

#[async_trait]
pub trait ListingApi: Send + Sync {
    async fn create_vehicle(&self, vehicle: &serde_json::Value) -> Result<CreatedVehicle, ClientError>;

    async fn upload_photos(
        &self,
        vehicle_id: i64,
        photos: &[PhotoFile],
    ) -> Result<UploadedPhotos, ClientError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    expires_in: i64,
}

/// The fields of a created vehicle the panel needs next.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedVehicle {
    pub id: i64,
    pub vin: String,
    pub stock_number: String,
}

/// A photo picked for upload.
#[derive(Debug, Clone)]
pub struct PhotoFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Photo list after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedPhotos {
    pub photo_count: usize,
    pub photo_urls: Vec<String>,
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: Option<AdminSession>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            config,
            session: None,
        })
    }

    /// Client resuming a session restored from disk.
    pub fn with_session(mut self, session: Option<AdminSession>) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> Option<&AdminSession> {
        self.session.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.is_expired(Utc::now()))
    }

    /// Log in and keep the new session. The session is also saved to
    /// `store` when given.
    pub async fn login(
        &mut self,
        password: &str,
        store: Option<&SessionStore>,
    ) -> Result<AdminSession, ClientError> {
        let request = self
            .http
            .post(self.config.url(paths::LOGIN))
            .json(&serde_json::json!({ "password": password }));
        let body: LoginResponse = send_json(request).await?;
        let session = AdminSession::new(body.token, body.expires_in, Utc::now());

        if let Some(store) = store {
            store.save(&session).await?;
        }
        tracing::info!("Admin logged in");
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Forget the session here and on disk.
    pub async fn logout(&mut self, store: Option<&SessionStore>) -> Result<(), ClientError> {
        self.session = None;
        if let Some(store) = store {
            store.clear().await?;
        }
        Ok(())
    }

    fn token(&self) -> Result<&str, ClientError> {
        match &self.session {
            Some(session) if !session.is_expired(Utc::now()) => Ok(session.token.as_str()),
            _ => Err(ClientError::NotLoggedIn),
        }
    }

    fn admin(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        Ok(builder.header(ADMIN_TOKEN_HEADER, self.token()?))
    }

    pub async fn delete_vehicle(&self, vehicle_id: i64) -> Result<(), ClientError> {
        let url = self.config.url(&format!("{}/{vehicle_id}", paths::ADMIN_VEHICLES));
        let request = self.admin(self.http.delete(url))?;
        check_status(send(request).await?).await.map(|_| ())
    }

    /// The import template as raw CSV bytes.
    pub async fn csv_template(&self) -> Result<Vec<u8>, ClientError> {
        let request = self.admin(self.http.get(self.config.url(paths::CSV_TEMPLATE)))?;
        let response = check_status(send(request).await?).await?;
        Ok(response.bytes().await.map_err(map_reqwest)?.to_vec())
    }
}

#[async_trait]
impl ImportApi for ApiClient {
    async fn import_csv(
        &self,
        file_name: &str,
        bytes: &[u8],
        dry_run: bool,
    ) -> Result<CsvImportReport, ClientError> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let url = self.config.url(paths::IMPORT_CSV);
        let request = self
            .admin(self.http.post(url))?
            .query(&[("dry_run", dry_run)])
            .multipart(Form::new().part("file", part));
        send_json(request).await
    }
}

#[async_trait]
impl ListingApi for ApiClient {
    async fn create_vehicle(&self, vehicle: &serde_json::Value) -> Result<CreatedVehicle, ClientError> {
        let request = self
            .admin(self.http.post(self.config.url(paths::ADMIN_VEHICLES)))?
            .json(vehicle);
        send_json(request).await
    }

    async fn upload_photos(
        &self,
        vehicle_id: i64,
        photos: &[PhotoFile],
    ) -> Result<UploadedPhotos, ClientError> {
        let mut form = Form::new();
        for photo in photos {
            let part = Part::bytes(photo.bytes.clone())
                .file_name(photo.file_name.clone())
                .mime_str(&photo.content_type)?;
            form = form.part("files", part);
        }
        let url = self
            .config
            .url(&format!("{}/{vehicle_id}/photos", paths::ADMIN_VEHICLES));
        let request = self.admin(self.http.post(url))?.multipart(form);
        send_json(request).await
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn map_reqwest(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Transport(err)
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
    request.send().await.map_err(map_reqwest)
}

/// Pass 2xx responses through; turn anything else into [`ClientError::Http`].
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), "API request failed");
    Err(ClientError::from_response_body(status.as_u16(), &body))
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = check_status(send(request).await?).await?;
    response.json::<T>().await.map_err(map_reqwest)
}
