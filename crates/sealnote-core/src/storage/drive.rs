//! Remote backend over the Drive v3 REST API.
//!
//! The document is a single file named `file_name` in the drive root. Its
//! `modifiedTime` is set explicitly on every upload so the synchronization
//! engine compares the time the document was written, not uploaded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::debug;

use super::traits::{StorageFormat, TokenProvider};
use super::types::StoredBlob;
use crate::error::BackendError;

/// Public endpoint of the Drive API.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DriveBackend {
    client: Client,
    base_url: String,
    file_name: String,
    tokens: Arc<dyn TokenProvider>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFile {
    id: String,
    modified_time: DateTime<Utc>,
}

impl DriveBackend {
    pub fn new(
        base_url: impl Into<String>,
        file_name: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            file_name: file_name.into(),
            tokens,
        })
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token.expose_secret()).send().await?;
        check_status(response)
    }

    /// Metadata of the document file, if exactly one exists.
    async fn query(&self) -> Result<Option<RemoteFile>, BackendError> {
        let q = format!(
            "name = '{}' and 'root' in parents and trashed = false",
            self.file_name.replace('\\', "\\\\").replace('\'', "\\'")
        );
        let url = format!("{}/drive/v3/files", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("q", q.as_str()), ("fields", "files(id,modifiedTime)")]);
        let list: FileList = self.authorized(request).await?.json().await?;

        let mut files = list.files.into_iter();
        match (files.next(), files.next()) {
            (None, _) => Ok(None),
            (Some(file), None) => Ok(Some(file)),
            (Some(_), Some(_)) => Err(BackendError::MoreThanOneRemoteFile(self.file_name.clone())),
        }
    }

    async fn upload(&self, existing: Option<&RemoteFile>, blob: &StoredBlob) -> Result<(), BackendError> {
        let (boundary, body) = multipart_body(&self.file_name, blob)?;
        let request = match existing {
            Some(file) => self.client.patch(format!(
                "{}/upload/drive/v3/files/{}",
                self.base_url, file.id
            )),
            None => self
                .client
                .post(format!("{}/upload/drive/v3/files", self.base_url)),
        };
        let request = request
            .query(&[("uploadType", "multipart")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body);
        self.authorized(request).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageFormat for DriveBackend {
    fn name(&self) -> &str {
        "drive"
    }

    async fn read(&self) -> Result<Option<StoredBlob>, BackendError> {
        let Some(file) = self.query().await? else {
            return Ok(None);
        };
        let url = format!("{}/drive/v3/files/{}", self.base_url, file.id);
        let request = self.client.get(&url).query(&[("alt", "media")]);
        let bytes = self.authorized(request).await?.bytes().await?;
        debug!(file_id = %file.id, len = bytes.len(), "Downloaded remote document");
        Ok(Some(StoredBlob::new(bytes.to_vec(), file.modified_time)))
    }

    async fn write(&self, blob: &StoredBlob) -> Result<(), BackendError> {
        let existing = self.query().await?;
        self.upload(existing.as_ref(), blob).await
    }
}

fn check_status(response: Response) -> Result<Response, BackendError> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(BackendError::Unauthorized(response.status().as_u16()))
        }
        _ => Ok(response.error_for_status()?),
    }
}

/// `multipart/related` upload body: JSON metadata, then the document.
fn multipart_body(file_name: &str, blob: &StoredBlob) -> Result<(String, Vec<u8>), BackendError> {
    let mut nonce = [0u8; 18];
    getrandom::getrandom(&mut nonce)
        .map_err(|e| BackendError::InvalidResponse(format!("Random generation failed: {}", e)))?;
    let boundary = format!("sealnote_{}", URL_SAFE_NO_PAD.encode(nonce));

    let metadata = serde_json::json!({
        "name": file_name,
        "modifiedTime": blob.modified_time.to_rfc3339_opts(SecondsFormat::Millis, true),
    });

    let mut body = Vec::with_capacity(blob.bytes.len() + 256);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: application/json\r\n\r\n",
            b = boundary,
            m = metadata
        )
        .as_bytes(),
    );
    body.extend_from_slice(&blob.bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    Ok((boundary, body))
}
