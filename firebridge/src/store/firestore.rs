//! Cloud Firestore backend over the REST API (v1).
//!
//! Only the three document calls the jobs need are implemented:
//! list (drained page by page), get and a masked PATCH used as merge-write.
//! The same client talks to the local emulator when built with
//! [`FirestoreStore::emulator`].

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::Url;

use super::traits::DocumentStore;
use super::value::{decode_fields, encode_fields, FirestoreValue};
use crate::document::RemoteDocument;
use crate::error::{Error, Result};

pub const PRODUCTION_ENDPOINT: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";
const EMULATOR_TOKEN: &str = "owner";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, FirestoreValue>,
}

impl WireDocument {
    fn into_remote(self) -> Result<RemoteDocument> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::Decode(format!("document name without id: '{}'", self.name)))?
            .to_string();
        let fields = decode_fields(&self.fields)
            .map_err(|e| Error::document(id.clone(), e.to_string()))?;
        Ok(RemoteDocument::new(id, fields))
    }
}

#[derive(Debug, Serialize)]
struct WriteBody {
    fields: BTreeMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Firestore REST client scoped to one project and database.
pub struct FirestoreStore {
    client: reqwest::Client,
    documents_url: Url,
    token: String,
    page_size: u32,
}

impl FirestoreStore {
    /// Build a client for `endpoint` (scheme and host, e.g.
    /// `https://firestore.googleapis.com`).
    pub fn new(
        endpoint: &str,
        project_id: &str,
        database: &str,
        token: impl Into<String>,
        page_size: u32,
    ) -> Result<Self> {
        if project_id.is_empty() {
            return Err(Error::Config("Firestore project id is empty".to_string()));
        }
        if page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".to_string()));
        }

        let mut documents_url = Url::parse(endpoint)?;
        documents_url
            .path_segments_mut()
            .map_err(|_| Error::Config(format!("Endpoint cannot be a base URL: {}", endpoint)))?
            .clear()
            .extend(["v1", "projects", project_id, "databases", database, "documents"]);

        let client = reqwest::Client::builder()
            .user_agent(concat!("firebridge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            documents_url,
            token: token.into(),
            page_size,
        })
    }

    /// Production Firestore, authenticated with an OAuth2 bearer token.
    pub fn production(
        project_id: &str,
        database: &str,
        token: impl Into<String>,
        page_size: u32,
    ) -> Result<Self> {
        Self::new(PRODUCTION_ENDPOINT, project_id, database, token, page_size)
    }

    /// The Firestore emulator at `host` (`host:port`, as in
    /// `FIRESTORE_EMULATOR_HOST`). The emulator accepts the `owner` token.
    pub fn emulator(host: &str, project_id: &str, database: &str, page_size: u32) -> Result<Self> {
        let endpoint = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        Self::new(&endpoint, project_id, database, EMULATOR_TOKEN, page_size)
    }

    pub fn documents_url(&self) -> &Url {
        &self.documents_url
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("Firestore URL cannot be a base".to_string()))?
            .extend(segments);
        Ok(url)
    }

    async fn list_page(
        &self,
        collection: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ListDocumentsResponse> {
        let mut url = self.url_for(&[collection])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let resp = error_for_status(resp).await?;
        Ok(resp.json().await?)
    }
}

/// Map non-success responses onto `Error::Auth` / `Error::Api`.
async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Auth {
            status: status.as_u16(),
        });
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Quote a field name for `updateMask.fieldPaths` unless it is a simple
/// identifier.
pub fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<RemoteDocument>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_page(collection, self.page_size, page_token.as_deref())
                .await?;
            tracing::debug!(
                "Fetched page of {} documents from '{}'",
                page.documents.len(),
                collection
            );
            for doc in page.documents {
                documents.push(doc.into_remote()?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<RemoteDocument>> {
        let url = self.url_for(&[collection, id])?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = error_for_status(resp).await?;
        let doc: WireDocument = resp.json().await?;
        doc.into_remote().map(Some)
    }

    async fn set_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        let mut url = self.url_for(&[collection, id])?;
        {
            let mut query = url.query_pairs_mut();
            for name in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(name));
            }
        }

        let body = WriteBody {
            fields: encode_fields(&fields),
        };
        let resp = self
            .client
            .patch(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        error_for_status(resp).await?;
        Ok(())
    }

    async fn check_connection(&self, collection: &str) -> Result<()> {
        self.list_page(collection, 1, None).await.map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "firestore"
    }
}
