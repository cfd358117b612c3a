use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::ports::{MatchRepository, ProfileSource};
use crate::error::EngineError;
use crate::models::{Match, Profile};

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<AppwriteError> for EngineError {
    fn from(err: AppwriteError) -> Self {
        match &err {
            AppwriteError::RequestError(_) => EngineError::Network(err.to_string()),
            AppwriteError::ApiError { status: 401 | 403, .. } => {
                EngineError::Permission(err.to_string())
            }
            AppwriteError::ApiError { .. } => EngineError::Network(err.to_string()),
            AppwriteError::NotFound(_) | AppwriteError::InvalidResponse(_) => {
                EngineError::General(err.to_string())
            }
        }
    }
}

/// One page of the profiles collection
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub profiles: Vec<Profile>,
    /// Documents the server returned, parsed or not
    pub document_count: usize,
    pub last_document_id: Option<String>,
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub profiles: String,
    pub matches: String,
}

/// Appwrite API client
///
/// Handles all communication with the Appwrite backend including:
/// - Fetching a user's own dog profile
/// - Paging candidate profiles
/// - Storing matches
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Result<Self, AppwriteError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    fn with_queries(url: String, queries: &[String]) -> String {
        let params = queries
            .iter()
            .map(|q| format!("queries[]={}", urlencoding::encode(q)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", url, params)
    }

    async fn fetch_documents(&self, url: &str) -> Result<Vec<Value>, AppwriteError> {
        let response = self
            .client
            .get(url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppwriteError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let mut json: Value = response.json().await?;
        match json.get_mut("documents").map(Value::take) {
            Some(Value::Array(documents)) => Ok(documents),
            _ => Err(AppwriteError::InvalidResponse("Missing documents array".into())),
        }
    }

    /// Get the dog profile owned by `owner_id`
    pub async fn get_profile(&self, owner_id: &str) -> Result<Profile, AppwriteError> {
        let url = Self::with_queries(
            self.documents_url(&self.collections.profiles),
            &[
                format!("equal(\"ownerId\", [\"{}\"])", owner_id),
                "limit(1)".to_string(),
            ],
        );

        tracing::debug!("Fetching profile for owner: {}", owner_id);

        let documents = self.fetch_documents(&url).await?;
        let doc = documents
            .first()
            .ok_or_else(|| AppwriteError::NotFound(format!("Profile not found for user {}", owner_id)))?;

        document_to_profile(doc)
            .map_err(|e| AppwriteError::InvalidResponse(format!("Failed to parse profile: {}", e)))
    }

    /// Page through candidate profiles not owned by `owner_id`
    ///
    /// Paging metadata describes the raw server page, including documents
    /// that failed to parse.
    pub async fn list_profiles(
        &self,
        owner_id: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<ProfilePage, AppwriteError> {
        let mut queries = vec![
            format!("notEqual(\"ownerId\", [\"{}\"])", owner_id),
            format!("limit({})", limit),
        ];
        if let Some(cursor) = cursor {
            queries.push(format!("cursorAfter(\"{}\")", cursor));
        }

        let url = Self::with_queries(self.documents_url(&self.collections.profiles), &queries);
        let documents = self.fetch_documents(&url).await?;
        let last_document_id = documents
            .last()
            .and_then(|doc| doc.get("$id").or_else(|| doc.get("id")))
            .and_then(Value::as_str)
            .map(str::to_string);

        let profiles: Vec<Profile> = documents
            .iter()
            .filter_map(|doc| match document_to_profile(doc) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Skipping malformed profile document: {}", e);
                    None
                }
            })
            .filter(|p| p.owner_id != owner_id)
            .collect();

        tracing::debug!(
            "Fetched {} candidate profiles from {} documents",
            profiles.len(),
            documents.len()
        );

        Ok(ProfilePage {
            profiles,
            document_count: documents.len(),
            last_document_id,
        })
    }

    /// Store a match document
    pub async fn create_match(&self, m: &Match) -> Result<(), AppwriteError> {
        let url = self.documents_url(&self.collections.matches);
        let data = serde_json::to_value(m)
            .map_err(|e| AppwriteError::InvalidResponse(e.to_string()))?;

        let response = self
            .client
            .post(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .json(&json!({ "documentId": m.id, "data": data }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            // Same id already stored
            tracing::debug!("Match {} already exists", m.id);
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppwriteError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        tracing::debug!("Stored match {}", m.id);
        Ok(())
    }
}

/// Convert an Appwrite document into a profile
///
/// Accepts `$id` in place of `id` and flat `latitude`/`longitude` attributes
/// in place of a nested `location`.
fn document_to_profile(doc: &Value) -> Result<Profile, serde_json::Error> {
    let mut data = doc.get("data").unwrap_or(doc).clone();

    if let Some(obj) = data.as_object_mut() {
        if !obj.contains_key("id") {
            if let Some(id) = doc.get("$id").cloned() {
                obj.insert("id".to_string(), id);
            }
        }
        if !obj.contains_key("location") {
            let lat = obj.get("latitude").and_then(Value::as_f64);
            let lon = obj.get("longitude").and_then(Value::as_f64);
            if let (Some(latitude), Some(longitude)) = (lat, lon) {
                obj.insert(
                    "location".to_string(),
                    json!({ "latitude": latitude, "longitude": longitude }),
                );
            }
        }
    }

    serde_json::from_value(data)
}

#[async_trait]
impl MatchRepository for AppwriteClient {
    async fn create(&self, m: &Match) -> Result<(), EngineError> {
        Ok(self.create_match(m).await?)
    }
}

/// Candidate feed for one user, backed by Appwrite paging
///
/// Wraps back to the first page once a short page signals the end of the
/// collection.
pub struct AppwriteProfileSource {
    client: Arc<AppwriteClient>,
    owner_id: String,
    cursor: tokio::sync::Mutex<Option<String>>,
}

impl AppwriteProfileSource {
    pub fn new(client: Arc<AppwriteClient>, owner_id: impl Into<String>) -> Self {
        Self {
            client,
            owner_id: owner_id.into(),
            cursor: tokio::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl ProfileSource for AppwriteProfileSource {
    async fn get_batch(&self, size: usize) -> Result<Vec<Profile>, EngineError> {
        let mut cursor = self.cursor.lock().await;
        let page = self
            .client
            .list_profiles(&self.owner_id, size, cursor.as_deref())
            .await?;

        *cursor = if page.document_count < size {
            None
        } else {
            page.last_document_id
        };

        Ok(page.profiles)
    }
}
