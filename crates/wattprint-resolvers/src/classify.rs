//! Batch query classifier
//!
//! Classifies every query of a conversation in one request against a
//! Vertex-style predict endpoint. Classification is all-or-nothing: a
//! failed call, a failed credential, or any malformed prediction gives the
//! whole batch the fallback category, never a partial result.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};
use wattprint_core::{Error, Result};

use crate::cache::Clock;

/// Category applied when classification cannot be trusted
pub const FALLBACK_CATEGORY: &str = "unknown";

/// How long an issued credential remains valid
pub const TOKEN_VALIDITY: Duration = Duration::from_secs(30 * 60);

/// Refresh when less than this much validity remains
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Issues bearer credentials for the classification service
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self) -> Result<String>;
}

/// Fixed token supplied through configuration
pub struct StaticIssuer {
    token: String,
}

impl StaticIssuer {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialIssuer for StaticIssuer {
    async fn issue(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Token endpoint returning `{"access_token": ...}`
pub struct HttpIssuer {
    client: reqwest::Client,
    token_url: String,
}

impl HttpIssuer {
    pub fn new(client: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            client,
            token_url: token_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[async_trait]
impl CredentialIssuer for HttpIssuer {
    async fn issue(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.token_url)
            .send()
            .await
            .map_err(|e| Error::credential(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::credential(format!(
                "token endpoint returned HTTP {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::credential(format!("token response malformed: {e}")))?;

        Ok(body.access_token)
    }
}

/// Caches an issued credential, refreshing shortly before it expires.
///
/// Concurrent refreshes may race and each issue a token; last write wins,
/// which is harmless since every issued token is valid.
pub struct TokenCache {
    issuer: Arc<dyn CredentialIssuer>,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<(String, SystemTime)>>,
}

impl TokenCache {
    pub fn new(issuer: Arc<dyn CredentialIssuer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            issuer,
            clock,
            cached: Mutex::new(None),
        }
    }

    /// A bearer token with at least the refresh margin of validity left
    pub async fn bearer(&self) -> Result<String> {
        let now = self.clock.now();

        if let Some((token, issued_at)) = self.cached.lock().clone() {
            let age = now.duration_since(issued_at).unwrap_or(Duration::ZERO);
            if age < TOKEN_VALIDITY - TOKEN_REFRESH_MARGIN {
                return Ok(token);
            }
            debug!("cached credential near expiry, refreshing");
        }

        let token = self.issuer.issue().await?;
        *self.cached.lock() = Some((token.clone(), now));
        Ok(token)
    }
}

/// Batch text classification seam.
///
/// Implementations are infallible: output always has the same length and
/// order as the input, falling back wholesale when needed.
#[async_trait]
pub trait QueryClassifier: Send + Sync {
    async fn classify_batch(&self, queries: &[String]) -> Vec<String>;
}

/// Remote Vertex-style predict client
pub struct RemoteBatchClassifier {
    client: reqwest::Client,
    endpoint: String,
    tokens: TokenCache,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<Instance<'a>>,
}

#[derive(Serialize)]
struct Instance<'a> {
    #[serde(rename = "Query")]
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    classes: Vec<String>,
    #[serde(default)]
    scores: Vec<f64>,
}

impl RemoteBatchClassifier {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, tokens: TokenCache) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            tokens,
        }
    }

    async fn try_classify(&self, queries: &[String]) -> Result<Vec<String>> {
        let token = self.tokens.bearer().await?;

        let request = PredictRequest {
            instances: queries
                .iter()
                .map(|query| Instance { query })
                .collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::classification(format!("predict request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::classification(format!(
                "predict endpoint returned HTTP {}",
                response.status()
            )));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| Error::classification(format!("predict response malformed: {e}")))?;

        if body.predictions.len() != queries.len() {
            return Err(Error::classification(format!(
                "prediction count mismatch: {} queries, {} predictions",
                queries.len(),
                body.predictions.len()
            )));
        }

        body.predictions.iter().map(top_class).collect()
    }
}

/// Highest-scoring class; first occurrence wins ties. Any malformed
/// prediction fails the whole batch.
fn top_class(prediction: &Prediction) -> Result<String> {
    if prediction.classes.is_empty() || prediction.classes.len() != prediction.scores.len() {
        return Err(Error::classification(format!(
            "malformed prediction: {} classes, {} scores",
            prediction.classes.len(),
            prediction.scores.len()
        )));
    }

    let mut best = 0;
    for (index, score) in prediction.scores.iter().enumerate() {
        if !score.is_finite() {
            return Err(Error::classification(format!(
                "non-finite score at index {index}"
            )));
        }
        if *score > prediction.scores[best] {
            best = index;
        }
    }

    Ok(prediction.classes[best].clone())
}

#[async_trait]
impl QueryClassifier for RemoteBatchClassifier {
    async fn classify_batch(&self, queries: &[String]) -> Vec<String> {
        if queries.is_empty() {
            return Vec::new();
        }

        match self.try_classify(queries).await {
            Ok(labels) => labels,
            Err(err) => {
                warn!(batch = queries.len(), error = %err, "classification failed, defaulting whole batch");
                metrics::counter!("wattprint_classifier_fallback_total").increment(1);
                vec![FALLBACK_CATEGORY.to_string(); queries.len()]
            }
        }
    }
}
