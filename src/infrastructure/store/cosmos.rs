//! Azure Cosmos DB (SQL API) record store over the REST interface

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{header, Client, StatusCode};
use sha2::Sha256;
use tracing::{debug, warn};

use crate::domain::{DomainError, LookupKey, Record, RecordStore, StoreError};

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2018-12-31";

/// Configuration for the Cosmos DB store
#[derive(Clone)]
pub struct CosmosConfig {
    /// Account endpoint, e.g. `https://account.documents.azure.com:443/`
    pub endpoint: String,
    /// Base64 master key
    pub key: String,
    pub database: String,
    pub container: String,
    /// Bound on connecting and on the whole request
    pub timeout: Duration,
}

impl fmt::Debug for CosmosConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosmosConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .field("database", &self.database)
            .field("container", &self.container)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CosmosConfig {
    pub fn new(
        endpoint: impl Into<String>,
        key: impl Into<String>,
        database: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            database: database.into(),
            container: container.into(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Point reads against a single Cosmos DB container.
///
/// Each read is `GET dbs/{db}/colls/{coll}/docs/{key}` with the key repeated
/// as the partition key, signed with the account master key. The HTTP client
/// keeps its own connection pool; response bodies are always consumed or
/// dropped before returning so connections go back to it.
pub struct CosmosRecordStore {
    client: Client,
    config: CosmosConfig,
    master_key: Vec<u8>,
}

impl fmt::Debug for CosmosRecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosmosRecordStore")
            .field("config", &self.config)
            .finish()
    }
}

impl CosmosRecordStore {
    pub fn new(config: CosmosConfig) -> Result<Self, DomainError> {
        let master_key = STANDARD.decode(config.key.trim()).map_err(|e| {
            DomainError::configuration(format!("Cosmos DB key is not valid base64: {}", e))
        })?;

        let client = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build Cosmos DB client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            master_key,
        })
    }

    fn collection_link(&self) -> String {
        format!(
            "dbs/{}/colls/{}",
            self.config.database, self.config.container
        )
    }

    fn url_for(&self, segments: &[&str]) -> String {
        let path = segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// Master-key authorization header value for one request
    fn auth_token(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> Result<String, StoreError> {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = HmacSha256::new_from_slice(&self.master_key)
            .map_err(|e| StoreError::unavailable(format!("Invalid signing key: {}", e)))?;
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Ok(urlencoding::encode(&format!("type=master&ver=1.0&sig={}", signature)).into_owned())
    }

    fn signed_get(
        &self,
        url: &str,
        resource_type: &str,
        resource_link: &str,
    ) -> Result<reqwest::RequestBuilder, StoreError> {
        let date = http_date(Utc::now());
        let token = self.auth_token("GET", resource_type, resource_link, &date)?;

        Ok(self
            .client
            .get(url)
            .header(header::AUTHORIZATION, token)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header(header::ACCEPT, "application/json"))
    }
}

/// RFC 1123 date as required by the `x-ms-date` header
fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> StoreError {
    if err.is_timeout() {
        StoreError::timeout(timeout)
    } else {
        StoreError::unavailable(format!("Cosmos DB request failed: {}", err))
    }
}

async fn unexpected_status(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();

    StoreError::unavailable(format!("Cosmos DB returned {}: {}", status, snippet))
}

#[async_trait]
impl RecordStore for CosmosRecordStore {
    async fn read_by_key(&self, key: &LookupKey) -> Result<Record, StoreError> {
        let resource_link = format!("{}/docs/{}", self.collection_link(), key);
        let url = self.url_for(&[
            "dbs",
            &self.config.database,
            "colls",
            &self.config.container,
            "docs",
            key.as_str(),
        ]);
        let partition_key = serde_json::to_string(&[key.as_str()])
            .map_err(|e| StoreError::unavailable(format!("Invalid partition key: {}", e)))?;

        let response = self
            .signed_get(&url, "docs", &resource_link)?
            .header("x-ms-documentdb-partitionkey", partition_key)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout))?;

        match response.status() {
            StatusCode::OK => {
                debug!(key = %key, "Cosmos DB document read");
                response.json::<Record>().await.map_err(|e| {
                    StoreError::unavailable(format!("Invalid Cosmos DB document: {}", e))
                })
            }
            StatusCode::NOT_FOUND => Err(StoreError::not_found(key.as_str())),
            _ => {
                let err = unexpected_status(response).await;
                warn!(key = %key, error = %err, "Cosmos DB read failed");
                Err(err)
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let resource_link = self.collection_link();
        let url = self.url_for(&[
            "dbs",
            &self.config.database,
            "colls",
            &self.config.container,
        ]);

        let response = self
            .signed_get(&url, "colls", &resource_link)?
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(unexpected_status(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // base64("test-master-key")
    const TEST_KEY: &str = "dGVzdC1tYXN0ZXIta2V5";

    fn store_for(server: &MockServer) -> CosmosRecordStore {
        CosmosRecordStore::new(
            CosmosConfig::new(server.uri(), TEST_KEY, "VolcanoData", "Details")
                .with_timeout(Duration::from_millis(500)),
        )
        .unwrap()
    }

    fn key(raw: &str) -> LookupKey {
        LookupKey::new(raw).unwrap()
    }

    #[test]
    fn test_http_date_format() {
        let date = Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap();
        assert_eq!(http_date(date), "Tue, 01 Oct 2024 12:00:00 GMT");
    }

    #[test]
    fn test_auth_token_signature() {
        let store = CosmosRecordStore::new(CosmosConfig::new(
            "https://localhost:8081",
            TEST_KEY,
            "VolcanoData",
            "Details",
        ))
        .unwrap();

        let token = store
            .auth_token(
                "GET",
                "docs",
                "dbs/VolcanoData/colls/Details/docs/volcano-42",
                "Tue, 01 Oct 2024 12:00:00 GMT",
            )
            .unwrap();

        assert_eq!(
            token,
            "type%3Dmaster%26ver%3D1.0%26sig%3Drhb64OGNmxXjVvESHFDN%2FUGKSR6tY4RnrdxgncBScDk%3D"
        );
    }

    #[test]
    fn test_invalid_key_rejected() {
        let result = CosmosRecordStore::new(CosmosConfig::new(
            "https://localhost:8081",
            "not base64!",
            "db",
            "coll",
        ));

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_debug_hides_key() {
        let config = CosmosConfig::new("https://localhost:8081", TEST_KEY, "db", "coll");
        assert!(!format!("{:?}", config).contains(TEST_KEY));
    }

    #[tokio::test]
    async fn test_read_existing_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dbs/VolcanoData/colls/Details/docs/volcano-42"))
            .and(header("x-ms-documentdb-partitionkey", "[\"volcano-42\"]"))
            .and(header("x-ms-version", API_VERSION))
            .and(header_exists("authorization"))
            .and(header_exists("x-ms-date"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "volcano-42",
                "name": "Mt. Example",
                "elevation": 123
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = store_for(&server)
            .read_by_key(&key("volcano-42"))
            .await
            .unwrap();

        assert_eq!(record["name"], "Mt. Example");
        assert_eq!(record["elevation"], 123);
    }

    #[tokio::test]
    async fn test_read_missing_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "NotFound",
                "message": "Entity with the specified id does not exist in the system."
            })))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .read_by_key(&key("missing-999"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unauthorized_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad signature"))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .read_by_key(&key("volcano-42"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .read_by_key(&key("volcano-42"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_malformed_document_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .read_by_key(&key("volcano-42"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_key_is_url_encoded_in_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dbs/VolcanoData/colls/Details/docs/a%20b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a b"})))
            .expect(1)
            .mount(&server)
            .await;

        let record = store_for(&server).read_by_key(&key("a b")).await.unwrap();
        assert_eq!(record["id"], "a b");
    }

    #[tokio::test]
    async fn test_ping_reads_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dbs/VolcanoData/colls/Details"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "Details"})))
            .expect(1)
            .mount(&server)
            .await;

        assert!(store_for(&server).ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let store = CosmosRecordStore::new(
            CosmosConfig::new("http://127.0.0.1:1", TEST_KEY, "db", "coll")
                .with_timeout(Duration::from_millis(200)),
        )
        .unwrap();

        let err = store.read_by_key(&key("volcano-42")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }
}
