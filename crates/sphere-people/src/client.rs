//! HTTP client for `GET {base}/people/me/connections`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use sphere_core::config::DirectoryConfig;
use sphere_core::{DirectoryClient, DirectoryError, DirectoryPage, PageRequest, RawPerson};

/// Marker the People API puts in the error body when a sync token is stale.
const EXPIRED_SYNC_TOKEN: &str = "EXPIRED_SYNC_TOKEN";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionsResponse {
    #[serde(default)]
    connections: Vec<serde_json::Value>,
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    next_sync_token: Option<String>,
}

/// Bearer-token People API client.
#[derive(Clone)]
pub struct PeopleClient {
    base_url: String,
    access_token: String,
    page_size: u32,
    person_fields: String,
    client: reqwest::Client,
}

impl PeopleClient {
    pub fn new(config: &DirectoryConfig, access_token: &str) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DirectoryError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            page_size: config.page_size,
            person_fields: config.person_fields.clone(),
            client,
        })
    }

    /// Build a client when the config carries an access token.
    pub fn from_config(config: &DirectoryConfig) -> Result<Option<Self>, DirectoryError> {
        config
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|token| Self::new(config, token))
            .transpose()
    }

    fn query_params(&self, request: &PageRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("personFields", self.person_fields.clone()),
            ("pageSize", self.page_size.to_string()),
            ("requestSyncToken", "true".to_string()),
        ];
        if let Some(token) = request.page_token.as_deref().filter(|t| !t.is_empty()) {
            params.push(("pageToken", token.to_string()));
        }
        if let Some(token) = request.sync_token.as_deref().filter(|t| !t.is_empty()) {
            params.push(("syncToken", token.to_string()));
        }
        params
    }
}

#[async_trait]
impl DirectoryClient for PeopleClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<DirectoryPage, DirectoryError> {
        let response = self
            .client
            .get(format!("{}/people/me/connections", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&self.query_params(request))
            .send()
            .await
            .map_err(|e| DirectoryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DirectoryError::Request(e.to_string()))?;
        let page = parse_page(&body)?;
        debug!(
            records = page.records.len(),
            has_next = !page.is_last(),
            "Fetched People API page"
        );
        Ok(page)
    }
}

fn classify_failure(status: StatusCode, body: String) -> DirectoryError {
    if status == StatusCode::UNAUTHORIZED {
        DirectoryError::Unauthorized
    } else if status == StatusCode::GONE || body.contains(EXPIRED_SYNC_TOKEN) {
        DirectoryError::SyncTokenExpired
    } else {
        DirectoryError::Status { status: status.as_u16(), body }
    }
}

/// Decode one connections response.
///
/// A record that does not fit the person schema is skipped with a
/// warning rather than failing the whole page.
fn parse_page(body: &str) -> Result<DirectoryPage, DirectoryError> {
    let response: ConnectionsResponse =
        serde_json::from_str(body).map_err(|e| DirectoryError::Decode(e.to_string()))?;

    let mut records = Vec::with_capacity(response.connections.len());
    let mut undecodable = 0;
    for value in response.connections {
        match RawPerson::from_json(value) {
            Ok(person) => records.push(person),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable directory record");
                undecodable += 1;
            }
        }
    }

    Ok(DirectoryPage {
        records,
        next_page_token: response.next_page_token,
        next_sync_token: response.next_sync_token,
        undecodable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_FIXTURE: &str = r#"{
        "connections": [
            {
                "resourceName": "people/c100",
                "etag": "%EgUBAi43PRoEAQIFByIMR0xTUmZ",
                "names": [{ "displayName": "Alice Martin", "givenName": "Alice" }],
                "emailAddresses": [{ "value": "alice@acme.io" }],
                "organizations": [{ "name": "Acme", "title": "CTO", "current": true }],
                "addresses": [{ "city": "Paris", "country": "France", "countryCode": "FR" }],
                "birthdays": [{ "date": { "month": 3, "day": 15 } }]
            },
            {
                "resourceName": "people/c101",
                "names": "not-a-list"
            }
        ],
        "nextPageToken": "page-2",
        "totalPeople": 2
    }"#;

    #[test]
    fn test_parse_page_fixture() {
        let page = parse_page(PAGE_FIXTURE).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.undecodable, 1);
        assert_eq!(page.next_page_token.as_deref(), Some("page-2"));
        assert!(page.next_sync_token.is_none());
        assert!(!page.is_last());

        let alice = &page.records[0];
        assert_eq!(alice.contact_id().as_deref(), Some("c100"));
        assert_eq!(alice.payload["etag"], "%EgUBAi43PRoEAQIFByIMR0xTUmZ");

        let contact = sphere_core::normalize(alice).unwrap();
        assert_eq!(contact.country.as_deref(), Some("FR"));
        assert_eq!(contact.birthday.as_deref(), Some("03-15"));
    }

    #[test]
    fn test_parse_last_page_with_tombstone() {
        let body = r#"{
            "connections": [{ "resourceName": "people/c7", "metadata": { "deleted": true } }],
            "nextSyncToken": "sync-abc"
        }"#;
        let page = parse_page(body).unwrap();
        assert!(page.is_last());
        assert_eq!(page.next_sync_token.as_deref(), Some("sync-abc"));
        assert!(page.records[0].is_deleted());
    }

    #[test]
    fn test_parse_empty_response() {
        let page = parse_page("{}").unwrap();
        assert!(page.records.is_empty());
        assert!(page.is_last());
        assert!(matches!(parse_page("<html>"), Err(DirectoryError::Decode(_))));
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure(StatusCode::UNAUTHORIZED, String::new()),
            DirectoryError::Unauthorized
        ));
        assert!(matches!(
            classify_failure(StatusCode::GONE, String::new()),
            DirectoryError::SyncTokenExpired
        ));
        let expired = r#"{"error":{"code":400,"details":[{"reason":"EXPIRED_SYNC_TOKEN"}]}}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, expired.to_string()),
            DirectoryError::SyncTokenExpired
        ));
        assert!(matches!(
            classify_failure(StatusCode::SERVICE_UNAVAILABLE, "down".into()),
            DirectoryError::Status { status: 503, .. }
        ));
    }

    #[test]
    fn test_query_params() {
        let config = DirectoryConfig { page_size: 50, ..DirectoryConfig::default() };
        let client = PeopleClient::new(&config, "token").unwrap();

        let first = client.query_params(&PageRequest::full());
        assert!(first.iter().any(|(k, v)| *k == "pageSize" && v == "50"));
        assert!(!first.iter().any(|(k, _)| *k == "pageToken" || *k == "syncToken"));

        let next = client.query_params(&PageRequest {
            page_token: Some("p2".into()),
            sync_token: Some("s1".into()),
        });
        assert!(next.iter().any(|(k, v)| *k == "pageToken" && v == "p2"));
        assert!(next.iter().any(|(k, v)| *k == "syncToken" && v == "s1"));
    }

    #[test]
    fn test_from_config_requires_token() {
        assert!(PeopleClient::from_config(&DirectoryConfig::default()).unwrap().is_none());
        let config = DirectoryConfig { access_token: Some("  ".into()), ..DirectoryConfig::default() };
        assert!(PeopleClient::from_config(&config).unwrap().is_none());
        let config = DirectoryConfig { access_token: Some("ya29.x".into()), ..DirectoryConfig::default() };
        let client = PeopleClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.access_token, "ya29.x");
    }
}
