use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::auth::AuthSession;
use crate::models::test::Test;

/// Collections on the school API that are proxied without extra rules
/// beyond the ones their routes apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Questions,
    Users,
    Classes,
    Results,
    Sessions,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Questions => "questions",
            Resource::Users => "users",
            Resource::Classes => "classes",
            Resource::Results => "results",
            Resource::Sessions => "sessions",
        }
    }
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "questions" => Ok(Resource::Questions),
            "users" => Ok(Resource::Users),
            "classes" => Ok(Resource::Classes),
            "results" => Ok(Resource::Results),
            "sessions" => Ok(Resource::Sessions),
            other => Err(Error::NotFound(format!("Unknown resource: {}", other))),
        }
    }
}

// List endpoints answer with either a bare array or an object wrapping it.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "data", alias = "tests", alias = "results")]
        items: Vec<T>,
    },
}

impl<T> ListEnvelope<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) | ListEnvelope::Wrapped { items } => items,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TestEnvelope {
    Bare(Box<Test>),
    Wrapped {
        #[serde(alias = "data")]
        test: Box<Test>,
    },
}

#[derive(Debug, Serialize)]
pub struct StatusUpdate {
    pub status: crate::models::test::TestStatus,
}

#[derive(Clone)]
pub struct UpstreamService {
    client: Client,
    base_url: Url,
}

impl UpstreamService {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Upstream URL {} cannot be a base", base_url)));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<B, T>(
        &self,
        session: &AuthSession,
        method: Method,
        segments: &[&str],
        query: Option<&[(String, String)]>,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        let request_id = Uuid::new_v4();
        tracing::debug!(
            %request_id,
            %method,
            path = url.path(),
            user = %session.user_id,
            "Calling school API"
        );

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(&session.token)
            .header("x-request-id", request_id.to_string());
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(
                %request_id,
                %method,
                path = url.path(),
                error = %e,
                "School API unreachable"
            );
            Error::Reqwest(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(status, &bytes);
            tracing::warn!(
                %request_id,
                %method,
                path = url.path(),
                status = status.as_u16(),
                "School API rejected request: {}",
                message
            );
            return Err(Error::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: &[u8] = if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|e| {
            tracing::error!(
                %request_id,
                path = url.path(),
                error = %e,
                "Unexpected response shape from school API"
            );
            Error::Upstream {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                message: format!("invalid response body: {}", e),
            }
        })
    }

    /// Decodes each test on its own; records that cannot be read are logged
    /// and skipped so they never hide the rest of the list.
    pub async fn list_tests(&self, session: &AuthSession) -> Result<Vec<Test>> {
        let envelope: ListEnvelope<JsonValue> = self
            .send::<(), _>(session, Method::GET, &["tests"], None, None)
            .await?;
        Ok(decode_tests(envelope.into_vec()))
    }

    pub async fn list_tests_raw(
        &self,
        session: &AuthSession,
        query: &[(String, String)],
    ) -> Result<JsonValue> {
        self.send::<(), _>(session, Method::GET, &["tests"], Some(query), None)
            .await
    }

    pub async fn get_test(&self, session: &AuthSession, id: &str) -> Result<Test> {
        let envelope: TestEnvelope = self
            .send::<(), _>(session, Method::GET, &["tests", id], None, None)
            .await?;
        Ok(match envelope {
            TestEnvelope::Bare(test) | TestEnvelope::Wrapped { test } => *test,
        })
    }

    pub async fn update_test<B: Serialize + ?Sized>(
        &self,
        session: &AuthSession,
        id: &str,
        body: &B,
    ) -> Result<JsonValue> {
        self.send(session, Method::PUT, &["tests", id], None, Some(body))
            .await
    }

    pub async fn schedule_test<B: Serialize + ?Sized>(
        &self,
        session: &AuthSession,
        id: &str,
        body: &B,
    ) -> Result<JsonValue> {
        self.send(session, Method::PUT, &["tests", id, "schedule"], None, Some(body))
            .await
    }

    pub async fn submit_test<B: Serialize + ?Sized>(
        &self,
        session: &AuthSession,
        id: &str,
        body: &B,
    ) -> Result<JsonValue> {
        self.send(session, Method::POST, &["tests", id, "submit"], None, Some(body))
            .await
    }

    pub async fn delete_test(&self, session: &AuthSession, id: &str) -> Result<JsonValue> {
        self.send::<(), _>(session, Method::DELETE, &["tests", id], None, None)
            .await
    }

    pub async fn list(
        &self,
        session: &AuthSession,
        resource: Resource,
        query: &[(String, String)],
    ) -> Result<JsonValue> {
        self.send::<(), _>(session, Method::GET, &[resource.path()], Some(query), None)
            .await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        session: &AuthSession,
        resource: Resource,
        id: &str,
    ) -> Result<T> {
        self.send::<(), _>(session, Method::GET, &[resource.path(), id], None, None)
            .await
    }

    pub async fn create<B: Serialize + ?Sized>(
        &self,
        session: &AuthSession,
        resource: Resource,
        body: &B,
    ) -> Result<JsonValue> {
        self.send(session, Method::POST, &[resource.path()], None, Some(body))
            .await
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        session: &AuthSession,
        resource: Resource,
        id: &str,
        body: &B,
    ) -> Result<JsonValue> {
        self.send(session, Method::PUT, &[resource.path(), id], None, Some(body))
            .await
    }

    pub async fn delete(
        &self,
        session: &AuthSession,
        resource: Resource,
        id: &str,
    ) -> Result<JsonValue> {
        self.send::<(), _>(session, Method::DELETE, &[resource.path(), id], None, None)
            .await
    }
}

fn decode_tests(raw: Vec<JsonValue>) -> Vec<Test> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let id = item
                .get("_id")
                .or_else(|| item.get("id"))
                .map(|v| v.to_string())
                .unwrap_or_default();
            match serde_json::from_value::<Test>(item) {
                Ok(test) => Some(test),
                Err(e) => {
                    tracing::warn!(
                        index = idx,
                        id = %id,
                        error = %e,
                        "Skipping unreadable test record"
                    );
                    None
                }
            }
        })
        .collect()
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<JsonValue>(body) {
        for key in ["message", "error", "msg"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base: &str) -> UpstreamService {
        UpstreamService::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoints_append_escaped_segments() {
        let svc = service("http://school.test/api/");
        assert_eq!(
            svc.endpoint(&["tests", "t1", "schedule"]).as_str(),
            "http://school.test/api/tests/t1/schedule"
        );

        let svc = service("http://school.test/api");
        assert_eq!(svc.endpoint(&["tests", "a/b"]).as_str(), "http://school.test/api/tests/a%2Fb");
    }

    #[test]
    fn list_envelopes_unwrap() {
        let bare: ListEnvelope<JsonValue> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(bare.into_vec().len(), 2);
        let wrapped: ListEnvelope<JsonValue> =
            serde_json::from_str(r#"{"tests": [1], "total": 1}"#).unwrap();
        assert_eq!(wrapped.into_vec().len(), 1);
    }

    #[test]
    fn unreadable_tests_are_skipped() {
        let raw = vec![
            serde_json::json!({ "_id": "t1", "title": "ok" }),
            serde_json::json!({ "title": "no id" }),
            serde_json::json!({ "_id": "t3", "questions": "broken" }),
            serde_json::json!("not an object"),
            serde_json::json!({
                "_id": "t5",
                "id": "t5",
                "duration": "60",
                "createdBy": { "_id": "x" }
            }),
        ];
        let ids: Vec<String> = decode_tests(raw).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t1", "t5"]);
    }

    #[test]
    fn error_messages_prefer_json_fields() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, br#"{"message":"bad batch"}"#),
            "bad batch"
        );
        assert_eq!(error_message(StatusCode::NOT_FOUND, b""), "Not Found");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, b"oops"), "oops");
    }

    #[test]
    fn unknown_resources_are_not_found() {
        assert_eq!("classes".parse::<Resource>().unwrap(), Resource::Classes);
        assert!(matches!("tests".parse::<Resource>(), Err(Error::NotFound(_))));
    }
}
