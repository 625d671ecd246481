//! Boundary to the Roamly content API.
//!
//! [`RemoteApi`] is the seam every coordinator talks through; [`HttpApi`] is
//! the production implementation over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use roamly_shared::{
    AccountCreated, AdventureId, AdventureSummary, ImageId, MatchRecord, MediaPayload,
    PersistedImage, UploadItem, UploadOutcome,
};

use crate::error::ApiError;

/// Fields of the account creation form.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// A new adventure together with its initial images.
#[derive(Debug, Clone)]
pub struct NewAdventure {
    pub title: String,
    pub description: String,
    pub images: Vec<UploadItem>,
}

/// Operations the coordination core needs from the content API.
///
/// Every mutation returns what the server considers the resulting state;
/// callers adopt it instead of predicting it.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn search_users(&self, query: &str, limit: usize)
        -> Result<Vec<MatchRecord>, ApiError>;

    /// Exchange credentials for a bearer token.
    async fn login(&self, identifier: &str, password: &str) -> Result<String, ApiError>;

    async fn create_account(&self, account: &NewAccount) -> Result<AccountCreated, ApiError>;

    async fn list_media(&self, adventure_id: &AdventureId)
        -> Result<Vec<PersistedImage>, ApiError>;

    async fn upload_media(
        &self,
        token: &str,
        adventure_id: &AdventureId,
        item: &UploadItem,
    ) -> Result<UploadOutcome, ApiError>;

    async fn delete_media(&self, token: &str, image_id: &ImageId)
        -> Result<Vec<PersistedImage>, ApiError>;

    async fn relabel_media(
        &self,
        token: &str,
        image_id: &ImageId,
        caption: &str,
    ) -> Result<Vec<PersistedImage>, ApiError>;

    async fn create_adventure(
        &self,
        token: &str,
        adventure: &NewAdventure,
    ) -> Result<AdventureSummary, ApiError>;

    /// Remove an adventure and every image attached to it.
    async fn delete_adventure(&self, token: &str, adventure_id: &AdventureId)
        -> Result<(), ApiError>;
}

/// `reqwest`-backed [`RemoteApi`].
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Serialize)]
struct CaptionChange<'a> {
    caption: &'a str,
}

impl HttpApi {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        decode_response(response).await
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn search_users(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MatchRecord>, ApiError> {
        let limit = limit.to_string();
        self.send(
            self.client
                .get(self.url("/users"))
                .query(&[("query", query), ("limit", limit.as_str())]),
        )
        .await
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<String, ApiError> {
        let body: LoginResponse = self
            .send(
                self.client
                    .post(self.url("/user/login"))
                    .form(&[("username", identifier), ("password", password)]),
            )
            .await?;
        Ok(body.access_token)
    }

    async fn create_account(&self, account: &NewAccount) -> Result<AccountCreated, ApiError> {
        self.send(self.client.post(self.url("/user/")).json(account))
            .await
    }

    async fn list_media(
        &self,
        adventure_id: &AdventureId,
    ) -> Result<Vec<PersistedImage>, ApiError> {
        self.send(
            self.client
                .get(self.url("/media"))
                .query(&[("adventure_id", adventure_id.as_str())]),
        )
        .await
    }

    async fn upload_media(
        &self,
        token: &str,
        adventure_id: &AdventureId,
        item: &UploadItem,
    ) -> Result<UploadOutcome, ApiError> {
        let form = Form::new()
            .text("adventure_id", adventure_id.to_string())
            .text("caption", item.caption.clone())
            .part("image", payload_part(&item.payload)?);

        debug!(
            adventure_id = %adventure_id,
            file_name = %item.payload.file_name,
            size = item.payload.len(),
            "Uploading image"
        );

        self.send(
            self.client
                .post(self.url("/media"))
                .bearer_auth(token)
                .multipart(form),
        )
        .await
    }

    async fn delete_media(
        &self,
        token: &str,
        image_id: &ImageId,
    ) -> Result<Vec<PersistedImage>, ApiError> {
        self.send(
            self.client
                .delete(self.url(&format!("/media/{image_id}")))
                .bearer_auth(token),
        )
        .await
    }

    async fn relabel_media(
        &self,
        token: &str,
        image_id: &ImageId,
        caption: &str,
    ) -> Result<Vec<PersistedImage>, ApiError> {
        self.send(
            self.client
                .put(self.url(&format!("/media/{image_id}")))
                .bearer_auth(token)
                .json(&CaptionChange { caption }),
        )
        .await
    }

    async fn create_adventure(
        &self,
        token: &str,
        adventure: &NewAdventure,
    ) -> Result<AdventureSummary, ApiError> {
        let mut form = Form::new()
            .text("title", adventure.title.clone())
            .text("description", adventure.description.clone());
        for item in &adventure.images {
            form = form
                .part("images", payload_part(&item.payload)?)
                .text("caption", item.caption.clone());
        }

        self.send(
            self.client
                .post(self.url("/adventure/"))
                .bearer_auth(token)
                .multipart(form),
        )
        .await
    }

    async fn delete_adventure(
        &self,
        token: &str,
        adventure_id: &AdventureId,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/adventure/{adventure_id}")))
            .bearer_auth(token)
            .send()
            .await?;
        check_status(response).await.map(drop)
    }
}

fn payload_part(payload: &MediaPayload) -> Result<Part, ApiError> {
    let part = Part::bytes(payload.bytes.to_vec()).file_name(payload.file_name.clone());
    match &payload.content_type {
        Some(mime) => Ok(part.mime_str(mime)?),
        None => Ok(part),
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        detail: error_detail(&body, status),
    })
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Extract the `detail` field of an error body, falling back to the status
/// reason.
///
/// Validation failures carry a list of `{loc, msg, type}` entries; those are
/// rendered as one bullet line per `msg`.
fn error_detail(body: &str, status: StatusCode) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Value::String(detail),
        }) => detail,
        Ok(ErrorBody {
            detail: Value::Array(entries),
        }) => entries
            .iter()
            .map(|entry| match entry.get("msg") {
                Some(Value::String(msg)) => format!("• {msg}"),
                Some(other) => format!("• {other}"),
                None => format!("• {entry}"),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use roamly_shared::UserId;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> HttpApi {
        HttpApi::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    fn upload_item(caption: &str) -> UploadItem {
        UploadItem {
            slot_index: 0,
            payload: MediaPayload::new("harbour.jpg", b"jpeg-bytes".to_vec())
                .with_content_type("image/jpeg"),
            caption: caption.to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_sends_query_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("query", "mar"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"user_id": 1, "username": "marco"},
                {"user_id": 2, "username": "maria"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let matches = api_for(&server).search_users("mar", 5).await.unwrap();
        assert_eq!(
            matches,
            vec![
                MatchRecord {
                    identifier: UserId::new("1"),
                    display_name: "marco".into()
                },
                MatchRecord {
                    identifier: UserId::new("2"),
                    display_name: "maria".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_login_posts_form_and_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/login"))
            .and(body_string_contains("username=marco"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "a.b.c", "token_type": "bearer"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token = api_for(&server).login("marco", "hunter22").await.unwrap();
        assert_eq!(token, "a.b.c");
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/media/9"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"detail": "image with id=9 could not be found"})),
            )
            .mount(&server)
            .await;

        let err = api_for(&server)
            .delete_media("tok", &ImageId::new("9"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "image with id=9 could not be found");
    }

    #[tokio::test]
    async fn test_validation_errors_become_bullet_lines() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": [
                {"loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error"},
                {"loc": ["body", "password"], "msg": "field required", "type": "missing"}
            ]})))
            .expect(1)
            .mount(&server)
            .await;

        let err = api_for(&server)
            .create_account(&NewAccount {
                email: "not-an-email".into(),
                username: "ana".into(),
                password: "trails2024".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(
            err.user_message(),
            "• value is not a valid email address\n• field required"
        );
    }

    #[tokio::test]
    async fn test_delete_adventure_accepts_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/adventure/4"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        api_for(&server)
            .delete_adventure("tok", &AdventureId::new("4"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_adventure_forbidden_surfaces_detail() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/adventure/4"))
            .respond_with(ResponseTemplate::new(403).set_body_json(
                json!({"detail": "You do not have permission to perform this action"}),
            ))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .delete_adventure("tok", &AdventureId::new("4"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(
            err.user_message(),
            "You do not have permission to perform this action"
        );
    }

    #[tokio::test]
    async fn test_error_without_detail_uses_status_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = api_for(&server).search_users("ab", 5).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.user_message(), "Internal Server Error");
    }

    #[tokio::test]
    async fn test_relabel_sends_caption_json() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/media/3"))
            .and(header("authorization", "Bearer tok"))
            .and(body_string_contains(r#""caption":"sunset""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"image_id": 3, "url": "http://cdn/3", "caption": "sunset"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = api_for(&server)
            .relabel_media("tok", &ImageId::new("3"), "sunset")
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].caption, "sunset");
    }

    #[tokio::test]
    async fn test_upload_is_multipart_with_caption() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/media"))
            .and(header("authorization", "Bearer tok"))
            .and(body_string_contains("harbour at dusk"))
            .and(body_string_contains("jpeg-bytes"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!(
                {"image_id": 12, "url": "http://cdn/12", "caption": "harbour at dusk"}
            )))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = api_for(&server)
            .upload_media("tok", &AdventureId::new("4"), &upload_item("harbour at dusk"))
            .await
            .unwrap();
        match outcome {
            UploadOutcome::Created(image) => assert_eq!(image.image_id, ImageId::new("12")),
            other => panic!("expected created resource, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media"))
            .and(query_param("adventure_id", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"oops": true})))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .list_media(&AdventureId::new("4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
