//! HTTP access to the chat backend.
//!
//! Every endpoint reports application failures through an `error` field in the
//! JSON body rather than the status code, so responses are decoded from text and
//! checked for that field before the expected shape is parsed.

use crate::types::{ChatDetail, ChatSummary, SendReply};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The backend answered but flagged the request as failed.
    #[error("{0}")]
    Server(String),

    #[error("network error: {0}")]
    Transport(String),

    #[error("unexpected response {0}: {1}")]
    Status(u16, String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        !matches!(self, ApiError::Server(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Transport(format!("malformed response: {err}"))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The six backend operations the client depends on.
#[async_trait(?Send)]
pub trait ChatBackend {
    async fn list_chats(&self) -> ApiResult<Vec<ChatSummary>>;

    /// `Ok(None)` when the backend has no such conversation.
    async fn fetch_chat(&self, id: &str) -> ApiResult<Option<ChatDetail>>;

    async fn create_chat(&self, title: &str) -> ApiResult<ChatSummary>;

    async fn rename_chat(&self, id: &str, title: &str) -> ApiResult<()>;

    async fn delete_chat(&self, id: &str) -> ApiResult<()>;

    async fn send_message(&self, id: &str, message: &str) -> ApiResult<SendReply>;
}

#[derive(Serialize)]
struct TitleRequest<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct HttpBackend {
    base: Url,
    client: Client,
}

impl HttpBackend {
    pub fn new(api_base: &str) -> ApiResult<Self> {
        let base = Url::parse(api_base)
            .map_err(|err| ApiError::Transport(format!("invalid base URL {api_base}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Transport(format!(
                "base URL {api_base} cannot carry a path"
            )));
        }
        Ok(Self {
            base,
            client: Client::new(),
        })
    }

    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::Transport("base URL cannot carry a path".into()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode(status, &body)
    }
}

fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> ApiResult<T> {
    if let Ok(ErrorBody {
        error: Some(message),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        return Err(ApiError::Server(message));
    }
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16(), body.to_string()));
    }
    Ok(serde_json::from_str(body)?)
}

#[async_trait(?Send)]
impl ChatBackend for HttpBackend {
    async fn list_chats(&self) -> ApiResult<Vec<ChatSummary>> {
        let url = self.url(&["chat_list"])?;
        tracing::debug!(%url, "listing chats");
        self.call(self.client.get(url)).await
    }

    async fn fetch_chat(&self, id: &str) -> ApiResult<Option<ChatDetail>> {
        let url = self.url(&["chat", id])?;
        tracing::debug!(%url, "fetching chat");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.text().await?;
        decode(status, &body).map(Some)
    }

    async fn create_chat(&self, title: &str) -> ApiResult<ChatSummary> {
        let url = self.url(&["chat"])?;
        self.call(self.client.post(url).json(&TitleRequest { title }))
            .await
    }

    async fn rename_chat(&self, id: &str, title: &str) -> ApiResult<()> {
        let url = self.url(&["chat", id, "rename"])?;
        let _: IgnoredAny = self
            .call(self.client.post(url).json(&TitleRequest { title }))
            .await?;
        Ok(())
    }

    async fn delete_chat(&self, id: &str) -> ApiResult<()> {
        let url = self.url(&["chat", id])?;
        let _: IgnoredAny = self.call(self.client.delete(url)).await?;
        Ok(())
    }

    async fn send_message(&self, id: &str, message: &str) -> ApiResult<SendReply> {
        let url = self.url(&["chat", id, "message"])?;
        self.call(self.client.post(url).json(&MessageRequest { message }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_paths_under_base() {
        let backend = HttpBackend::new("http://127.0.0.1:10000").unwrap();
        assert_eq!(
            backend.url(&["chat", "abc", "rename"]).unwrap().as_str(),
            "http://127.0.0.1:10000/chat/abc/rename"
        );

        let nested = HttpBackend::new("http://host/api").unwrap();
        assert_eq!(
            nested.url(&["chat_list"]).unwrap().as_str(),
            "http://host/api/chat_list"
        );
    }

    #[test]
    fn ids_are_percent_encoded() {
        let backend = HttpBackend::new("http://host").unwrap();
        let url = backend.url(&["chat", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://host/chat/a%2Fb%20c");
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(HttpBackend::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn error_field_wins_over_status() {
        let err = decode::<IgnoredAny>(StatusCode::BAD_REQUEST, r#"{"error":"Title empty"}"#)
            .unwrap_err();
        assert_eq!(err, ApiError::Server("Title empty".into()));
        assert!(!err.is_transport());

        let ok_status = decode::<SendReply>(StatusCode::OK, r#"{"error":"x"}"#).unwrap_err();
        assert_eq!(ok_status, ApiError::Server("x".into()));
    }

    #[test]
    fn non_json_failure_is_transport_class() {
        let err = decode::<IgnoredAny>(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>")
            .unwrap_err();
        assert!(matches!(err, ApiError::Status(502, _)));
        assert!(err.is_transport());

        let garbled = decode::<SendReply>(StatusCode::OK, "not json").unwrap_err();
        assert!(garbled.is_transport());
    }

    #[test]
    fn list_body_decodes() {
        let chats: Vec<ChatSummary> = decode(
            StatusCode::OK,
            r#"[{"id":"1","title":"first","updated_at":"2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].title, "first");
    }
}
