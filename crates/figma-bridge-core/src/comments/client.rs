//! HTTP client for the Figma REST comments endpoints.

use super::model::{CommentTarget, CommentsPage, PostCommentBody, PostedComment, RawComment};
use crate::config::CommentsConfig;
use crate::{BridgeError, Result};
use reqwest::{header, Client, Response, StatusCode};
use tracing::debug;

/// Authenticated Figma REST client.
pub struct FigmaApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl FigmaApiClient {
    /// Create a client for `https://api.figma.com` with a personal access token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, CommentsConfig::API_BASE)
    }

    /// Create a client against another base URL (local fakes, proxies).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(CommentsConfig::REQUEST_TIMEOUT)
            .user_agent(concat!("figma-mcp-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::Network {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// List every comment on a file, replies included, message bodies as markdown.
    pub async fn list_comments(&self, file_key: &str) -> Result<Vec<RawComment>> {
        let url = format!(
            "{}/v1/files/{}/comments?as_md=true",
            self.base_url,
            urlencoding::encode(file_key)
        );
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(CommentsConfig::TOKEN_HEADER, &self.token)
            .send()
            .await?;
        let page: CommentsPage = check_response_status(response).await?.json().await?;
        Ok(page.comments)
    }

    /// Post a new pinned comment or a reply.
    pub async fn post_comment(
        &self,
        file_key: &str,
        message: &str,
        target: &CommentTarget,
    ) -> Result<PostedComment> {
        let url = format!(
            "{}/v1/files/{}/comments",
            self.base_url,
            urlencoding::encode(file_key)
        );
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(CommentsConfig::TOKEN_HEADER, &self.token)
            .json(&PostCommentBody::new(message, target))
            .send()
            .await?;
        Ok(check_response_status(response).await?.json().await?)
    }
}

async fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        return Err(BridgeError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if status == StatusCode::FORBIDDEN {
        return Err(BridgeError::AuthFailed);
    }

    let text = response.text().await.unwrap_or_default();
    Err(BridgeError::Api {
        status: status.as_u16(),
        message: text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn token_ok(headers: &HeaderMap) -> bool {
        headers.get("x-figma-token").and_then(|v| v.to_str().ok()) == Some("figd_test")
    }

    #[tokio::test]
    async fn test_list_comments_sends_token() {
        let app = Router::new().route(
            "/v1/files/:key/comments",
            get(|headers: HeaderMap| async move {
                if !token_ok(&headers) {
                    return (AxumStatus::FORBIDDEN, Json(json!({})));
                }
                (
                    AxumStatus::OK,
                    Json(json!({"comments": [{"id": "1", "message": "hi"}]})),
                )
            }),
        );
        let base = serve(app).await;

        let client = FigmaApiClient::with_base_url("figd_test", base.clone()).unwrap();
        let comments = client.list_comments("KEY").await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].message, "hi");

        let bad = FigmaApiClient::with_base_url("wrong", base).unwrap();
        assert_eq!(bad.list_comments("KEY").await.unwrap_err().code(), "AUTH_FAILED");
    }

    #[tokio::test]
    async fn test_post_comment_body() {
        let app = Router::new().route(
            "/v1/files/:key/comments",
            axum::routing::post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "id": "c1",
                    "message": body["message"],
                    "created_at": "2024-01-01T00:00:00Z",
                    "echo": body
                }))
            }),
        );
        let base = serve(app).await;

        let client = FigmaApiClient::with_base_url("figd_test", base).unwrap();
        let posted = client
            .post_comment("KEY", "Looks good", &CommentTarget::Reply("7".into()))
            .await
            .unwrap();
        assert_eq!(posted.id, "c1");
        assert_eq!(posted.message, "Looks good");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let app = Router::new()
            .route(
                "/v1/files/limited/comments",
                get(|| async {
                    (
                        AxumStatus::TOO_MANY_REQUESTS,
                        [("retry-after", "12")],
                        "slow down",
                    )
                }),
            )
            .route(
                "/v1/files/missing/comments",
                get(|| async { (AxumStatus::NOT_FOUND, "no such file") }),
            );
        let base = serve(app).await;
        let client = FigmaApiClient::with_base_url("figd_test", base).unwrap();

        match client.list_comments("limited").await.unwrap_err() {
            BridgeError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, Some(12)),
            other => panic!("unexpected {:?}", other),
        }

        let err = client.list_comments("missing").await.unwrap_err();
        assert_eq!(err.code(), "API_ERROR");
        assert_eq!(err.to_string(), "Figma API error (404): no such file");
    }
}
