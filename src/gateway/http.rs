use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::Gateway;
use crate::config::Config;
use crate::errors::GatewayError;
use crate::models::{Fix, Issue, IssueFilter, Repository, RepositoryList, SubmitFixRequest, User};

const USER_AGENT: &str = concat!("automerge-ai/", env!("CARGO_PKG_VERSION"));

/// `reqwest`-backed gateway against the AutoMerge AI API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(GatewayError::Network)?;
        Ok(Self::with_client(client, config.api_base_url()))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "gateway request");
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
        entity: Option<String>,
    ) -> Result<T, GatewayError> {
        let resp = send(request, entity).await?;
        resp.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                GatewayError::Decode {
                    path: path.to_string(),
                    source: e,
                }
            } else {
                GatewayError::Network(e)
            }
        })
    }
}

/// Send a request and turn any non-success status into a `GatewayError`.
///
/// A 404 becomes `NotFound` when the request targets a single entity.
async fn send(request: RequestBuilder, entity: Option<String>) -> Result<Response, GatewayError> {
    let resp = request.send().await.map_err(GatewayError::Network)?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == StatusCode::NOT_FOUND
        && let Some(entity) = entity
    {
        return Err(GatewayError::NotFound { entity });
    }

    let body = resp.text().await.unwrap_or_default();
    Err(GatewayError::Request {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": ...}`, `{"error": ...}` and `{"message": ...}`
/// bodies and falls back to the raw text, then to the status reason.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get_user(&self, user_id: u64) -> Result<User, GatewayError> {
        let path = format!("/api/auth/github/user/{}", user_id);
        let req = self.request(Method::GET, &path);
        self.fetch(req, &path, Some(format!("User {}", user_id)))
            .await
    }

    async fn list_repositories(&self, user_id: u64) -> Result<Vec<Repository>, GatewayError> {
        let path = format!("/api/auth/github/repos/{}", user_id);
        let req = self.request(Method::GET, &path);
        let list: RepositoryList = self.fetch(req, &path, None).await?;
        Ok(list.repos)
    }

    async fn get_repository(
        &self,
        user_id: u64,
        owner: &str,
        repo: &str,
    ) -> Result<Repository, GatewayError> {
        let path = format!("/api/github/repos/{}/{}", owner, repo);
        let req = self
            .request(Method::GET, &path)
            .query(&[("user_id", user_id)]);
        self.fetch(req, &path, Some(format!("Repository {}/{}", owner, repo)))
            .await
    }

    async fn list_issues(
        &self,
        user_id: u64,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, GatewayError> {
        let path = "/api/github/issues";
        let mut params = vec![("user_id", user_id.to_string())];
        params.extend(filter.query_params());
        let req = self.request(Method::GET, path).query(&params);
        self.fetch(req, path, None).await
    }

    async fn get_issue(&self, user_id: u64, issue_id: u64) -> Result<Issue, GatewayError> {
        let path = format!("/api/github/issues/{}", issue_id);
        let req = self
            .request(Method::GET, &path)
            .query(&[("user_id", user_id)]);
        self.fetch(req, &path, Some(format!("Issue {}", issue_id)))
            .await
    }

    async fn list_fixes(&self, user_id: u64, issue_id: u64) -> Result<Vec<Fix>, GatewayError> {
        let path = format!("/api/issues/{}/fixes", issue_id);
        let req = self
            .request(Method::GET, &path)
            .query(&[("user_id", user_id)]);
        self.fetch(req, &path, Some(format!("Issue {}", issue_id)))
            .await
    }

    async fn generate_fix(&self, user_id: u64, issue_id: u64) -> Result<Fix, GatewayError> {
        let path = format!("/api/issues/issues/{}/generate-fix", issue_id);
        let req = self
            .request(Method::POST, &path)
            .query(&[("user_id", user_id)]);
        self.fetch(req, &path, Some(format!("Issue {}", issue_id)))
            .await
    }

    async fn submit_fix(
        &self,
        user_id: u64,
        fix_id: u64,
        message: &str,
    ) -> Result<Fix, GatewayError> {
        let path = format!("/api/issues/fixes/{}/submit", fix_id);
        let req = self
            .request(Method::POST, &path)
            .query(&[("user_id", user_id)])
            .json(&SubmitFixRequest {
                submission_message: message.to_string(),
            });
        self.fetch(req, &path, Some(format!("Fix {}", fix_id)))
            .await
    }

    async fn delete_fix(&self, user_id: u64, fix_id: u64) -> Result<(), GatewayError> {
        let path = format!("/api/issues/fixes/{}", fix_id);
        let req = self
            .request(Method::DELETE, &path)
            .query(&[("user_id", user_id)]);
        send(req, Some(format!("Fix {}", fix_id))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::StatusCode as AxumStatus,
        response::IntoResponse,
        routing::{get, post},
    };
    use crate::models::FixStatus;
    use serde_json::{Value, json};
    use std::collections::HashMap;

    async fn spawn_server(app: Router) -> HttpGateway {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        HttpGateway::with_client(Client::new(), format!("http://{}", addr))
    }

    /// 400 unless the request carries `user_id=<expected>`.
    fn require_user(q: &HashMap<String, String>, expected: &str) -> Result<(), AxumStatus> {
        match q.get("user_id") {
            Some(id) if id == expected => Ok(()),
            _ => Err(AxumStatus::BAD_REQUEST),
        }
    }

    fn issue_json(id: u64, title: &str) -> Value {
        json!({
            "id": id,
            "github_issue_id": id + 1000,
            "title": title,
            "repo_full_name": "octo/app",
            "description": "desc",
            "state": "open",
            "html_url": format!("https://github.com/octo/app/issues/{}", id),
            "created_at": "2024-03-05T10:00:00",
            "is_ai_fixable": true,
            "labels": ["bug"]
        })
    }

    fn fix_json(id: u64, submitted: bool, message: Option<&str>) -> Value {
        json!({
            "id": id,
            "content": "--- a\n+++ b",
            "status": if submitted { "submitted" } else { "pending" },
            "created_at": "2024-03-06T10:00:00",
            "is_submitted": submitted,
            "submission_message": message,
            "pr_url": if submitted { Some("https://github.com/octo/app/pull/9") } else { None }
        })
    }

    #[tokio::test]
    async fn test_get_user_hits_auth_path() {
        let app = Router::new().route(
            "/api/auth/github/user/{id}",
            get(|Path(id): Path<u64>| async move {
                Json(json!({"id": id, "username": "octocat", "avatar_url": null}))
            }),
        );
        let gateway = spawn_server(app).await;

        let user = gateway.get_user(42).await.unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.username, "octocat");
        assert!(user.avatar_url.is_none());
    }

    #[tokio::test]
    async fn test_list_repositories_unwraps_envelope() {
        let app = Router::new().route(
            "/api/auth/github/repos/{id}",
            get(|| async {
                Json(json!({"repos": [
                    {"name": "app", "full_name": "octo/app"},
                    {"id": 3, "name": "lib", "full_name": "octo/lib", "description": "a lib"}
                ]}))
            }),
        );
        let gateway = spawn_server(app).await;

        let repos = gateway.list_repositories(1).await.unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].full_name, "octo/app");
        assert_eq!(repos[1].description.as_deref(), Some("a lib"));
    }

    #[tokio::test]
    async fn test_list_repositories_missing_key_is_empty() {
        let app = Router::new().route(
            "/api/auth/github/repos/{id}",
            get(|| async { Json(json!({})) }),
        );
        let gateway = spawn_server(app).await;
        assert!(gateway.list_repositories(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_repository_passes_user_id() {
        let app = Router::new().route(
            "/api/github/repos/{owner}/{repo}",
            get(
                |Path((owner, repo)): Path<(String, String)>,
                 Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(q.get("user_id").map(String::as_str), Some("5"));
                    Json(json!({"name": repo, "full_name": format!("{}/{}", owner, repo)}))
                },
            ),
        );
        let gateway = spawn_server(app).await;

        let repo = gateway.get_repository(5, "octo", "app").await.unwrap();
        assert_eq!(repo.full_name, "octo/app");
    }

    #[tokio::test]
    async fn test_list_issues_sends_filter_params() {
        let app = Router::new().route(
            "/api/github/issues",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                // Echo the query back as the issue title so the test can inspect it.
                let mut keys: Vec<_> = q.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                keys.sort();
                Json(json!([issue_json(1, &keys.join("&"))]))
            }),
        );
        let gateway = spawn_server(app).await;

        let filter = IssueFilter {
            repo_scope: Some("octo/app".into()),
            search_text: Some("crash".into()),
            label: None,
            ai_fixable_only: true,
        };
        let issues = gateway.list_issues(7, &filter).await.unwrap();
        assert_eq!(
            issues[0].title,
            "is_ai_fixable=true&repo_name=octo/app&search=crash&user_id=7"
        );
    }

    #[tokio::test]
    async fn test_list_issues_default_filter_sends_only_user() {
        let app = Router::new().route(
            "/api/github/issues",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.len(), 1);
                assert_eq!(q.get("user_id").map(String::as_str), Some("7"));
                Json(json!([]))
            }),
        );
        let gateway = spawn_server(app).await;
        let issues = gateway.list_issues(7, &IssueFilter::default()).await.unwrap();
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn test_get_issue_sends_user_id() {
        let app = Router::new().route(
            "/api/github/issues/{id}",
            get(
                |Path(id): Path<u64>, Query(q): Query<HashMap<String, String>>| async move {
                    require_user(&q, "4")?;
                    Ok::<_, AxumStatus>(Json(issue_json(id, "Crash")))
                },
            ),
        );
        let gateway = spawn_server(app).await;

        let issue = gateway.get_issue(4, 21).await.unwrap();
        assert_eq!(issue.id, 21);
        assert_eq!(issue.title, "Crash");
    }

    #[tokio::test]
    async fn test_list_fixes_decodes_submitted_fix() {
        let app = Router::new().route(
            "/api/issues/{id}/fixes",
            get(
                |Path(id): Path<u64>, Query(q): Query<HashMap<String, String>>| async move {
                    require_user(&q, "4")?;
                    assert_eq!(id, 21);
                    Ok::<_, AxumStatus>(Json(json!([
                        fix_json(1, false, None),
                        fix_json(2, true, Some("Fix crash"))
                    ])))
                },
            ),
        );
        let gateway = spawn_server(app).await;

        let fixes = gateway.list_fixes(4, 21).await.unwrap();
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].status, FixStatus::Pending);
        assert_eq!(fixes[1].status, FixStatus::Submitted);
        assert!(fixes[1].was_submitted());
    }

    #[tokio::test]
    async fn test_get_issue_not_found() {
        let app = Router::new().route(
            "/api/github/issues/{id}",
            get(|| async { (AxumStatus::NOT_FOUND, Json(json!({"detail": "Issue not found"}))) }),
        );
        let gateway = spawn_server(app).await;

        let err = gateway.get_issue(1, 99).await.unwrap_err();
        match err {
            GatewayError::NotFound { entity } => assert_eq!(entity, "Issue 99"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_carries_detail_message() {
        let app = Router::new().route(
            "/api/issues/{id}/fixes",
            get(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "database unavailable"})),
                )
            }),
        );
        let gateway = spawn_server(app).await;

        let err = gateway.list_fixes(1, 3).await.unwrap_err();
        match err {
            GatewayError::Request { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database unavailable");
            }
            other => panic!("Expected Request error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let app = Router::new().route(
            "/api/github/issues/{id}",
            get(|| async { "not json" }),
        );
        let gateway = spawn_server(app).await;

        let err = gateway.get_issue(1, 2).await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode { .. }), "got {:?}", err);
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop to obtain a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway = HttpGateway::with_client(Client::new(), format!("http://{}", addr));
        let err = gateway.get_user(1).await.unwrap_err();
        assert!(matches!(err, GatewayError::Network(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_generate_fix_posts_with_user_id() {
        let app = Router::new().route(
            "/api/issues/issues/{id}/generate-fix",
            post(
                |Path(id): Path<u64>, Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(id, 12);
                    assert_eq!(q.get("user_id").map(String::as_str), Some("3"));
                    Json(fix_json(77, false, None))
                },
            ),
        );
        let gateway = spawn_server(app).await;

        let fix = gateway.generate_fix(3, 12).await.unwrap();
        assert_eq!(fix.id, 77);
        assert!(!fix.is_submitted);
    }

    #[tokio::test]
    async fn test_submit_fix_sends_message_body() {
        let app = Router::new().route(
            "/api/issues/fixes/{id}/submit",
            post(
                |Path(id): Path<u64>,
                 Query(q): Query<HashMap<String, String>>,
                 Json(body): Json<Value>| async move {
                    require_user(&q, "3")?;
                    let message = body["submission_message"].as_str().unwrap().to_string();
                    Ok::<_, AxumStatus>(Json(fix_json(id, true, Some(&message))))
                },
            ),
        );
        let gateway = spawn_server(app).await;

        let fix = gateway.submit_fix(3, 77, "Fix the crash").await.unwrap();
        assert!(fix.is_submitted);
        assert_eq!(fix.status, FixStatus::Submitted);
        assert_eq!(fix.submission_message.as_deref(), Some("Fix the crash"));
        assert!(fix.pr_url.is_some());
    }

    #[tokio::test]
    async fn test_delete_fix_accepts_empty_body() {
        let app = Router::new().route(
            "/api/issues/fixes/{id}",
            axum::routing::delete(|Query(q): Query<HashMap<String, String>>| async move {
                match require_user(&q, "3") {
                    Ok(()) => AxumStatus::NO_CONTENT.into_response(),
                    Err(status) => status.into_response(),
                }
            }),
        );
        let gateway = spawn_server(app).await;
        gateway.delete_fix(3, 77).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_fix_is_not_found() {
        let app = Router::new().route(
            "/api/issues/fixes/{id}",
            axum::routing::delete(|| async { AxumStatus::NOT_FOUND.into_response() }),
        );
        let gateway = spawn_server(app).await;
        let err = gateway.delete_fix(3, 77).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }

    #[test]
    fn test_error_message_prefers_detail() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"detail":"bad user"}"#);
        assert_eq!(msg, "bad user");
    }

    #[test]
    fn test_error_message_uses_error_key() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"error":"nope"}"#);
        assert_eq!(msg, "nope");
    }

    #[test]
    fn test_error_message_structured_detail_is_serialized() {
        let msg = error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["query","user_id"]}]}"#,
        );
        assert!(msg.contains("user_id"));
    }

    #[test]
    fn test_error_message_falls_back_to_text_then_reason() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let gateway = HttpGateway::with_client(Client::new(), "http://localhost:8000/");
        assert_eq!(gateway.base_url(), "http://localhost:8000");
    }
}
