//! GitHub REST API client.
//!
//! Authenticated wrapper over the read-only endpoints the insight pipeline
//! and the `/github/*` routes need: user profiles, repository metadata,
//! recent commits and repository search. Requests carry the classic `token`
//! authorization scheme, the v3 JSON accept header and a `User-Agent` (the
//! GitHub API rejects requests without one). Calls are single-shot with a
//! construction-time timeout; callers that need several resources fetch them
//! concurrently and join.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::GitHubApiConfig;
use crate::models::{GitHubCommit, GitHubRepo, GitHubUser, RepoSearchResults};

const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub API errors
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing GitHub token")]
    MissingToken,
}

impl GitHubError {
    /// True when the upstream said the entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitHubError::Api { code: 404, .. })
    }
}

/// GitHub client configuration
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub per_page: u32,
    pub timeout: Duration,
}

impl GitHubConfig {
    /// Build a client config from the `[github]` file section. The token
    /// comes from the argument or the `GITHUB_TOKEN` environment variable.
    pub fn new(token: Option<String>, config: &GitHubApiConfig) -> Self {
        let token = token
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .unwrap_or_default();

        Self {
            token,
            per_page: config.per_page,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}

/// GitHub REST API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
    base_url: String,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        Self::with_base_url(config, GITHUB_API_URL.to_string())
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(config: GitHubConfig, base_url: String) -> Result<Self, GitHubError> {
        if config.token.is_empty() {
            return Err(GitHubError::MissingToken);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("gitfriend/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Build a client straight from the `[github]` file section, taking the
    /// token from the environment.
    pub fn from_config(config: &GitHubApiConfig) -> Result<Self, GitHubError> {
        Self::new(GitHubConfig::new(None, config))
    }

    /// Fetch a user or organization profile.
    pub async fn get_user(&self, username: &str) -> Result<GitHubUser, GitHubError> {
        self.fetch(&format!("/users/{username}"), &[]).await
    }

    /// Fetch a user's repositories, most recently updated first.
    pub async fn list_user_repos(&self, username: &str) -> Result<Vec<GitHubRepo>, GitHubError> {
        let per_page = self.config.per_page.to_string();
        self.fetch(
            &format!("/users/{username}/repos"),
            &[("sort", "updated"), ("per_page", &per_page)],
        )
        .await
    }

    /// Fetch repository metadata.
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<GitHubRepo, GitHubError> {
        self.fetch(&format!("/repos/{owner}/{repo}"), &[]).await
    }

    /// Fetch a repository's most recent commits.
    pub async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<GitHubCommit>, GitHubError> {
        let per_page = self.config.per_page.to_string();
        self.fetch(
            &format!("/repos/{owner}/{repo}/commits"),
            &[("per_page", &per_page)],
        )
        .await
    }

    /// Search repositories, ordered by stars descending.
    pub async fn search_repositories(&self, query: &str) -> Result<RepoSearchResults, GitHubError> {
        let per_page = self.config.per_page.to_string();
        self.fetch(
            "/search/repositories",
            &[
                ("q", query),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", &per_page),
            ],
        )
        .await
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GitHubError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("Authorization", format!("token {}", self.config.token))
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<GitHubErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "unknown error".to_string());

            tracing::error!(code = status.as_u16(), message = %message, "GitHub API error");

            return Err(GitHubError::Api {
                code: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(token: &str) -> GitHubConfig {
        GitHubConfig {
            token: token.to_string(),
            per_page: 10,
            timeout: Duration::from_secs(5),
        }
    }

    fn mock_user() -> serde_json::Value {
        serde_json::json!({
            "login": "octocat",
            "id": 583231,
            "name": "The Octocat",
            "bio": null,
            "avatar_url": "https://avatars.githubusercontent.com/u/583231",
            "html_url": "https://github.com/octocat",
            "public_repos": 8,
            "followers": 17000,
            "following": 9,
            "created_at": "2011-01-25T18:44:36Z"
        })
    }

    fn mock_repo(name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": 1296269,
            "name": name,
            "full_name": format!("octocat/{name}"),
            "description": "My first repository on GitHub!",
            "html_url": format!("https://github.com/octocat/{name}"),
            "language": "Rust",
            "stargazers_count": 2500,
            "forks_count": 130,
            "open_issues_count": 7,
            "topics": ["octocat", "api"],
            "visibility": "public",
            "created_at": "2011-01-26T19:01:12Z",
            "updated_at": "2024-11-05T09:30:00Z",
            "pushed_at": "2024-11-04T21:12:45Z"
        })
    }

    fn mock_commit(message: &str, with_author: bool) -> serde_json::Value {
        let author = if with_author {
            serde_json::json!({ "name": "Mona Lisa", "date": "2024-11-04T21:12:45Z" })
        } else {
            serde_json::Value::Null
        };
        serde_json::json!({
            "sha": "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d",
            "commit": { "message": message, "author": author },
            "html_url": "https://github.com/octocat/hello-world/commit/7fd1a60"
        })
    }

    #[tokio::test]
    async fn test_get_user_sends_auth_headers_and_parses_profile() {
        let mock_server = MockServer::start().await;
        let client = GitHubClient::with_base_url(test_config("test-token"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .and(header("authorization", "token test-token"))
            .and(header("accept", "application/vnd.github.v3+json"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_user()))
            .mount(&mock_server)
            .await;

        let user = client.get_user("octocat").await.unwrap();

        assert_eq!(user.login, "octocat");
        assert_eq!(user.followers, 17000);
        assert_eq!(user.name.as_deref(), Some("The Octocat"));
        assert!(user.bio.is_none());
    }

    #[tokio::test]
    async fn test_list_user_repos_passes_sort_and_page_size() {
        let mock_server = MockServer::start().await;
        let client = GitHubClient::with_base_url(test_config("test-token"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("GET"))
            .and(path("/users/octocat/repos"))
            .and(query_param("sort", "updated"))
            .and(query_param("per_page", "10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([mock_repo("hello-world")])),
            )
            .mount(&mock_server)
            .await;

        let repos = client.list_user_repos("octocat").await.unwrap();

        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "hello-world");
        assert_eq!(repos[0].stargazers_count, 2500);
        assert_eq!(repos[0].topics, vec!["octocat", "api"]);
    }

    #[tokio::test]
    async fn test_get_repository_parses_metadata() {
        let mock_server = MockServer::start().await;
        let client = GitHubClient::with_base_url(test_config("test-token"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello-world"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_repo("hello-world")))
            .mount(&mock_server)
            .await;

        let repo = client.get_repository("octocat", "hello-world").await.unwrap();

        assert_eq!(repo.full_name, "octocat/hello-world");
        assert_eq!(repo.language.as_deref(), Some("Rust"));
        assert!(repo.pushed_at.is_some());
    }

    #[tokio::test]
    async fn test_list_commits_tolerates_null_author() {
        let mock_server = MockServer::start().await;
        let client = GitHubClient::with_base_url(test_config("test-token"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello-world/commits"))
            .and(query_param("per_page", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                mock_commit("Fix all the bugs", true),
                mock_commit("Import from old host", false),
            ])))
            .mount(&mock_server)
            .await;

        let commits = client.list_commits("octocat", "hello-world").await.unwrap();

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].commit.author.as_ref().unwrap().name, "Mona Lisa");
        assert!(commits[1].commit.author.is_none());
    }

    #[tokio::test]
    async fn test_search_repositories_encodes_query() {
        let mock_server = MockServer::start().await;
        let client = GitHubClient::with_base_url(test_config("test-token"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .and(query_param("q", "rust http server"))
            .and(query_param("sort", "stars"))
            .and(query_param("order", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_count": 1,
                "items": [mock_repo("hyper")]
            })))
            .mount(&mock_server)
            .await;

        let results = client.search_repositories("rust http server").await.unwrap();

        assert_eq!(results.total_count, 1);
        assert_eq!(results.items[0].name, "hyper");
    }

    #[tokio::test]
    async fn test_404_maps_to_api_error() {
        let mock_server = MockServer::start().await;
        let client = GitHubClient::with_base_url(test_config("test-token"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&mock_server)
            .await;

        let err = client.get_user("no-such-user-xyz").await.unwrap_err();

        assert!(err.is_not_found());
        match err {
            GitHubError::Api { code, message } => {
                assert_eq!(code, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_treated_as_not_found() {
        let mock_server = MockServer::start().await;
        let client = GitHubClient::with_base_url(test_config("test-token"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let err = client
            .get_repository("octocat", "hello-world")
            .await
            .unwrap_err();

        assert!(!err.is_not_found());
        match err {
            GitHubError::Api { code, .. } => assert_eq!(code, 502),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_token_fails_construction() {
        let result = GitHubClient::new(test_config(""));

        assert!(result.is_err(), "Expected error with missing token");
        match result {
            Err(GitHubError::MissingToken) => {}
            _ => panic!("Expected MissingToken error"),
        }
    }
}
