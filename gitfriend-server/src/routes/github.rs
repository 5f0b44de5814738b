//! GitHub-facing endpoints: profile/repository lookups, repository search,
//! AI insight generation, commit message generation, the trending proxy and
//! the commit emoji reference table.
//!
//! The analyze endpoints run over caller-supplied entities (the payload a
//! previous lookup returned) so a client can fetch once and analyze without
//! refetching. Upstream failure causes are logged here; response bodies stay
//! generic.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use gitfriend_core::models::{GitHubCommit, GitHubRepo, GitHubUser};
use gitfriend_core::{emoji, insight};
use serde::Deserialize;

use crate::http::{error_json, HttpState};

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct UserQuery {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RepoQuery {
    pub owner: Option<String>,
    pub repo: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TrendingQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct EmojiQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeProfileRequest {
    pub user: Option<GitHubUser>,
    #[serde(default)]
    pub repositories: Vec<GitHubRepo>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRepoRequest {
    pub repository: Option<GitHubRepo>,
    #[serde(default)]
    pub commits: Vec<GitHubCommit>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GenerateCommitRequest {
    pub diff: Option<String>,
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner profile lookup — joins the user fetch and the repo list.
pub async fn user_inner(state: &HttpState, query: UserQuery) -> (StatusCode, serde_json::Value) {
    let username = match query.username {
        Some(u) if !u.trim().is_empty() => u,
        _ => {
            return (StatusCode::BAD_REQUEST, error_json("Username is required"));
        }
    };

    match insight::fetch_profile(&state.github, &username).await {
        Ok((user, repositories)) => (
            StatusCode::OK,
            serde_json::json!({
                "user": user,
                "repositories": repositories,
            }),
        ),
        Err(e) if e.is_not_found() => (
            StatusCode::NOT_FOUND,
            error_json(format!("GitHub user {username} not found")),
        ),
        Err(e) => {
            tracing::error!(username = %username, error = %e, "GitHub profile fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_json("Failed to fetch GitHub data"),
            )
        }
    }
}

/// Inner repository lookup — joins the metadata fetch and the commit list.
pub async fn repo_inner(state: &HttpState, query: RepoQuery) -> (StatusCode, serde_json::Value) {
    let (owner, repo) = match (query.owner, query.repo) {
        (Some(o), Some(r)) if !o.trim().is_empty() && !r.trim().is_empty() => (o, r),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                error_json("Owner and repo are required"),
            );
        }
    };

    match insight::fetch_repository(&state.github, &owner, &repo).await {
        Ok((repository, commits)) => (
            StatusCode::OK,
            serde_json::json!({
                "repository": repository,
                "commits": commits,
            }),
        ),
        Err(e) if e.is_not_found() => (
            StatusCode::NOT_FOUND,
            error_json(format!("Repository {owner}/{repo} not found")),
        ),
        Err(e) => {
            tracing::error!(owner = %owner, repo = %repo, error = %e, "GitHub repository fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_json("Failed to fetch repository data"),
            )
        }
    }
}

/// Inner repository search.
pub async fn search_repos_inner(
    state: &HttpState,
    query: SearchQuery,
) -> (StatusCode, serde_json::Value) {
    let q = match query.q {
        Some(q) if !q.trim().is_empty() => q,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                error_json("Search query is required"),
            );
        }
    };

    match state.github.search_repositories(&q).await {
        Ok(results) => (StatusCode::OK, serde_json::json!(results)),
        Err(e) => {
            tracing::error!(query = %q, error = %e, "Repository search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_json("Failed to search repositories"),
            )
        }
    }
}

/// Inner profile analysis over a caller-supplied profile payload.
pub async fn analyze_profile_inner(
    state: &HttpState,
    req: AnalyzeProfileRequest,
) -> (StatusCode, serde_json::Value) {
    let user = match req.user {
        Some(u) => u,
        None => {
            return (StatusCode::BAD_REQUEST, error_json("User data is required"));
        }
    };

    let prompt = insight::profile_prompt(&user, &req.repositories);

    match state.oracle.generate(&prompt).await {
        Ok(insights) => (StatusCode::OK, serde_json::json!({ "insights": insights })),
        Err(e) => {
            tracing::error!(login = %user.login, error = %e, "Profile analysis failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_json("Failed to analyze profile"),
            )
        }
    }
}

/// Inner repository analysis over a caller-supplied repository payload.
pub async fn analyze_repo_inner(
    state: &HttpState,
    req: AnalyzeRepoRequest,
) -> (StatusCode, serde_json::Value) {
    let repository = match req.repository {
        Some(r) => r,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                error_json("Repository data is required"),
            );
        }
    };

    let prompt = insight::repository_prompt(&repository, &req.commits);

    match state.oracle.generate(&prompt).await {
        Ok(insights) => (StatusCode::OK, serde_json::json!({ "insights": insights })),
        Err(e) => {
            tracing::error!(repo = %repository.full_name, error = %e, "Repository analysis failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_json("Failed to analyze repository"),
            )
        }
    }
}

/// Inner commit message generation from a pasted diff.
pub async fn generate_commit_inner(
    state: &HttpState,
    req: GenerateCommitRequest,
) -> (StatusCode, serde_json::Value) {
    let diff = match req.diff {
        Some(d) if !d.trim().is_empty() => d,
        _ => {
            return (StatusCode::BAD_REQUEST, error_json("diff field is required"));
        }
    };

    let prompt = insight::commit_message_prompt(&diff);

    match state.oracle.generate(&prompt).await {
        Ok(text) => {
            let message = first_nonempty_line(&text);
            (StatusCode::OK, serde_json::json!({ "message": message }))
        }
        Err(e) => {
            tracing::error!(error = %e, "Commit message generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_json("Failed to generate commit message"),
            )
        }
    }
}

/// Inner trending proxy — the upstream payload passes through verbatim.
pub async fn trending_inner(state: &HttpState, page: u32) -> (StatusCode, serde_json::Value) {
    match state.trending.repositories(page).await {
        Ok(payload) => (StatusCode::OK, payload),
        Err(e) => {
            tracing::error!(page, error = %e, "Trending fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_json("Failed to fetch trending repositories"),
            )
        }
    }
}

/// Inner emoji lookup (pure, no IO).
pub fn emojis_inner(category: Option<&str>, query: Option<&str>) -> (StatusCode, serde_json::Value) {
    let emojis = emoji::search(category, query);
    let count = emojis.len();

    (
        StatusCode::OK,
        serde_json::json!({
            "emojis": emojis,
            "count": count,
        }),
    )
}

/// The oracle is told to reply with a single line; when it disobeys, keep the
/// first non-blank line that is not a code fence.
pub fn first_nonempty_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("```"))
        .unwrap_or("")
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn user_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<UserQuery>,
) -> impl IntoResponse {
    let (status, body) = user_inner(&state, query).await;
    (status, Json(body))
}

pub async fn repo_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<RepoQuery>,
) -> impl IntoResponse {
    let (status, body) = repo_inner(&state, query).await;
    (status, Json(body))
}

pub async fn search_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let (status, body) = search_repos_inner(&state, query).await;
    (status, Json(body))
}

pub async fn analyze_profile_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<AnalyzeProfileRequest>,
) -> impl IntoResponse {
    let (status, body) = analyze_profile_inner(&state, req).await;
    (status, Json(body))
}

pub async fn analyze_repo_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<AnalyzeRepoRequest>,
) -> impl IntoResponse {
    let (status, body) = analyze_repo_inner(&state, req).await;
    (status, Json(body))
}

pub async fn generate_commit_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<GenerateCommitRequest>,
) -> impl IntoResponse {
    let (status, body) = generate_commit_inner(&state, req).await;
    (status, Json(body))
}

pub async fn trending_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<TrendingQuery>,
) -> impl IntoResponse {
    let (status, body) = trending_inner(&state, query.page.unwrap_or(1)).await;
    (status, Json(body))
}

pub async fn emojis_handler(Query(query): Query<EmojiQuery>) -> impl IntoResponse {
    let (status, body) = emojis_inner(query.category.as_deref(), query.q.as_deref());
    (status, Json(body))
}

// ============================================================================
// Unit Tests
// ============================================================================
