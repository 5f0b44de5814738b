//! GitHub insight pipeline.
//!
//! Two concurrent GitHub fetches joined, then one oracle call producing a few
//! paragraphs of prose. Both fetches must succeed before anything is sent to
//! the oracle; a partial dataset is never analyzed. The prompt builders are
//! pure so the analyze endpoints can run over caller-supplied entities
//! without refetching.

use thiserror::Error;

use crate::github::{GitHubClient, GitHubError};
use crate::links::{LinkKind, ParsedGitHubLink};
use crate::models::{GitHubCommit, GitHubRepo, GitHubUser};
use crate::oracle::{GroqClient, GroqError};

/// Commits embedded in the repository prompt. The fetch returns more; the
/// prompt only needs the newest few to show the commit cadence.
const PROMPT_COMMIT_CAP: usize = 5;

/// Insight pipeline errors
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("GitHub fetch failed: {0}")]
    GitHub(#[from] GitHubError),

    #[error("insight generation failed: {0}")]
    Oracle(#[from] GroqError),
}

impl InsightError {
    /// True when GitHub reported the requested entity missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, InsightError::GitHub(e) if e.is_not_found())
    }
}

/// Fetch a user profile and their most recently updated repositories.
///
/// The two requests run concurrently; either failure fails the pair.
pub async fn fetch_profile(
    github: &GitHubClient,
    username: &str,
) -> Result<(GitHubUser, Vec<GitHubRepo>), GitHubError> {
    tokio::try_join!(github.get_user(username), github.list_user_repos(username))
}

/// Fetch repository metadata and its most recent commits, concurrently.
pub async fn fetch_repository(
    github: &GitHubClient,
    owner: &str,
    repo: &str,
) -> Result<(GitHubRepo, Vec<GitHubCommit>), GitHubError> {
    tokio::try_join!(
        github.get_repository(owner, repo),
        github.list_commits(owner, repo)
    )
}

/// Fetch a profile and ask the oracle for an analysis of it.
pub async fn analyze_profile(
    github: &GitHubClient,
    oracle: &GroqClient,
    username: &str,
) -> Result<String, InsightError> {
    let (user, repositories) = fetch_profile(github, username).await?;
    let prompt = profile_prompt(&user, &repositories);
    Ok(oracle.generate(&prompt).await?)
}

/// Fetch a repository and ask the oracle for an analysis of it.
pub async fn analyze_repository(
    github: &GitHubClient,
    oracle: &GroqClient,
    owner: &str,
    repo: &str,
) -> Result<String, InsightError> {
    let (repository, commits) = fetch_repository(github, owner, repo).await?;
    let prompt = repository_prompt(&repository, &commits);
    Ok(oracle.generate(&prompt).await?)
}

/// Run the pipeline for whatever entity a classified chat link points at.
pub async fn analyze_link(
    github: &GitHubClient,
    oracle: &GroqClient,
    link: &ParsedGitHubLink,
) -> Result<String, InsightError> {
    match &link.kind {
        LinkKind::Profile { owner } => analyze_profile(github, oracle, owner).await,
        LinkKind::Repository { owner, repo } => {
            analyze_repository(github, oracle, owner, repo).await
        }
    }
}

/// Build the profile-analysis prompt around a condensed JSON projection of
/// the user and their repositories. Only the fields the analysis needs are
/// embedded, never the raw API payload.
pub fn profile_prompt(user: &GitHubUser, repositories: &[GitHubRepo]) -> String {
    let user_data = serde_json::json!({
        "login": user.login,
        "name": user.name,
        "bio": user.bio,
        "public_repos": user.public_repos,
        "followers": user.followers,
        "following": user.following,
        "created_at": user.created_at,
    });

    let repo_data: Vec<serde_json::Value> = repositories
        .iter()
        .map(|repo| {
            serde_json::json!({
                "name": repo.name,
                "description": repo.description,
                "language": repo.language,
                "stars": repo.stargazers_count,
                "forks": repo.forks_count,
                "topics": repo.topics,
            })
        })
        .collect();

    format!(
        "You are a GitHub profile analyzer. Based on the following user data and repositories, \
         provide insightful analysis about:\n\
         \n\
         1. The developer's main areas of expertise and interests\n\
         2. Primary programming languages and technologies used\n\
         3. Activity level and contribution patterns\n\
         4. Notable projects and their significance\n\
         5. Overall GitHub presence and engagement\n\
         \n\
         Keep your analysis concise but informative, with 4-5 paragraphs maximum.\n\
         \n\
         User data:\n{:#}\n\
         \n\
         Top repositories ({}):\n{:#}",
        user_data,
        repositories.len(),
        serde_json::Value::Array(repo_data)
    )
}

/// Build the repository-analysis prompt. Commits are capped at the
/// [`PROMPT_COMMIT_CAP`] most recent; a missing commit author is embedded as
/// null rather than dropped.
pub fn repository_prompt(repository: &GitHubRepo, commits: &[GitHubCommit]) -> String {
    let repo_data = serde_json::json!({
        "name": repository.name,
        "full_name": repository.full_name,
        "description": repository.description,
        "language": repository.language,
        "stars": repository.stargazers_count,
        "forks": repository.forks_count,
        "open_issues": repository.open_issues_count,
        "created_at": repository.created_at,
        "updated_at": repository.updated_at,
        "pushed_at": repository.pushed_at,
        "topics": repository.topics,
        "visibility": repository.visibility,
    });

    let commit_data: Vec<serde_json::Value> = commits
        .iter()
        .take(PROMPT_COMMIT_CAP)
        .map(|commit| {
            serde_json::json!({
                "message": commit.commit.message,
                "author": commit.commit.author.as_ref().map(|a| a.name.clone()),
                "date": commit.commit.author.as_ref().map(|a| a.date),
            })
        })
        .collect();

    format!(
        "You are a GitHub repository analyzer. Based on the following repository data, \
         provide insightful analysis about:\n\
         \n\
         1. The project's purpose and main features\n\
         2. Technology stack used (based on language, topics, etc.)\n\
         3. Activity level and maintenance status\n\
         4. Potential use cases or applications\n\
         5. Any notable patterns in the commit history\n\
         \n\
         Keep your analysis concise but informative, with 4-5 paragraphs maximum.\n\
         \n\
         Repository data:\n{:#}\n\
         \n\
         Recent commits ({}):\n{:#}",
        repo_data,
        commit_data.len(),
        serde_json::Value::Array(commit_data)
    )
}

/// Build the commit-message prompt for a pasted diff. The oracle is asked for
/// exactly one gitmoji-prefixed conventional commit subject line.
pub fn commit_message_prompt(diff: &str) -> String {
    format!(
        "You are a commit message generator. Write one conventional commit subject line \
         for the following code changes:\n\
         \n\
         1. Start with a fitting gitmoji shortcode such as :sparkles:, :bug: or :recycle:\n\
         2. Follow it with a type prefix like feat:, fix:, refactor: or docs:\n\
         3. Use the imperative mood and keep the whole line under 72 characters\n\
         4. Reply with that single line only, no explanations and no code fences\n\
         \n\
         Diff:\n{diff}"
    )
}

// ============================================================================
// TESTS
// ============================================================================
