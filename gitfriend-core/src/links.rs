//! GitHub link classifier.
//!
//! Scans free-form chat text for the first GitHub URL and decides whether it
//! points at a user/organization profile or at a specific repository. Used by
//! the chat endpoint to dispatch link-bearing messages to the insight
//! pipeline instead of the plain completion path.

use regex::Regex;
use serde::{Deserialize, Serialize};

const GITHUB_URL_PATTERN: &str = r"https?://(?:www\.)?github\.com/([^/\s]+)(?:/([^/\s]+))?";

/// What a matched GitHub URL refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LinkKind {
    Profile { owner: String },
    Repository { owner: String, repo: String },
}

/// A classified GitHub link together with the exact substring that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedGitHubLink {
    #[serde(flatten)]
    pub kind: LinkKind,
    pub url: String,
}

/// Find the first GitHub URL in `text` and classify it.
///
/// Returns `None` when the text contains no GitHub URL; for ordinary chat
/// input that is the expected outcome, not an error. Only the first two path
/// segments matter, so a link to `github.com/rust-lang/rust/issues/1`
/// classifies as the `rust-lang/rust` repository. Reserved paths such as
/// `github.com/settings` are indistinguishable from profiles at this layer
/// and classify as such; the GitHub API answers 404 for them downstream.
pub fn parse_github_link(text: &str) -> Option<ParsedGitHubLink> {
    let re = Regex::new(GITHUB_URL_PATTERN).ok()?;
    let caps = re.captures(text)?;

    let url = caps.get(0)?.as_str().to_string();
    let owner = caps.get(1)?.as_str().to_string();

    let kind = match caps.get(2) {
        Some(repo) => LinkKind::Repository {
            owner,
            repo: repo.as_str().to_string(),
        },
        None => LinkKind::Profile { owner },
    };

    Some(ParsedGitHubLink { kind, url })
}
