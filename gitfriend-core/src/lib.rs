pub mod config;
pub mod db;
pub mod emoji;
pub mod github;
pub mod insight;
pub mod links;
pub mod models;
pub mod oracle;
pub mod store;
pub mod trending;

pub use config::GitFriendConfig;
pub use github::{GitHubClient, GitHubConfig, GitHubError};
pub use insight::InsightError;
pub use links::{parse_github_link, LinkKind, ParsedGitHubLink};
pub use oracle::{GroqClient, GroqConfig, GroqError, OracleMessage, OracleRole};
pub use store::StoreError;
pub use trending::{TrendingClient, TrendingError};
