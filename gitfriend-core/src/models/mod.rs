pub mod github;
pub mod session;

pub use github::{CommitAuthor, CommitDetail, GitHubCommit, GitHubRepo, GitHubUser, RepoSearchResults};
pub use session::{ChatSession, Message, MessageRole, NewSession, SessionSummary, SessionUpdate};
