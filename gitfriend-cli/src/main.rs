//! gitfriend-cli — terminal frontend for the Git Friend HTTP API
//!
//! # Subcommands
//! - `status`                                  — show server health
//! - `chat <message> [--chat-id] [--user]`     — ask the assistant
//! - `history [--user] [--json]`               — list stored chat sessions
//! - `show <id>`                               — print one session transcript
//! - `delete <id>`                             — delete a session
//! - `analyze-user <login>`                    — AI profile analysis
//! - `analyze-repo <owner> <repo>`             — AI repository analysis

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8790";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "gitfriend-cli",
    version,
    about = "Terminal frontend for the Git Friend HTTP API"
)]
struct Cli {
    /// Git Friend HTTP server URL (overrides GITFRIEND_HTTP_URL env var)
    #[arg(long, env = "GITFRIEND_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show Git Friend server status
    Status,

    /// Ask the assistant a Git/GitHub question
    Chat {
        /// The message to send
        message: String,

        /// Append to an existing chat session instead of starting a new one
        #[arg(long)]
        chat_id: Option<String>,

        /// Owner recorded on a newly created session
        #[arg(long)]
        user: Option<String>,
    },

    /// List stored chat sessions
    History {
        /// Only list sessions owned by this user
        #[arg(long)]
        user: Option<String>,

        /// Output the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Print one chat session as a transcript
    Show {
        /// Session id (UUID)
        id: String,
    },

    /// Delete a chat session
    Delete {
        /// Session id (UUID)
        id: String,
    },

    /// Analyze a GitHub user's profile
    AnalyzeUser {
        /// GitHub login to analyze
        login: String,
    },

    /// Analyze a GitHub repository
    AnalyzeRepo {
        /// Repository owner
        owner: String,

        /// Repository name
        repo: String,
    },
}

// ============================================================================
// API Response Types
// ============================================================================

/// One row of GET /chat-history
#[derive(Debug, Deserialize)]
pub struct SessionSummaryView {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub message_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub sessions: Vec<SessionSummaryView>,
}

/// One message of GET /chat-history/:id
#[derive(Debug, Deserialize)]
pub struct MessageView {
    pub role: String,
    pub content: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionView {
    pub id: String,
    pub title: String,
    pub messages: Vec<MessageView>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub session: SessionView,
}

// ============================================================================
// Output Formatting
// ============================================================================

/// First segment of a UUID — enough to identify a session in a table.
pub fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}

/// The date part of an RFC 3339 timestamp.
pub fn short_date(timestamp: &str) -> &str {
    &timestamp[..10.min(timestamp.len())]
}

/// One list row: id, last activity, size, title.
pub fn format_summary_line(session: &SessionSummaryView) -> String {
    format!(
        "{}  {}  {:>3} msgs  {}",
        short_id(&session.id),
        short_date(&session.updated_at),
        session.message_count,
        session.title
    )
}

/// A whole session as a readable transcript.
pub fn format_transcript(session: &SessionView) -> String {
    let mut out = format!(
        "{} ({}, started {})\n",
        session.title,
        short_id(&session.id),
        short_date(&session.created_at)
    );

    for message in &session.messages {
        out.push_str(&format!("\n[{}] {}\n", message.role, message.content));
    }

    out
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// Unwrap a sent request, bailing out of the process on connection failures
/// and non-2xx responses.
fn expect_success(
    result: reqwest::Result<reqwest::blocking::Response>,
    url: &str,
) -> reqwest::blocking::Response {
    let resp = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("gitfriend-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("gitfriend-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    resp
}

fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::blocking::Response,
    what: &str,
) -> T {
    match resp.json() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("gitfriend-cli: failed to parse {} response: {}", what, e);
            std::process::exit(1);
        }
    }
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = http_client(10)?;

    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!(
                "Git Friend server: {}",
                body["status"].as_str().unwrap_or("unknown")
            );
            println!("Version:           {}", body["version"].as_str().unwrap_or("?"));
            println!(
                "PostgreSQL:        {}",
                body["postgresql"].as_str().unwrap_or("?")
            );
        }
        Ok(r) => {
            eprintln!("gitfriend-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("gitfriend-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Send one user message to POST /chat and print the plain-text reply.
fn do_chat(
    server: &str,
    message: &str,
    chat_id: Option<&str>,
    user: Option<&str>,
) -> anyhow::Result<()> {
    let client = http_client(60)?;

    let url = format!("{}/chat", server);
    let body = serde_json::json!({
        "messages": [ { "role": "user", "content": message } ],
        "chat_id": chat_id,
        "user_id": user,
    });

    let resp = expect_success(client.post(&url).json(&body).send(), &url);

    println!("{}", resp.text().unwrap_or_default());

    Ok(())
}

/// List sessions from GET /chat-history, as a table or raw JSON.
fn do_history(server: &str, user: Option<&str>, json_output: bool) -> anyhow::Result<()> {
    let client = http_client(10)?;

    let url = format!("{}/chat-history", server);
    let mut req = client.get(&url);
    if let Some(u) = user {
        req = req.query(&[("user_id", u)]);
    }

    let resp = expect_success(req.send(), &url);

    if json_output {
        let body: serde_json::Value = parse_response(resp, "history");
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let history: HistoryResponse = parse_response(resp, "history");

    if history.sessions.is_empty() {
        eprintln!("No chat sessions found.");
        return Ok(());
    }

    for session in &history.sessions {
        println!("{}", format_summary_line(session));
    }

    Ok(())
}

/// Print one session transcript from GET /chat-history/:id.
fn do_show(server: &str, id: &str) -> anyhow::Result<()> {
    let client = http_client(10)?;

    let url = format!("{}/chat-history/{}", server, id);
    let resp = expect_success(client.get(&url).send(), &url);

    let body: SessionResponse = parse_response(resp, "session");
    print!("{}", format_transcript(&body.session));

    Ok(())
}

/// Delete a session via DELETE /chat-history/:id.
fn do_delete(server: &str, id: &str) -> anyhow::Result<()> {
    let client = http_client(10)?;

    let url = format!("{}/chat-history/{}", server, id);
    let resp = expect_success(client.delete(&url).send(), &url);

    let body: serde_json::Value = parse_response(resp, "delete");
    if body["deleted"] == true {
        println!("Deleted {}", id);
    }

    Ok(())
}

/// Fetch a profile via GET /github/user, then feed the same payload to
/// POST /github/analyze-profile and print the insights.
fn do_analyze_user(server: &str, login: &str) -> anyhow::Result<()> {
    let client = http_client(60)?;

    let fetch_url = format!("{}/github/user", server);
    let resp = expect_success(
        client.get(&fetch_url).query(&[("username", login)]).send(),
        &fetch_url,
    );
    let profile: serde_json::Value = parse_response(resp, "profile");

    let analyze_url = format!("{}/github/analyze-profile", server);
    let resp = expect_success(
        client.post(&analyze_url).json(&profile).send(),
        &analyze_url,
    );
    let body: serde_json::Value = parse_response(resp, "analysis");

    println!("{}", body["insights"].as_str().unwrap_or(""));

    Ok(())
}

/// Fetch a repository via GET /github/repo, then feed the same payload to
/// POST /github/analyze-repo and print the insights.
fn do_analyze_repo(server: &str, owner: &str, repo: &str) -> anyhow::Result<()> {
    let client = http_client(60)?;

    let fetch_url = format!("{}/github/repo", server);
    let resp = expect_success(
        client
            .get(&fetch_url)
            .query(&[("owner", owner), ("repo", repo)])
            .send(),
        &fetch_url,
    );
    let payload: serde_json::Value = parse_response(resp, "repository");

    let analyze_url = format!("{}/github/analyze-repo", server);
    let resp = expect_success(
        client.post(&analyze_url).json(&payload).send(),
        &analyze_url,
    );
    let body: serde_json::Value = parse_response(resp, "analysis");

    println!("{}", body["insights"].as_str().unwrap_or(""));

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Status => do_status(&server),
        Commands::Chat {
            message,
            chat_id,
            user,
        } => do_chat(&server, &message, chat_id.as_deref(), user.as_deref()),
        Commands::History { user, json } => do_history(&server, user.as_deref(), json),
        Commands::Show { id } => do_show(&server, &id),
        Commands::Delete { id } => do_delete(&server, &id),
        Commands::AnalyzeUser { login } => do_analyze_user(&server, &login),
        Commands::AnalyzeRepo { owner, repo } => do_analyze_repo(&server, &owner, &repo),
    };

    if let Err(e) = result {
        eprintln!("gitfriend-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_summary(id: &str, title: &str, count: i64) -> SessionSummaryView {
        SessionSummaryView {
            id: id.to_string(),
            user_id: Some("tester".to_string()),
            title: title.to_string(),
            message_count: count,
            created_at: "2026-03-01T09:15:00Z".to_string(),
            updated_at: "2026-03-02T17:40:00Z".to_string(),
        }
    }

    fn mock_session() -> SessionView {
        SessionView {
            id: "7b5c24ab-1234-5678-9abc-def012345678".to_string(),
            title: "Rebase help".to_string(),
            messages: vec![
                MessageView {
                    role: "user".to_string(),
                    content: "how do I rebase onto main?".to_string(),
                    timestamp: Some("2026-03-01T09:15:00Z".to_string()),
                },
                MessageView {
                    role: "assistant".to_string(),
                    content: "git rebase main".to_string(),
                    timestamp: Some("2026-03-01T09:15:02Z".to_string()),
                },
            ],
            created_at: "2026-03-01T09:15:00Z".to_string(),
            updated_at: "2026-03-01T09:15:02Z".to_string(),
        }
    }

    // ========================================================================
    // TEST 1: short_id keeps the first UUID segment
    // ========================================================================
    #[test]
    fn test_short_id_truncates() {
        assert_eq!(short_id("7b5c24ab-1234-5678-9abc-def012345678"), "7b5c24ab");
    }

    // ========================================================================
    // TEST 2: short_id handles inputs shorter than one segment
    // ========================================================================
    #[test]
    fn test_short_id_short_input() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }

    // ========================================================================
    // TEST 3: short_date keeps only the calendar date
    // ========================================================================
    #[test]
    fn test_short_date_truncates() {
        assert_eq!(short_date("2026-03-02T17:40:00Z"), "2026-03-02");
        assert_eq!(short_date("2026"), "2026");
    }

    // ========================================================================
    // TEST 4: summary line carries id, date, count and title
    // ========================================================================
    #[test]
    fn test_format_summary_line() {
        let summary = mock_summary(
            "7b5c24ab-1234-5678-9abc-def012345678",
            "Undo questions",
            4,
        );
        let line = format_summary_line(&summary);

        assert!(line.starts_with("7b5c24ab"));
        assert!(line.contains("2026-03-02"));
        assert!(line.contains("4 msgs"));
        assert!(line.ends_with("Undo questions"));
    }

    // ========================================================================
    // TEST 5: transcript keeps message order and labels the roles
    // ========================================================================
    #[test]
    fn test_format_transcript_order_and_roles() {
        let out = format_transcript(&mock_session());

        assert!(out.starts_with("Rebase help (7b5c24ab, started 2026-03-01)"));
        let user_pos = out.find("[user] how do I rebase onto main?").unwrap();
        let assistant_pos = out.find("[assistant] git rebase main").unwrap();
        assert!(user_pos < assistant_pos, "user turn must come first");
    }

    // ========================================================================
    // TEST 6: an empty session still renders its header
    // ========================================================================
    #[test]
    fn test_format_transcript_empty_session() {
        let mut session = mock_session();
        session.messages.clear();

        let out = format_transcript(&session);
        assert!(out.starts_with("Rebase help"));
        assert!(!out.contains("[user]"));
    }
}
