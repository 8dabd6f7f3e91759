//! advisor-cli: terminal chat client for the Sustainable Fashion Advisor
//!
//! Talks to `advisor-server` over its HTTP API.
//!
//! # Subcommands
//! - `register -u <name> -p <password>`: create an account
//! - `chat -u <name> -p <password>`    : log in and start an interactive chat
//! - `status`                          : show server health
//!
//! Inside `chat`, lines starting with `/` are commands:
//! `/new`, `/resume`, `/clear`, `/deep on|off`, `/export <file> [category]`,
//! `/logout`, `/quit`. Anything else is sent as a prompt.

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8501";

/// Upper bound for one chat turn: model timeout plus the simulated latency.
const CHAT_TIMEOUT_SECS: u64 = 45;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "advisor-cli",
    version,
    about = "Sustainable Fashion Advisor: terminal chat client"
)]
struct Cli {
    /// Advisor HTTP server URL (overrides ADVISOR_HTTP_URL env var)
    #[arg(long, env = "ADVISOR_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        #[arg(short, long, env = "ADVISOR_USERNAME")]
        username: String,

        #[arg(short, long, env = "ADVISOR_PASSWORD")]
        password: String,
    },

    /// Log in and chat interactively
    Chat {
        #[arg(short, long, env = "ADVISOR_USERNAME")]
        username: String,

        #[arg(short, long, env = "ADVISOR_PASSWORD")]
        password: String,
    },

    /// Show advisor server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RowView {
    pub category: String,
    pub recommendation: String,
    pub impact: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageView {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub table: Option<Vec<RowView>>,
}

#[derive(Debug, Deserialize)]
pub struct SessionView {
    pub messages: Vec<MessageView>,
    pub deep_search: bool,
    pub can_resume: bool,
    #[serde(default)]
    pub resumed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    #[serde(flatten)]
    pub view: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct TurnResponse {
    pub reply: MessageView,
    pub notice: Option<String>,
}

// ============================================================================
// REPL commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Prompt(String),
    NewChat,
    Resume,
    Clear,
    DeepSearch(bool),
    Export {
        file: String,
        category: Option<String>,
    },
    Logout,
    Quit,
    Empty,
    Unknown(String),
}

/// Parse one line of REPL input.
pub fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    if !line.starts_with('/') {
        return ReplCommand::Prompt(line.to_string());
    }

    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (head, args.as_slice()) {
        ("/new", []) => ReplCommand::NewChat,
        ("/resume", []) => ReplCommand::Resume,
        ("/clear", []) => ReplCommand::Clear,
        ("/deep", ["on"]) => ReplCommand::DeepSearch(true),
        ("/deep", ["off"]) => ReplCommand::DeepSearch(false),
        ("/export", [file]) => ReplCommand::Export {
            file: file.to_string(),
            category: None,
        },
        ("/export", [file, category]) => ReplCommand::Export {
            file: file.to_string(),
            category: Some(category.to_string()),
        },
        ("/logout", []) => ReplCommand::Logout,
        ("/quit", []) | ("/exit", []) => ReplCommand::Quit,
        _ => ReplCommand::Unknown(line.to_string()),
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Plain-text grid for a recommendation table, column widths fitted to content.
pub fn render_table(rows: &[RowView]) -> String {
    let headers = ["Category", "Recommendation", "Impact"];
    let mut widths = headers.map(|h| h.chars().count());
    for r in rows {
        for (w, cell) in widths
            .iter_mut()
            .zip([&r.category, &r.recommendation, &r.impact])
        {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 3]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{}{}", c, " ".repeat(w - c.chars().count())))
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let rule = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut out = vec![rule.clone(), line(headers), rule.clone()];
    for r in rows {
        out.push(line([r.category.as_str(), r.recommendation.as_str(), r.impact.as_str()]));
    }
    out.push(rule);
    out.join("\n")
}

pub fn render_message(m: &MessageView) -> String {
    let who = match m.role.as_str() {
        "user" => "you",
        _ => "advisor",
    };
    let mut out = format!("[{}] {}", who, m.content);
    if let Some(rows) = m.table.as_deref().filter(|r| !r.is_empty()) {
        out.push_str("\n\n📊 Sustainable Fashion Recommendations\n");
        out.push_str(&render_table(rows));
    }
    out
}

fn print_transcript(view: &SessionView) {
    for m in &view.messages {
        println!("{}\n", render_message(m));
    }
    println!(
        "(deep search: {}{})",
        if view.deep_search { "on" } else { "off" },
        if view.can_resume { ", /resume available" } else { "" }
    );
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<Client> {
    Ok(Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send and turn any non-2xx reply into an error carrying the server's message.
fn send(req: RequestBuilder) -> anyhow::Result<Response> {
    let resp = req.send()?;
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body: Value = resp.json().unwrap_or_default();
    let msg = body["error"].as_str().unwrap_or("request failed").to_string();
    anyhow::bail!("{} (HTTP {})", msg, status.as_u16())
}

fn do_register(server: &str, username: &str, password: &str) -> anyhow::Result<()> {
    let url = format!("{}/register", server);
    let resp = send(
        client(30)?
            .post(&url)
            .json(&json!({ "username": username, "password": password })),
    )?;
    let body: Value = resp.json()?;
    println!("{}", body["message"].as_str().unwrap_or("Registered."));
    Ok(())
}

struct ChatClient {
    http: Client,
    server: String,
    token: String,
}

impl ChatClient {
    fn login(server: &str, username: &str, password: &str) -> anyhow::Result<(Self, LoginResponse)> {
        let http = client(CHAT_TIMEOUT_SECS)?;
        let resp = send(
            http.post(format!("{}/login", server))
                .json(&json!({ "username": username, "password": password })),
        )?;
        let login: LoginResponse = resp.json()?;
        let me = Self {
            http,
            server: server.to_string(),
            token: login.token.clone(),
        };
        Ok((me, login))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    fn submit(&self, prompt: &str) -> anyhow::Result<TurnResponse> {
        let resp = send(
            self.http
                .post(self.url("/chat"))
                .bearer_auth(&self.token)
                .json(&json!({ "prompt": prompt })),
        )?;
        Ok(resp.json()?)
    }

    fn action(&self, path: &str) -> anyhow::Result<SessionView> {
        let resp = send(self.http.post(self.url(path)).bearer_auth(&self.token))?;
        Ok(resp.json()?)
    }

    fn set_deep_search(&self, enabled: bool) -> anyhow::Result<SessionView> {
        let resp = send(
            self.http
                .put(self.url("/chat/deep-search"))
                .bearer_auth(&self.token)
                .json(&json!({ "enabled": enabled })),
        )?;
        Ok(resp.json()?)
    }

    fn export(&self, category: Option<&str>) -> anyhow::Result<String> {
        let mut req = self.http.get(self.url("/chat/export")).bearer_auth(&self.token);
        if let Some(c) = category {
            req = req.query(&[("category", c)]);
        }
        Ok(send(req)?.text()?)
    }

    fn logout(&self) -> anyhow::Result<String> {
        let resp = send(self.http.post(self.url("/logout")).bearer_auth(&self.token))?;
        let body: Value = resp.json()?;
        Ok(body["message"].as_str().unwrap_or_default().to_string())
    }
}

fn do_chat(server: &str, username: &str, password: &str) -> anyhow::Result<()> {
    let (chat, login) = ChatClient::login(server, username, password)?;
    println!("🌿 Logged in as {}\n", login.username);
    print_transcript(&login.view);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            // EOF ends the session like /logout
            println!("{}", chat.logout()?);
            return Ok(());
        };

        match parse_command(&line?) {
            ReplCommand::Empty => {}
            ReplCommand::Prompt(p) => match chat.submit(&p) {
                Ok(turn) => {
                    if let Some(n) = &turn.notice {
                        eprintln!("⚠️  {}", n);
                    }
                    println!("{}\n", render_message(&turn.reply));
                }
                Err(e) => eprintln!("advisor-cli: {}", e),
            },
            ReplCommand::NewChat => print_transcript(&chat.action("/chat/new")?),
            ReplCommand::Clear => print_transcript(&chat.action("/chat/clear")?),
            ReplCommand::Resume => {
                let view = chat.action("/chat/resume")?;
                if view.resumed == Some(false) {
                    println!("Nothing to resume.");
                } else {
                    print_transcript(&view);
                }
            }
            ReplCommand::DeepSearch(on) => {
                let view = chat.set_deep_search(on)?;
                println!("Deep search {}", if view.deep_search { "on" } else { "off" });
            }
            ReplCommand::Export { file, category } => match chat.export(category.as_deref()) {
                Ok(csv) => {
                    std::fs::write(&file, csv)?;
                    println!("Saved recommendations to {}", file);
                }
                Err(e) => eprintln!("advisor-cli: {}", e),
            },
            ReplCommand::Logout | ReplCommand::Quit => {
                println!("{}", chat.logout()?);
                return Ok(());
            }
            ReplCommand::Unknown(cmd) => eprintln!("Unknown command: {}", cmd),
        }
    }
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let resp = client(10)?.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: Value = r.json().unwrap_or_default();
            println!("Advisor server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:        {}", body["version"].as_str().unwrap_or("?"));
            println!("SQLite:         {}", body["sqlite"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            eprintln!("advisor-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("advisor-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Register { username, password } => do_register(&server, &username, &password),
        Commands::Chat { username, password } => do_chat(&server, &username, &password),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("advisor-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(c: &str, r: &str, i: &str) -> RowView {
        RowView {
            category: c.to_string(),
            recommendation: r.to_string(),
            impact: i.to_string(),
        }
    }

    #[test]
    fn test_plain_text_is_a_prompt() {
        assert_eq!(
            parse_command("  Suggest outfits for work "),
            ReplCommand::Prompt("Suggest outfits for work".into())
        );
        assert_eq!(parse_command("   "), ReplCommand::Empty);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_command("/new"), ReplCommand::NewChat);
        assert_eq!(parse_command("/resume"), ReplCommand::Resume);
        assert_eq!(parse_command("/clear"), ReplCommand::Clear);
        assert_eq!(parse_command("/deep on"), ReplCommand::DeepSearch(true));
        assert_eq!(parse_command("/deep off"), ReplCommand::DeepSearch(false));
        assert_eq!(parse_command("/logout"), ReplCommand::Logout);
        assert_eq!(parse_command("/quit"), ReplCommand::Quit);
    }

    #[test]
    fn test_export_with_and_without_category() {
        assert_eq!(
            parse_command("/export recs.csv"),
            ReplCommand::Export {
                file: "recs.csv".into(),
                category: None
            }
        );
        assert_eq!(
            parse_command("/export recs.csv Care"),
            ReplCommand::Export {
                file: "recs.csv".into(),
                category: Some("Care".into())
            }
        );
    }

    #[test]
    fn test_malformed_commands_are_unknown() {
        assert!(matches!(parse_command("/deep maybe"), ReplCommand::Unknown(_)));
        assert!(matches!(parse_command("/export"), ReplCommand::Unknown(_)));
        assert!(matches!(parse_command("/new now"), ReplCommand::Unknown(_)));
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let table = render_table(&[
            row("Clothing", "Buy organic cotton", "High"),
            row("Care", "Wash cold", "Medium"),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|l| l.chars().count() == width));
        assert_eq!(lines[1], "| Category | Recommendation     | Impact |");
        assert_eq!(lines[3], "| Clothing | Buy organic cotton | High   |");
    }

    #[test]
    fn test_render_message_appends_table() {
        let m = MessageView {
            role: "assistant".into(),
            content: "Tips".into(),
            table: Some(vec![row("Care", "Mend", "High")]),
        };
        let out = render_message(&m);
        assert!(out.starts_with("[advisor] Tips"));
        assert!(out.contains("Sustainable Fashion Recommendations"));
        assert!(out.contains("| Care     | Mend"));
    }

    #[test]
    fn test_login_response_deserializes() {
        let body = json!({
            "token": "3f0e7a4e-0000-4000-8000-000000000000",
            "username": "aadi",
            "page": "main",
            "messages": [{ "role": "assistant", "content": "Welcome, aadi!" }],
            "deep_search": false,
            "can_resume": false,
            "has_table": false,
            "categories": ["All", "Clothing", "Shopping", "Care", "Resources"]
        });
        let parsed: LoginResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.username, "aadi");
        assert_eq!(parsed.view.messages.len(), 1);
        assert!(parsed.view.messages[0].table.is_none());
    }
}
