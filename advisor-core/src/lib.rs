pub mod auth;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod export;
pub mod llm;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod session;

pub use auth::{AuthService, AuthState, LoginOutcome, Page};
pub use config::{AdvisorConfig, StartupError};
pub use credentials::{CredentialStore, RegisterOutcome, StoreError, VerifyOutcome};
pub use error::AdvisorError;
pub use llm::{ChatBackend, CompletionError, OpenRouterClient, OpenRouterConfig};
pub use models::{ChatMessage, Message, RecommendationRow, RecommendationTable, Role};
pub use parser::{parse_reply, ParsedReply};
pub use session::{ChatSession, SessionSettings, TurnOutcome};
