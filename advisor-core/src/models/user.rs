use serde::Serialize;

/// A registered account. `password_hash` is an argon2id PHC string and never
/// leaves the credential store in serialized form.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}
