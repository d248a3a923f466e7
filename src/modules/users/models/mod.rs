use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Contact details needed to deliver a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserContact {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl UserContact {
    /// Name used in greetings, falling back to "User"
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "User",
        }
    }
}
