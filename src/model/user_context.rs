use serde::{Deserialize, Serialize};

/// Caller identity taken from request headers, recorded as `updatedBy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub user_name: Option<String>,
}

impl UserContext {
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            user_name: None,
        }
    }

    pub fn with_name(user_id: String, name: Option<String>) -> Self {
        Self {
            user_id,
            user_name: name,
        }
    }

    /// Identity used for seeding and other startup writes
    pub fn system() -> Self {
        Self {
            user_id: "system".to_string(),
            user_name: Some("System".to_string()),
        }
    }

    /// Fallback when no identity headers are present
    pub fn default_user() -> Self {
        Self {
            user_id: "dev-user".to_string(),
            user_name: Some("Development User".to_string()),
        }
    }

    /// Name written to `updatedBy`: the display name when given, else the id.
    pub fn audit_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(&self.user_id)
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::default_user()
    }
}
