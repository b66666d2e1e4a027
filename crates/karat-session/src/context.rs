use serde::{Deserialize, Serialize};
use url::Url;

/// The signed-in user's role, resolved once at session start. Endpoint
/// variant selection keys off it; nothing reads role state ad hoc afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Sales,
    Manager,
}

impl Role {
    /// Path scope of the endpoint variant this role uses.
    pub fn scope(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Manager => "manager",
        }
    }
}

/// Explicit per-session context threaded into every component that needs
/// role-gated behavior.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub role: Role,
    pub base_url: Url,
}

impl SessionContext {
    pub fn new(role: Role, base_url: Url) -> Self {
        Self { role, base_url }
    }

    /// Builds a role-scoped endpoint URL under the API base.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url
            .join(&format!("api/{}/{}", self.role.scope(), path))
    }
}
