//! Account model: roles, the whoami profile, wallet and auth payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of the marketplace a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Posts jobs.
    Client,
    /// Looks for and applies to jobs.
    Applicant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Client => "client",
            Self::Applicant => "applicant",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "applicant" => Ok(Self::Applicant),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

/// A review left for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, rename = "reviewer__username")]
    pub reviewer: Option<String>,
    pub rating: Decimal,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// The current user as returned by `whoami`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    /// Display-only; the server owns the balance.
    #[serde(default)]
    pub wallet_balance: Decimal,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub badges: Vec<serde_json::Value>,
    #[serde(default)]
    pub user_reviews: Vec<Review>,
}

impl Profile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Wallet balance response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub balance: Decimal,
}

/// Sign-up payload, in the server's field names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

/// Sign-in payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Sign-in response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user_id: i64,
}
