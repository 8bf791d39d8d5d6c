use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Central administrator: manages periods and reviews every branch.
    AdminPusat,
    /// Branch administrator: bound to exactly one pondok.
    AdminPondok,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::AdminPusat => "admin_pusat",
            Role::AdminPondok => "admin_pondok",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin_pusat" => Ok(Role::AdminPusat),
            "admin_pondok" => Ok(Role::AdminPondok),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

/// Internal user row for authentication; includes the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub pondok_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Result<Role, String> {
        self.role.parse()
    }
}

/// Safe version for API responses, without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserDisplay {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub pondok_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDisplay {
    fn from(u: User) -> Self {
        UserDisplay {
            id: u.id,
            email: u.email,
            name: u.name,
            phone: u.phone,
            role: u.role,
            pondok_id: u.pondok_id,
            created_at: u.created_at,
        }
    }
}

/// New user data for creation. `password_hash` is already hashed.
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub pondok_id: Option<i64>,
}
