use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::password::MIN_PASSWORD_LENGTH;
use crate::validation::{clean, normalize_email, ValidationError};

pub const DEFAULT_ROLE: &str = "user";

/// Login credential. The password is only ever held as a bcrypt hash.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated registration; the password is still plaintext here
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let name = clean(self.name);
        let email = clean(self.email);
        let password = self.password.filter(|p| !p.is_empty());

        let (name, email, password) = match (name, email, password) {
            (Some(n), Some(e), Some(p)) => (n, e, p),
            (n, e, p) => {
                let missing: Vec<&str> = [("name", n.is_none()), ("email", e.is_none()), ("password", p.is_none())]
                    .into_iter()
                    .filter_map(|(field, absent)| absent.then_some(field))
                    .collect();
                return Err(ValidationError::missing(&missing));
            }
        };

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::field(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }

        Ok(Registration {
            name,
            email: normalize_email("email", &email)?,
            password,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginInput {
    /// Returns the normalized email and the password
    pub fn validate(self) -> Result<(String, String), ValidationError> {
        let email = clean(self.email);
        let password = self.password.filter(|p| !p.is_empty());
        match (email, password) {
            (Some(email), Some(password)) => Ok((normalize_email("email", &email)?, password)),
            (email, password) => {
                let mut missing = Vec::new();
                if email.is_none() {
                    missing.push("email");
                }
                if password.is_none() {
                    missing.push("password");
                }
                Err(ValidationError::missing(&missing))
            }
        }
    }
}
