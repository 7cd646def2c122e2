use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{clean, normalize_email, ValidationError};

pub const GENDERS: [&str; 3] = ["Masculino", "Femenino", "Otro"];

/// Health-metrics profile
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub heart_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub oxygen: Option<f64>,
    pub heart_rate_min: Option<f64>,
    pub heart_rate_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub oxygen_min: Option<f64>,
    pub oxygen_max: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metric readings and alert bounds, all optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub heart_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub oxygen: Option<f64>,
    pub heart_rate_min: Option<f64>,
    pub heart_rate_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub oxygen_min: Option<f64>,
    pub oxygen_max: Option<f64>,
}

/// Request body for POST and PUT /users
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub metrics: Metrics,
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub metrics: Metrics,
}

impl UserInput {
    pub fn into_new_user(self) -> Result<NewUser, ValidationError> {
        let name = clean(self.name);
        let gender = clean(self.gender);
        let email = clean(self.email);
        let phone = clean(self.phone);

        let missing: Vec<&str> = [
            ("name", name.is_none()),
            ("age", self.age.is_none()),
            ("gender", gender.is_none()),
            ("email", email.is_none()),
            ("phone", phone.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();
        if !missing.is_empty() {
            return Err(ValidationError::missing(&missing));
        }

        let changes = UserChanges {
            name,
            age: self.age,
            gender,
            email,
            phone,
            metrics: self.metrics,
        }
        .validated()?;

        match changes {
            UserChanges {
                name: Some(name),
                age: Some(age),
                gender: Some(gender),
                email: Some(email),
                phone: Some(phone),
                metrics,
            } => Ok(NewUser {
                name,
                age,
                gender,
                email,
                phone,
                metrics,
            }),
            _ => Err(ValidationError::missing(&["name", "age", "gender", "email", "phone"])),
        }
    }

    pub fn into_changes(self) -> Result<UserChanges, ValidationError> {
        UserChanges {
            name: clean(self.name),
            age: self.age,
            gender: clean(self.gender),
            email: clean(self.email),
            phone: clean(self.phone),
            metrics: self.metrics,
        }
        .validated()
    }
}

impl UserChanges {
    fn validated(mut self) -> Result<Self, ValidationError> {
        if let Some(age) = self.age {
            if !(0..=150).contains(&age) {
                return Err(ValidationError::field("age", "Age must be between 0 and 150"));
            }
        }
        if let Some(gender) = &self.gender {
            if !GENDERS.contains(&gender.as_str()) {
                return Err(ValidationError::field(
                    "gender",
                    format!("Gender must be one of: {}", GENDERS.join(", ")),
                ));
            }
        }
        if let Some(email) = &self.email {
            self.email = Some(normalize_email("email", email)?);
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.metrics == Metrics::default()
    }
}
