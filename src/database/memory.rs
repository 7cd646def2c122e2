use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Account, Activation, NewAccount, NewActivation, NewUser, User, UserChanges};
use super::store::{AccountStore, ActivationStore, RecordStore, UserStore};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    accounts: HashMap<Uuid, Account>,
    activations: HashMap<Uuid, Activation>,
}

/// Process-local record store with the same uniqueness rules as the
/// PostgreSQL schema. Backs the integration tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, F>(mut rows: Vec<T>, created: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    rows.sort_by(|a, b| created(b).cmp(&created(a)));
    rows
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let m = user.metrics;
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            age: user.age,
            gender: user.gender,
            email: user.email,
            phone: user.phone,
            heart_rate: m.heart_rate,
            temperature: m.temperature,
            oxygen: m.oxygen,
            heart_rate_min: m.heart_rate_min,
            heart_rate_max: m.heart_rate_max,
            temperature_min: m.temperature_min,
            temperature_max: m.temperature_max,
            oxygen_min: m.oxygen_min,
            oxygen_max: m.oxygen_max,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        let users = tables.users.values().cloned().collect();
        Ok(newest_first(users, |u| u.created_at))
    }

    async fn get_user(&self, id: Uuid) -> Result<User, DatabaseError> {
        self.tables
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(DatabaseError::NotFound("User not found".to_string()));
        }
        if let Some(email) = &changes.email {
            if tables.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(DatabaseError::Conflict(
                    "A user with this email already exists".to_string(),
                ));
            }
        }

        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;
        let m = changes.metrics;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(age) = changes.age {
            user.age = age;
        }
        if let Some(gender) = changes.gender {
            user.gender = gender;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        user.heart_rate = m.heart_rate.or(user.heart_rate);
        user.temperature = m.temperature.or(user.temperature);
        user.oxygen = m.oxygen.or(user.oxygen);
        user.heart_rate_min = m.heart_rate_min.or(user.heart_rate_min);
        user.heart_rate_max = m.heart_rate_max.or(user.heart_rate_max);
        user.temperature_min = m.temperature_min.or(user.temperature_min);
        user.temperature_max = m.temperature_max.or(user.temperature_max);
        user.oxygen_min = m.oxygen_min.or(user.oxygen_min);
        user.oxygen_max = m.oxygen_max.or(user.oxygen_max);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.tables
            .write()
            .await
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(DatabaseError::Conflict(
                "The account is already registered".to_string(),
            ));
        }

        let record = Account {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            role: account.role,
            created_at: Utc::now(),
        };
        tables.accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }
}

#[async_trait]
impl ActivationStore for MemoryStore {
    async fn create_activation(&self, a: NewActivation) -> Result<Activation, DatabaseError> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.activations.values().any(|existing| {
            existing.cedula_identidad == a.cedula_identidad
                && existing.fecha == a.fecha
                && existing.lugar_activacion == a.lugar_activacion
        });
        if duplicate {
            return Err(DatabaseError::Conflict(
                "The activation already exists".to_string(),
            ));
        }

        let record = Activation {
            id: Uuid::new_v4(),
            usuario_id: a.usuario_id,
            lugar_activacion: a.lugar_activacion,
            fecha: a.fecha,
            se_descargo_app: a.se_descargo_app,
            registro: a.registro,
            cash_in: a.cash_in,
            cash_out: a.cash_out,
            p2p: a.p2p,
            qr_fisico: a.qr_fisico,
            respaldo: a.respaldo,
            hubo_error: a.hubo_error,
            tipo: a.tipo,
            nombre: a.nombre,
            apellido: a.apellido,
            cedula_identidad: a.cedula_identidad,
            telefono: a.telefono,
            correo: a.correo,
            fotos: Json(a.fotos),
            tipo_error: a.tipo_error,
            clasificacion_comercio: a.clasificacion_comercio,
            created_at: Utc::now(),
        };
        tables.activations.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_activations(&self, usuario_id: Uuid) -> Result<Vec<Activation>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = tables
            .activations
            .values()
            .filter(|a| a.usuario_id == usuario_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |a| a.created_at))
    }

    async fn get_activation(&self, usuario_id: Uuid, id: Uuid) -> Result<Activation, DatabaseError> {
        let tables = self.tables.read().await;
        tables
            .activations
            .get(&id)
            .filter(|a| a.usuario_id == usuario_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("Activation not found".to_string()))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
