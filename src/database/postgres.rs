use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{Account, Activation, NewAccount, NewActivation, NewUser, User, UserChanges};
use super::store::{AccountStore, ActivationStore, RecordStore, UserStore};

/// PostgreSQL-backed record store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let m = user.metrics;
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, name, age, gender, email, phone,
                heart_rate, temperature, oxygen,
                heart_rate_min, heart_rate_max,
                temperature_min, temperature_max,
                oxygen_min, oxygen_max
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(user.age)
        .bind(&user.gender)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(m.heart_rate)
        .bind(m.temperature)
        .bind(m.oxygen)
        .bind(m.heart_rate_min)
        .bind(m.heart_rate_max)
        .bind(m.temperature_min)
        .bind(m.temperature_max)
        .bind(m.oxygen_min)
        .bind(m.oxygen_max)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "A user with this email already exists"))
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<User, DatabaseError> {
        let m = changes.metrics;
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                age = COALESCE($3, age),
                gender = COALESCE($4, gender),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                heart_rate = COALESCE($7, heart_rate),
                temperature = COALESCE($8, temperature),
                oxygen = COALESCE($9, oxygen),
                heart_rate_min = COALESCE($10, heart_rate_min),
                heart_rate_max = COALESCE($11, heart_rate_max),
                temperature_min = COALESCE($12, temperature_min),
                temperature_max = COALESCE($13, temperature_max),
                oxygen_min = COALESCE($14, oxygen_min),
                oxygen_max = COALESCE($15, oxygen_max),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.age)
        .bind(changes.gender)
        .bind(changes.email)
        .bind(changes.phone)
        .bind(m.heart_rate)
        .bind(m.temperature)
        .bind(m.oxygen)
        .bind(m.heart_rate_min)
        .bind(m.heart_rate_max)
        .bind(m.temperature_min)
        .bind(m.temperature_max)
        .bind(m.oxygen_min)
        .bind(m.oxygen_max)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "A user with this email already exists"))?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account, DatabaseError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "The account is already registered"))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }
}

#[async_trait]
impl ActivationStore for PgStore {
    async fn create_activation(&self, a: NewActivation) -> Result<Activation, DatabaseError> {
        sqlx::query_as::<_, Activation>(
            r#"
            INSERT INTO activaciones (
                id, usuario_id, lugar_activacion, fecha, se_descargo_app, registro,
                cash_in, cash_out, p2p, qr_fisico, respaldo, hubo_error, tipo,
                nombre, apellido, cedula_identidad, telefono, correo, fotos,
                tipo_error, clasificacion_comercio
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(a.usuario_id)
        .bind(&a.lugar_activacion)
        .bind(a.fecha)
        .bind(a.se_descargo_app)
        .bind(a.registro)
        .bind(a.cash_in)
        .bind(a.cash_out)
        .bind(a.p2p)
        .bind(a.qr_fisico)
        .bind(a.respaldo)
        .bind(a.hubo_error)
        .bind(&a.tipo)
        .bind(&a.nombre)
        .bind(&a.apellido)
        .bind(&a.cedula_identidad)
        .bind(&a.telefono)
        .bind(&a.correo)
        .bind(Json(&a.fotos))
        .bind(&a.tipo_error)
        .bind(&a.clasificacion_comercio)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "The activation already exists"))
    }

    async fn list_activations(&self, usuario_id: Uuid) -> Result<Vec<Activation>, DatabaseError> {
        let rows = sqlx::query_as::<_, Activation>(
            "SELECT * FROM activaciones WHERE usuario_id = $1 ORDER BY created_at DESC",
        )
        .bind(usuario_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_activation(&self, usuario_id: Uuid, id: Uuid) -> Result<Activation, DatabaseError> {
        sqlx::query_as::<_, Activation>(
            "SELECT * FROM activaciones WHERE id = $1 AND usuario_id = $2",
        )
        .bind(id)
        .bind(usuario_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Activation not found".to_string()))
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::server_time(&self.pool).await.map(|_| ())
    }
}
