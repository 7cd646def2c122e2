use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Account, Activation, NewAccount, NewActivation, NewUser, User, UserChanges};

/// Health-metrics user collection
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Newest first
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    async fn get_user(&self, id: Uuid) -> Result<User, DatabaseError>;

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<User, DatabaseError>;

    async fn delete_user(&self, id: Uuid) -> Result<(), DatabaseError>;
}

/// Login credentials
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_account(&self, account: NewAccount) -> Result<Account, DatabaseError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError>;
}

/// Activation records, always scoped to the owning account
#[async_trait]
pub trait ActivationStore: Send + Sync {
    /// Fails with `Conflict` on a duplicate (cedula_identidad, fecha, lugar_activacion)
    async fn create_activation(&self, activation: NewActivation) -> Result<Activation, DatabaseError>;

    async fn list_activations(&self, usuario_id: Uuid) -> Result<Vec<Activation>, DatabaseError>;

    async fn get_activation(&self, usuario_id: Uuid, id: Uuid) -> Result<Activation, DatabaseError>;
}

/// Everything the HTTP layer needs from persistence
#[async_trait]
pub trait RecordStore: UserStore + AccountStore + ActivationStore {
    async fn ping(&self) -> Result<(), DatabaseError>;
}
