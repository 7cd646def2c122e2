use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::database::RecordStore;
use crate::upload::UploadService;

/// Shared handles passed to every handler through axum `State`
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
    pub store: Arc<dyn RecordStore>,
    pub uploads: UploadService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>, uploads: UploadService) -> Self {
        let tokens = TokenService::new(
            config.security.jwt_secret.clone(),
            config.security.jwt_expiry_hours,
        );
        let passwords = PasswordHasher::new(config.security.bcrypt_cost);
        Self {
            config: Arc::new(config),
            tokens,
            passwords,
            store,
            uploads,
        }
    }
}
