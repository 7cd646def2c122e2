#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use activaciones_api::config::{AppConfig, Visibility};
use activaciones_api::database::MemoryStore;
use activaciones_api::routes;
use activaciones_api::server::upload_service;
use activaciones_api::state::AppState;
use activaciones_api::storage::MemoryStorage;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const BUCKET: &str = "activaciones-test";

/// Minimal PNG signature; enough for magic-byte sniffing
pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, 0x49, 0x48, 0x44, 0x52];

/// In-process server on a free port, backed by in-memory stores
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub storage: Arc<MemoryStorage>,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(Visibility::Public).await
    }

    pub async fn spawn_with(visibility: Visibility) -> Result<Self> {
        let mut config = AppConfig::from_vars(|key| {
            match key {
                "AWS_ACCESS_KEY_ID" => Some("test-access-key"),
                "AWS_SECRET_ACCESS_KEY" => Some("test-secret-key"),
                "AWS_REGION" => Some("us-east-1"),
                "AWS_S3_BUCKET" => Some(BUCKET),
                "JWT_SECRET" => Some(JWT_SECRET),
                "BCRYPT_COST" => Some("4"),
                _ => None,
            }
            .map(String::from)
        })
        .context("test configuration")?;
        config.storage.visibility = visibility;

        let storage = Arc::new(MemoryStorage::new(BUCKET));
        let uploads = upload_service(storage.clone(), &config);
        let state = AppState::new(config, Arc::new(MemoryStore::new()), uploads);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, routes::app(state)).await;
        });

        let server = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            storage,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register an account and return a bearer token for it
    pub async fn login_as(&self, email: &str) -> Result<String> {
        let password = "correct-horse";
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "name": "Field Agent", "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let body: Value = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?
            .json()
            .await?;
        body["token"]
            .as_str()
            .map(String::from)
            .context("login response carried no token")
    }
}

pub fn activation_body() -> Value {
    json!({
        "lugar_activacion": "Mercado Central",
        "fecha": "2024-05-01T10:30:00Z",
        "tipo": "Premium",
        "nombre": "Ana",
        "apellido": "Pérez",
        "cedula_identidad": "0102030405",
        "telefono": "0991234567",
        "correo": "ana@example.com",
        "cash_in": 25.5,
        "se_descargo_app": true
    })
}
