#![allow(dead_code)]

pub mod stall;

use std::sync::Arc;

use uuid::Uuid;

use warden_auth::{JwtDecoder, JwtEncoder, PasswordHasher, SessionManager};
use warden_core::config::AuthConfig;
use warden_database::{IdentityStore, MemoryIdentityStore};
use warden_entity::{NewRole, NewUser, User, UserStatus};

pub const EMAIL: &str = "a@x.com";
pub const PASSWORD: &str = "P@ssw0rd1";

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..AuthConfig::default()
    }
}

pub struct Harness {
    pub store: MemoryIdentityStore,
    pub sessions: SessionManager,
    pub hasher: PasswordHasher,
    pub decoder: JwtDecoder,
}

impl Harness {
    pub fn new() -> Self {
        let config = auth_config();
        let store = MemoryIdentityStore::seeded();
        let hasher = PasswordHasher::new(&config).unwrap();
        let sessions = SessionManager::new(
            Arc::new(store.clone()),
            Arc::new(JwtEncoder::new(&config)),
            Arc::new(hasher.clone()),
            &config,
        );
        Self {
            store,
            sessions,
            hasher,
            decoder: JwtDecoder::new(&config),
        }
    }

    /// A session manager with the harness configuration over another store.
    pub fn sessions_over(&self, store: Arc<dyn IdentityStore>) -> SessionManager {
        let config = auth_config();
        SessionManager::new(
            store,
            Arc::new(JwtEncoder::new(&config)),
            Arc::new(self.hasher.clone()),
            &config,
        )
    }

    /// Create a role named `name` granting `resource:action` codes.
    pub async fn role(&self, name: &str, codes: &[&str]) -> Uuid {
        let mut permission_ids = Vec::new();
        for code in codes {
            let (resource, action) = code.split_once(':').unwrap();
            permission_ids.push(self.store.insert_permission(resource, action).await.id);
        }
        let mut tx = self.store.begin().await.unwrap();
        let role = tx
            .insert_role(&NewRole {
                name: name.to_string(),
                description: String::new(),
                is_system: false,
            })
            .await
            .unwrap();
        tx.replace_role_permissions(role.id, &permission_ids)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        role.id
    }

    pub async fn user(&self, email: &str, password: &str, role_ids: &[Uuid]) -> User {
        let mut tx = self.store.begin().await.unwrap();
        let user = tx
            .insert_user(&NewUser {
                email: email.to_string(),
                password_hash: self.hasher.hash_password(password).unwrap(),
                full_name: "Test User".to_string(),
                status: UserStatus::Active,
            })
            .await
            .unwrap();
        tx.replace_user_roles(user.id, role_ids).await.unwrap();
        tx.commit().await.unwrap();
        user
    }

    pub async fn set_status(&self, user_id: Uuid, status: UserStatus) {
        let mut tx = self.store.begin().await.unwrap();
        tx.update_user_status(user_id, status).await.unwrap();
        tx.commit().await.unwrap();
    }

    pub async fn owner_role_id(&self) -> Uuid {
        let mut tx = self.store.begin().await.unwrap();
        tx.find_role_by_name_for_update("owner")
            .await
            .unwrap()
            .unwrap()
            .id
    }
}
