//! External User Directory collaborator.
//!
//! The directory is the system of record for user profiles and the persisted
//! presence status column. The hub actor is its sole status writer; reads
//! back the full roster for presence snapshots.
//!
//! [`InMemoryDirectory`] is the in-process implementation, optionally seeded
//! from a JSON file for development deployments.

use async_trait::async_trait;
use common::secret::SecretString;
use common::types::{PresenceStatus, PublicUser, Role, UserId};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::HubError;

/// A stored user row. Never serialized whole; [`PublicUser`] is the only
/// projection that leaves the directory.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: PresenceStatus,
    /// Held for parity with the account store; the hub never reads it.
    pub password_hash: SecretString,
}

impl UserRecord {
    fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            status: self.status,
        }
    }
}

/// User Directory contract as the hub consumes it.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up one user by id.
    async fn get_by_id(&self, id: UserId) -> Option<PublicUser>;

    /// Persist a presence status for a user. Returns the updated projection,
    /// or `None` when the id is unknown (the write is skipped).
    async fn update_status(&self, id: UserId, status: PresenceStatus) -> Option<PublicUser>;

    /// Full roster projection, ordered by id, for presence snapshots.
    async fn list_public(&self) -> Vec<PublicUser>;
}

/// In-memory directory backing store.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<UserId, UserRecord>>,
    next_id: AtomicU64,
}

/// One entry in a `HUB_SEED_USERS_PATH` file.
#[derive(Debug, Deserialize)]
struct SeedUser {
    name: String,
    email: String,
    role: Role,
    #[serde(default)]
    password_hash: String,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        InMemoryDirectory {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Insert a user with a fresh id. Initial presence is OFFLINE.
    pub async fn add_user(
        &self,
        name: &str,
        email: &str,
        role: Role,
        password_hash: SecretString,
    ) -> PublicUser {
        let id = UserId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = UserRecord {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role,
            status: PresenceStatus::Offline,
            password_hash,
        };
        let public = record.to_public();
        self.users.write().await.insert(id, record);
        public
    }

    /// Load users from a JSON seed file. Returns the number inserted.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Config`] when the file cannot be read or parsed.
    pub async fn seed_from_file(&self, path: &str) -> Result<usize, HubError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HubError::Config(format!("failed to read seed file {path}: {e}")))?;

        let seeds: Vec<SeedUser> = serde_json::from_str(&raw)
            .map_err(|e| HubError::Config(format!("failed to parse seed file {path}: {e}")))?;

        let count = seeds.len();
        for seed in seeds {
            self.add_user(
                &seed.name,
                &seed.email,
                seed.role,
                SecretString::from(seed.password_hash),
            )
            .await;
        }

        info!(
            target: "hub.directory",
            path = %path,
            count = count,
            "Seeded user directory"
        );
        Ok(count)
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn get_by_id(&self, id: UserId) -> Option<PublicUser> {
        self.users.read().await.get(&id).map(UserRecord::to_public)
    }

    async fn update_status(&self, id: UserId, status: PresenceStatus) -> Option<PublicUser> {
        let mut users = self.users.write().await;
        let record = users.get_mut(&id)?;
        record.status = status;
        Some(record.to_public())
    }

    async fn list_public(&self) -> Vec<PublicUser> {
        let users = self.users.read().await;
        let mut roster: Vec<PublicUser> = users.values().map(UserRecord::to_public).collect();
        roster.sort_by_key(|u| u.id.0);
        roster
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    async fn directory_with_two_users() -> (InMemoryDirectory, UserId, UserId) {
        let dir = InMemoryDirectory::new();
        let doctor = dir
            .add_user(
                "Dr. Chen",
                "chen@example.com",
                Role::Doctor,
                SecretString::from("hash-a"),
            )
            .await;
        let patient = dir
            .add_user(
                "Pat Patient",
                "pat@example.com",
                Role::Patient,
                SecretString::from("hash-b"),
            )
            .await;
        (dir, doctor.id, patient.id)
    }

    #[tokio::test]
    async fn test_added_users_start_offline() {
        let (dir, doctor_id, patient_id) = directory_with_two_users().await;

        let doctor = dir.get_by_id(doctor_id).await.unwrap();
        assert_eq!(doctor.status, PresenceStatus::Offline);
        assert_eq!(doctor.role, Role::Doctor);

        let patient = dir.get_by_id(patient_id).await.unwrap();
        assert_eq!(patient.status, PresenceStatus::Offline);
    }

    #[tokio::test]
    async fn test_update_status_persists() {
        let (dir, doctor_id, _) = directory_with_two_users().await;

        let updated = dir
            .update_status(doctor_id, PresenceStatus::Busy)
            .await
            .unwrap();
        assert_eq!(updated.status, PresenceStatus::Busy);

        let read_back = dir.get_by_id(doctor_id).await.unwrap();
        assert_eq!(read_back.status, PresenceStatus::Busy);
    }

    #[tokio::test]
    async fn test_update_status_unknown_id_is_skipped() {
        let (dir, _, _) = directory_with_two_users().await;
        assert!(dir
            .update_status(UserId(999), PresenceStatus::Online)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_list_public_is_ordered_by_id() {
        let (dir, doctor_id, patient_id) = directory_with_two_users().await;

        let roster = dir.list_public().await;
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].id, doctor_id);
        assert_eq!(roster[1].id, patient_id);
    }

    #[tokio::test]
    async fn test_list_public_never_includes_password_hash() {
        let (dir, _, _) = directory_with_two_users().await;

        let roster = dir.list_public().await;
        let json = serde_json::to_string(&roster).unwrap();
        assert!(!json.contains("hash-a"));
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn test_seed_from_file() {
        let dir = InMemoryDirectory::new();
        let tmp = std::env::temp_dir().join(format!("hub-seed-{}.json", std::process::id()));
        tokio::fs::write(
            &tmp,
            r#"[
                {"name": "Dr. Chen", "email": "chen@example.com", "role": "DOCTOR"},
                {"name": "Pat", "email": "pat@example.com", "role": "PATIENT"}
            ]"#,
        )
        .await
        .unwrap();

        let count = dir.seed_from_file(tmp.to_str().unwrap()).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(dir.list_public().await.len(), 2);

        tokio::fs::remove_file(&tmp).await.unwrap();
    }

    #[tokio::test]
    async fn test_seed_from_missing_file_is_config_error() {
        let dir = InMemoryDirectory::new();
        let result = dir.seed_from_file("/nonexistent/seed.json").await;
        assert!(matches!(result, Err(HubError::Config(_))));
    }
}
