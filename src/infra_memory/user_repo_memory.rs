use super::db::{MemoryDb, downcast};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryUserRepo {
    db: MemoryDb,
}

impl MemoryUserRepo {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, record: &UserRecord) -> Result<(), AuthError> {
        let mut tables = self.db.lock().await;

        let taken = tables
            .users
            .values()
            .any(|u| u.profile.username == record.profile.username);
        if taken || tables.users.contains_key(&record.profile.user_id) {
            return Err(AuthError::UserExists);
        }

        tables
            .users
            .insert(record.profile.user_id, record.clone());
        Ok(())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        let tables = self.db.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.profile.username == username)
            .cloned())
    }

    async fn get_password_hash_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<Option<String>, AuthError> {
        let tx = downcast(tx).map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(tx
            .tables()
            .users
            .get(&user_id)
            .map(|u| u.password_hash.clone()))
    }

    async fn update_password_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let tx = downcast(tx).map_err(|e| AuthError::Store(e.to_string()))?;
        if let Some(user) = tx.tables().users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn get_username(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        let tables = self.db.lock().await;
        Ok(tables
            .users
            .get(&user_id)
            .map(|u| u.profile.username.clone()))
    }

    async fn get_id_by_username(&self, username: &str) -> Result<Option<UserId>, AuthError> {
        let tables = self.db.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.profile.username == username)
            .map(|u| u.profile.user_id))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.get_id_by_username(username).await?.is_some())
    }

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError> {
        Ok(self.db.lock().await.users.contains_key(&user_id))
    }

    async fn search_by_prefix(
        &self,
        prefix: &str,
        limit: u32,
    ) -> Result<Vec<UserProfile>, AuthError> {
        let tables = self.db.lock().await;

        let mut found: Vec<UserProfile> = tables
            .users
            .values()
            .filter(|u| u.profile.username.starts_with(prefix))
            .map(|u| u.profile.clone())
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found.truncate(limit as usize);

        Ok(found)
    }
}
