// ============================
// crates/backend-lib/src/storage/mod.rs
// ============================
//! Storage abstraction with flat-file and in-memory backends.
//!
//! Both backends share [`TableStorage`], so they answer every query the same
//! way; they differ only in whether writes reach the disk.
mod flat_file;
mod memory;
mod tables;

use std::sync::Arc;

use async_trait::async_trait;
use matchday_common::{
    Comment, Confirmation, Friendship, Match, MatchFinance, MatchId, MatchInvitation,
    Notification, Post, Rating, Statistics, User, UserId, UserPayment,
};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageSettings};
use crate::error::AppError;
use crate::metrics;

pub use flat_file::{FlatFileStorage, JsonDirectory};
pub use memory::{MemoryStorage, Volatile};
pub use tables::{Collection, Tables};

/// Trait for storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Human-readable backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Check that the backend can still accept writes
    async fn check_writable(&self) -> Result<(), AppError>;

    async fn insert_user(&self, user: User) -> Result<User, AppError>;
    async fn get_user(&self, id: UserId) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_user(&self, user: User) -> Result<User, AppError>;

    /// Fails with `Conflict` when the invite code or link is taken
    async fn insert_match(&self, m: Match) -> Result<Match, AppError>;
    async fn get_match(&self, id: MatchId) -> Result<Option<Match>, AppError>;
    async fn find_match_by_code(&self, code: &str) -> Result<Option<Match>, AppError>;
    /// Matches ordered by date, latest first
    async fn list_matches(&self) -> Result<Vec<Match>, AppError>;
    async fn list_matches_created_by(&self, user_id: UserId) -> Result<Vec<Match>, AppError>;
    async fn update_match(&self, m: Match) -> Result<Match, AppError>;
    /// Remove a match and every row that belongs to it
    async fn delete_match(&self, id: MatchId) -> Result<Match, AppError>;

    async fn get_confirmation(
        &self,
        user_id: UserId,
        match_id: MatchId,
    ) -> Result<Option<Confirmation>, AppError>;
    /// At most one row exists per (user, match)
    async fn upsert_confirmation(&self, confirmation: Confirmation)
        -> Result<Confirmation, AppError>;
    async fn list_confirmations_by_match(
        &self,
        match_id: MatchId,
    ) -> Result<Vec<Confirmation>, AppError>;
    async fn list_confirmations_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Confirmation>, AppError>;

    async fn insert_statistics(&self, stats: Statistics) -> Result<Statistics, AppError>;
    async fn get_statistics(&self, id: Uuid) -> Result<Option<Statistics>, AppError>;
    async fn update_statistics(&self, stats: Statistics) -> Result<Statistics, AppError>;
    async fn list_statistics_by_match(&self, match_id: MatchId)
        -> Result<Vec<Statistics>, AppError>;
    async fn list_statistics_by_user(&self, user_id: UserId) -> Result<Vec<Statistics>, AppError>;

    async fn insert_rating(&self, rating: Rating) -> Result<Rating, AppError>;
    async fn list_ratings_for_player(&self, player_id: UserId) -> Result<Vec<Rating>, AppError>;

    async fn insert_post(&self, post: Post) -> Result<Post, AppError>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, AppError>;
    /// Posts newest first
    async fn list_posts(&self, match_id: Option<MatchId>) -> Result<Vec<Post>, AppError>;
    async fn toggle_like(&self, post_id: Uuid, user_id: UserId) -> Result<Post, AppError>;
    async fn insert_comment(&self, comment: Comment) -> Result<Comment, AppError>;
    /// Comments newest first
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError>;

    async fn insert_friendship(&self, friendship: Friendship) -> Result<Friendship, AppError>;
    async fn get_friendship(&self, id: Uuid) -> Result<Option<Friendship>, AppError>;
    async fn update_friendship(&self, friendship: Friendship) -> Result<Friendship, AppError>;
    async fn list_friendships(&self, user_id: UserId) -> Result<Vec<Friendship>, AppError>;

    async fn insert_invitation(
        &self,
        invitation: MatchInvitation,
    ) -> Result<MatchInvitation, AppError>;
    async fn get_invitation(&self, id: Uuid) -> Result<Option<MatchInvitation>, AppError>;
    async fn update_invitation(
        &self,
        invitation: MatchInvitation,
    ) -> Result<MatchInvitation, AppError>;
    async fn list_invitations_by_match(
        &self,
        match_id: MatchId,
    ) -> Result<Vec<MatchInvitation>, AppError>;

    async fn insert_finance(&self, line: MatchFinance) -> Result<MatchFinance, AppError>;
    async fn list_finances_by_match(&self, match_id: MatchId)
        -> Result<Vec<MatchFinance>, AppError>;
    async fn insert_payment(&self, payment: UserPayment) -> Result<UserPayment, AppError>;
    async fn get_payment(&self, id: Uuid) -> Result<Option<UserPayment>, AppError>;
    async fn update_payment(&self, payment: UserPayment) -> Result<UserPayment, AppError>;
    async fn list_payments_by_user(&self, user_id: UserId) -> Result<Vec<UserPayment>, AppError>;
    async fn list_payments_by_match(&self, match_id: MatchId)
        -> Result<Vec<UserPayment>, AppError>;

    async fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, AppError>;
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>, AppError>;
    async fn mark_notification_read(&self, id: Uuid) -> Result<Notification, AppError>;
    /// Notifications newest first
    async fn list_notifications(&self, user_id: UserId) -> Result<Vec<Notification>, AppError>;
}

/// Where serialized collections go after a successful write
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Whether writes need serialized snapshots at all
    const DURABLE: bool;
    const NAME: &'static str;

    async fn persist(&self, dirty: Vec<(Collection, String)>) -> Result<(), AppError>;
    async fn check_writable(&self) -> Result<(), AppError>;
}

/// [`Tables`] behind a lock, with writes forwarded to a [`Persistence`]
pub struct TableStorage<P> {
    tables: RwLock<Tables>,
    // serializes mutate-then-persist so snapshots land in order
    write_lock: tokio::sync::Mutex<()>,
    persistence: P,
}

impl<P: Persistence> TableStorage<P> {
    pub fn with_tables(tables: Tables, persistence: P) -> Self {
        Self {
            tables: RwLock::new(tables),
            write_lock: tokio::sync::Mutex::new(()),
            persistence,
        }
    }

    fn read<T>(&self, op: impl FnOnce(&Tables) -> T) -> T {
        op(&self.tables.read())
    }

    async fn write<T>(
        &self,
        touched: &[Collection],
        op: impl FnOnce(&mut Tables) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let _guard = self.write_lock.lock().await;
        if !P::DURABLE {
            return op(&mut self.tables.write());
        }

        // stage on a copy; readers keep the committed tables until the
        // snapshot is on disk
        let mut staged = self.tables.read().clone();
        let value = op(&mut staged)?;
        let dirty = touched
            .iter()
            .map(|collection| Ok((*collection, staged.to_json(*collection)?)))
            .collect::<Result<Vec<_>, AppError>>()?;
        self.persistence.persist(dirty).await?;
        *self.tables.write() = staged;
        Ok(value)
    }
}

#[async_trait]
impl<P: Persistence> Storage for TableStorage<P> {
    fn backend_name(&self) -> &'static str {
        P::NAME
    }

    async fn check_writable(&self) -> Result<(), AppError> {
        self.persistence.check_writable().await
    }

    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        self.write(&[Collection::Users], |t| t.insert_user(user)).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.read(|t| t.get_user(id)))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.read(|t| t.find_user_by_email(email)))
    }

    async fn update_user(&self, user: User) -> Result<User, AppError> {
        self.write(&[Collection::Users], |t| t.update_user(user)).await
    }

    async fn insert_match(&self, m: Match) -> Result<Match, AppError> {
        self.write(&[Collection::Matches], |t| t.insert_match(m)).await
    }

    async fn get_match(&self, id: MatchId) -> Result<Option<Match>, AppError> {
        Ok(self.read(|t| t.get_match(id)))
    }

    async fn find_match_by_code(&self, code: &str) -> Result<Option<Match>, AppError> {
        Ok(self.read(|t| t.find_match_by_code(code)))
    }

    async fn list_matches(&self) -> Result<Vec<Match>, AppError> {
        Ok(self.read(Tables::list_matches))
    }

    async fn list_matches_created_by(&self, user_id: UserId) -> Result<Vec<Match>, AppError> {
        Ok(self.read(|t| t.list_matches_created_by(user_id)))
    }

    async fn update_match(&self, m: Match) -> Result<Match, AppError> {
        self.write(&[Collection::Matches], |t| t.update_match(m)).await
    }

    async fn delete_match(&self, id: MatchId) -> Result<Match, AppError> {
        self.write(
            &[
                Collection::Matches,
                Collection::Confirmations,
                Collection::Statistics,
                Collection::Ratings,
                Collection::Invitations,
                Collection::Finances,
                Collection::Payments,
                Collection::Posts,
            ],
            |t| t.delete_match(id),
        )
        .await
    }

    async fn get_confirmation(
        &self,
        user_id: UserId,
        match_id: MatchId,
    ) -> Result<Option<Confirmation>, AppError> {
        Ok(self.read(|t| t.get_confirmation(user_id, match_id)))
    }

    async fn upsert_confirmation(
        &self,
        confirmation: Confirmation,
    ) -> Result<Confirmation, AppError> {
        self.write(&[Collection::Confirmations], |t| {
            Ok(t.upsert_confirmation(confirmation))
        })
        .await
    }

    async fn list_confirmations_by_match(
        &self,
        match_id: MatchId,
    ) -> Result<Vec<Confirmation>, AppError> {
        Ok(self.read(|t| t.list_confirmations_by_match(match_id)))
    }

    async fn list_confirmations_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Confirmation>, AppError> {
        Ok(self.read(|t| t.list_confirmations_by_user(user_id)))
    }

    async fn insert_statistics(&self, stats: Statistics) -> Result<Statistics, AppError> {
        self.write(&[Collection::Statistics], |t| Ok(t.insert_statistics(stats)))
            .await
    }

    async fn get_statistics(&self, id: Uuid) -> Result<Option<Statistics>, AppError> {
        Ok(self.read(|t| t.get_statistics(id)))
    }

    async fn update_statistics(&self, stats: Statistics) -> Result<Statistics, AppError> {
        self.write(&[Collection::Statistics], |t| t.update_statistics(stats))
            .await
    }

    async fn list_statistics_by_match(
        &self,
        match_id: MatchId,
    ) -> Result<Vec<Statistics>, AppError> {
        Ok(self.read(|t| t.list_statistics_by_match(match_id)))
    }

    async fn list_statistics_by_user(&self, user_id: UserId) -> Result<Vec<Statistics>, AppError> {
        Ok(self.read(|t| t.list_statistics_by_user(user_id)))
    }

    async fn insert_rating(&self, rating: Rating) -> Result<Rating, AppError> {
        self.write(&[Collection::Ratings], |t| Ok(t.insert_rating(rating)))
            .await
    }

    async fn list_ratings_for_player(&self, player_id: UserId) -> Result<Vec<Rating>, AppError> {
        Ok(self.read(|t| t.list_ratings_for_player(player_id)))
    }

    async fn insert_post(&self, post: Post) -> Result<Post, AppError> {
        self.write(&[Collection::Posts], |t| Ok(t.insert_post(post))).await
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        Ok(self.read(|t| t.get_post(id)))
    }

    async fn list_posts(&self, match_id: Option<MatchId>) -> Result<Vec<Post>, AppError> {
        Ok(self.read(|t| t.list_posts(match_id)))
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: UserId) -> Result<Post, AppError> {
        self.write(&[Collection::Posts], |t| t.toggle_like(post_id, user_id))
            .await
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, AppError> {
        self.write(&[Collection::Comments], |t| Ok(t.insert_comment(comment)))
            .await
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError> {
        Ok(self.read(|t| t.list_comments(post_id)))
    }

    async fn insert_friendship(&self, friendship: Friendship) -> Result<Friendship, AppError> {
        self.write(&[Collection::Friendships], |t| {
            Ok(t.insert_friendship(friendship))
        })
        .await
    }

    async fn get_friendship(&self, id: Uuid) -> Result<Option<Friendship>, AppError> {
        Ok(self.read(|t| t.get_friendship(id)))
    }

    async fn update_friendship(&self, friendship: Friendship) -> Result<Friendship, AppError> {
        self.write(&[Collection::Friendships], |t| {
            t.update_friendship(friendship)
        })
        .await
    }

    async fn list_friendships(&self, user_id: UserId) -> Result<Vec<Friendship>, AppError> {
        Ok(self.read(|t| t.list_friendships(user_id)))
    }

    async fn insert_invitation(
        &self,
        invitation: MatchInvitation,
    ) -> Result<MatchInvitation, AppError> {
        self.write(&[Collection::Invitations], |t| {
            Ok(t.insert_invitation(invitation))
        })
        .await
    }

    async fn get_invitation(&self, id: Uuid) -> Result<Option<MatchInvitation>, AppError> {
        Ok(self.read(|t| t.get_invitation(id)))
    }

    async fn update_invitation(
        &self,
        invitation: MatchInvitation,
    ) -> Result<MatchInvitation, AppError> {
        self.write(&[Collection::Invitations], |t| {
            t.update_invitation(invitation)
        })
        .await
    }

    async fn list_invitations_by_match(
        &self,
        match_id: MatchId,
    ) -> Result<Vec<MatchInvitation>, AppError> {
        Ok(self.read(|t| t.list_invitations_by_match(match_id)))
    }

    async fn insert_finance(&self, line: MatchFinance) -> Result<MatchFinance, AppError> {
        self.write(&[Collection::Finances], |t| Ok(t.insert_finance(line)))
            .await
    }

    async fn list_finances_by_match(
        &self,
        match_id: MatchId,
    ) -> Result<Vec<MatchFinance>, AppError> {
        Ok(self.read(|t| t.list_finances_by_match(match_id)))
    }

    async fn insert_payment(&self, payment: UserPayment) -> Result<UserPayment, AppError> {
        self.write(&[Collection::Payments], |t| Ok(t.insert_payment(payment)))
            .await
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<UserPayment>, AppError> {
        Ok(self.read(|t| t.get_payment(id)))
    }

    async fn update_payment(&self, payment: UserPayment) -> Result<UserPayment, AppError> {
        self.write(&[Collection::Payments], |t| t.update_payment(payment))
            .await
    }

    async fn list_payments_by_user(&self, user_id: UserId) -> Result<Vec<UserPayment>, AppError> {
        Ok(self.read(|t| t.list_payments_by_user(user_id)))
    }

    async fn list_payments_by_match(
        &self,
        match_id: MatchId,
    ) -> Result<Vec<UserPayment>, AppError> {
        Ok(self.read(|t| t.list_payments_by_match(match_id)))
    }

    async fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, AppError> {
        self.write(&[Collection::Notifications], |t| {
            Ok(t.insert_notification(notification))
        })
        .await
    }

    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>, AppError> {
        Ok(self.read(|t| t.get_notification(id)))
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<Notification, AppError> {
        self.write(&[Collection::Notifications], |t| {
            t.mark_notification_read(id)
        })
        .await
    }

    async fn list_notifications(&self, user_id: UserId) -> Result<Vec<Notification>, AppError> {
        Ok(self.read(|t| t.list_notifications(user_id)))
    }
}

/// Pick the storage backend once at startup.
///
/// A flat-file backend that cannot load its data or fails the write check is
/// replaced by the in-memory backend; the substitution is logged and counted.
pub async fn open_storage(settings: &StorageSettings) -> Arc<dyn Storage> {
    match settings.backend {
        StorageBackend::Memory => {
            tracing::info!(backend = "memory", "storage backend selected");
            Arc::new(MemoryStorage::new())
        },
        StorageBackend::FlatFile => match open_flat_file(settings).await {
            Ok(storage) => {
                tracing::info!(
                    backend = "flat_file",
                    path = %settings.path.display(),
                    "storage backend selected"
                );
                Arc::new(storage)
            },
            Err(e) => {
                ::metrics::counter!(metrics::STORAGE_FALLBACK).increment(1);
                tracing::warn!(
                    path = %settings.path.display(),
                    error = %e,
                    "flat-file storage unavailable, falling back to memory"
                );
                Arc::new(MemoryStorage::new())
            },
        },
    }
}

async fn open_flat_file(settings: &StorageSettings) -> Result<FlatFileStorage, AppError> {
    let storage = FlatFileStorage::open(&settings.path).await?;
    storage.check_writable().await?;
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use matchday_common::{Plan, Role};

    /// Durable persistence whose disk is always full
    struct FullDisk;

    #[async_trait]
    impl Persistence for FullDisk {
        const DURABLE: bool = true;
        const NAME: &'static str = "full_disk";

        async fn persist(&self, _dirty: Vec<(Collection, String)>) -> Result<(), AppError> {
            Err(AppError::Io(std::io::Error::other("no space left on device")))
        }

        async fn check_writable(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Keeper".to_string(),
            email: email.to_string(),
            credential_hash: String::new(),
            role: Role::Player,
            plan: Plan::Free,
            position: None,
            photo_url: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_tables_untouched() {
        let storage = TableStorage::with_tables(Tables::default(), FullDisk);
        let rejected = user("keeper@example.com");

        let err = storage.insert_user(rejected.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert!(storage.get_user(rejected.id).await.unwrap().is_none());
        assert!(storage
            .find_user_by_email("keeper@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_volatile_writes_apply_in_place() {
        let storage = MemoryStorage::new();
        let kept = storage.insert_user(user("striker@example.com")).await.unwrap();
        assert_eq!(storage.get_user(kept.id).await.unwrap(), Some(kept));
    }
}
