// ============================
// crates/backend-lib/src/notifications.rs
// ============================
//! Notification records. Delivery beyond the record itself is not performed.
use chrono::Utc;
use matchday_common::{Notification, NotificationKind, UserId};
use uuid::Uuid;

use crate::error::AppError;
use crate::storage::Storage;

/// Store a notification for `user_id`.
///
/// Failures are logged and swallowed: the operation that triggered the
/// notification has already been committed.
pub async fn notify(
    storage: &dyn Storage,
    user_id: UserId,
    kind: NotificationKind,
    title: &str,
    message: String,
    related_id: Option<Uuid>,
) -> Option<Notification> {
    let notification = Notification {
        id: Uuid::new_v4(),
        user_id,
        kind,
        title: title.to_string(),
        message,
        related_id,
        read: false,
        created_at: Utc::now(),
    };
    match storage.insert_notification(notification).await {
        Ok(stored) => Some(stored),
        Err(e) => {
            tracing::warn!(%user_id, kind = %kind, error = %e, "failed to record notification");
            None
        },
    }
}

/// The user's notifications, newest first
pub async fn list_for_user(
    storage: &dyn Storage,
    user_id: UserId,
) -> Result<Vec<Notification>, AppError> {
    storage.list_notifications(user_id).await
}

/// Mark one of the caller's notifications as read
pub async fn mark_read(
    storage: &dyn Storage,
    user_id: UserId,
    notification_id: Uuid,
) -> Result<Notification, AppError> {
    let notification = storage
        .get_notification(notification_id)
        .await?
        .ok_or_else(|| AppError::not_found("notification"))?;
    if notification.user_id != user_id {
        return Err(AppError::Forbidden(
            "notification belongs to another user".to_string(),
        ));
    }
    storage.mark_notification_read(notification_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_notifications_newest_first_and_owner_only() {
        let storage = MemoryStorage::new();
        let owner = Uuid::new_v4();

        let first = notify(
            &storage,
            owner,
            NotificationKind::FriendRequest,
            "Friend request",
            "Sam wants to be friends".to_string(),
            None,
        )
        .await
        .unwrap();
        let second = notify(
            &storage,
            owner,
            NotificationKind::PaymentDue,
            "Payment due",
            "Pitch fee for Thursday".to_string(),
            None,
        )
        .await
        .unwrap();

        let listed = list_for_user(&storage, owner).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);

        let err = mark_read(&storage, Uuid::new_v4(), first.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let read = mark_read(&storage, owner, second.id).await.unwrap();
        assert!(read.read);
        assert!(matches!(
            mark_read(&storage, owner, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
