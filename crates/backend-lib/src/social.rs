// ============================
// crates/backend-lib/src/social.rs
// ============================
//! Posts, likes, comments and friendships.
use chrono::Utc;
use matchday_common::requests::{CreateCommentRequest, CreatePostRequest};
use matchday_common::{
    Comment, Friendship, FriendshipStatus, MatchId, NotificationKind, Post, PublicUser,
    ServerEvent, User, UserId,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::fanout::ConnectionRegistry;
use crate::notifications;
use crate::storage::Storage;
use crate::validation::{validate_text, MAX_COMMENT_LENGTH, MAX_POST_LENGTH};

/// Publish a post and announce it to connected clients
pub async fn create_post(
    storage: &dyn Storage,
    registry: &ConnectionRegistry,
    author: &User,
    request: CreatePostRequest,
) -> Result<Post, AppError> {
    let content = validate_text("content", &request.content, MAX_POST_LENGTH, false)?;
    if let Some(match_id) = request.match_id {
        if storage.get_match(match_id).await?.is_none() {
            return Err(AppError::not_found("match"));
        }
    }

    let post = storage
        .insert_post(Post {
            id: Uuid::new_v4(),
            match_id: request.match_id,
            user_id: author.id,
            content: content.trim().to_string(),
            image_url: request.image_url,
            likes: Default::default(),
            created_at: Utc::now(),
        })
        .await?;

    tracing::debug!(post_id = %post.id, user_id = %author.id, "post published");
    registry.broadcast(&ServerEvent::NewPost(post.clone()));
    Ok(post)
}

pub async fn list_posts(
    storage: &dyn Storage,
    match_id: Option<MatchId>,
) -> Result<Vec<Post>, AppError> {
    storage.list_posts(match_id).await
}

/// Add or remove the user's like; applying it twice restores the original set
pub async fn toggle_like(
    storage: &dyn Storage,
    post_id: Uuid,
    user_id: UserId,
) -> Result<Post, AppError> {
    storage.toggle_like(post_id, user_id).await
}

pub async fn add_comment(
    storage: &dyn Storage,
    author: &User,
    post_id: Uuid,
    request: CreateCommentRequest,
) -> Result<Comment, AppError> {
    let content = validate_text("content", &request.content, MAX_COMMENT_LENGTH, false)?;
    if storage.get_post(post_id).await?.is_none() {
        return Err(AppError::not_found("post"));
    }
    storage
        .insert_comment(Comment {
            id: Uuid::new_v4(),
            post_id,
            user_id: author.id,
            content: content.trim().to_string(),
            created_at: Utc::now(),
        })
        .await
}

pub async fn list_comments(storage: &dyn Storage, post_id: Uuid) -> Result<Vec<Comment>, AppError> {
    if storage.get_post(post_id).await?.is_none() {
        return Err(AppError::not_found("post"));
    }
    storage.list_comments(post_id).await
}

pub async fn send_friend_request(
    storage: &dyn Storage,
    requester: &User,
    addressee_id: UserId,
) -> Result<Friendship, AppError> {
    if addressee_id == requester.id {
        return Err(AppError::Validation(
            "cannot send a friend request to yourself".to_string(),
        ));
    }
    if storage.get_user(addressee_id).await?.is_none() {
        return Err(AppError::not_found("user"));
    }
    let duplicate = storage
        .list_friendships(requester.id)
        .await?
        .iter()
        .any(|f| {
            f.other_party(requester.id) == Some(addressee_id)
                && f.status != FriendshipStatus::Rejected
        });
    if duplicate {
        return Err(AppError::Conflict(
            "a friend request between these users already exists".to_string(),
        ));
    }

    let friendship = storage
        .insert_friendship(Friendship {
            id: Uuid::new_v4(),
            requester_id: requester.id,
            addressee_id,
            status: FriendshipStatus::Pending,
            created_at: Utc::now(),
            accepted_at: None,
        })
        .await?;

    notifications::notify(
        storage,
        addressee_id,
        NotificationKind::FriendRequest,
        "Friend request",
        format!("{} wants to add you as a friend", requester.name),
        Some(friendship.id),
    )
    .await;
    Ok(friendship)
}

/// Pending requests addressed to the user
pub async fn incoming_requests(
    storage: &dyn Storage,
    user_id: UserId,
) -> Result<Vec<Friendship>, AppError> {
    Ok(storage
        .list_friendships(user_id)
        .await?
        .into_iter()
        .filter(|f| f.addressee_id == user_id && f.status == FriendshipStatus::Pending)
        .collect())
}

/// Accept or reject a request; only its addressee may answer
pub async fn respond_friend_request(
    storage: &dyn Storage,
    user: &User,
    friendship_id: Uuid,
    decision: FriendshipStatus,
) -> Result<Friendship, AppError> {
    let mut friendship = storage
        .get_friendship(friendship_id)
        .await?
        .ok_or_else(|| AppError::not_found("friend request"))?;
    if friendship.addressee_id != user.id {
        return Err(AppError::Forbidden(
            "only the addressee may answer a friend request".to_string(),
        ));
    }
    if decision == FriendshipStatus::Pending {
        return Err(AppError::Validation(
            "decision must be accepted or rejected".to_string(),
        ));
    }
    if friendship.status != FriendshipStatus::Pending {
        return Err(AppError::Conflict(
            "friend request was already answered".to_string(),
        ));
    }

    friendship.status = decision;
    friendship.accepted_at = match decision {
        FriendshipStatus::Accepted => Some(Utc::now()),
        FriendshipStatus::Pending | FriendshipStatus::Rejected => None,
    };
    let friendship = storage.update_friendship(friendship).await?;

    if decision == FriendshipStatus::Accepted {
        notifications::notify(
            storage,
            friendship.requester_id,
            NotificationKind::FriendAccepted,
            "Friend request accepted",
            format!("{} accepted your friend request", user.name),
            Some(friendship.id),
        )
        .await;
    }
    Ok(friendship)
}

/// Everyone with an accepted friendship with the user, whoever asked first
pub async fn friends_of(storage: &dyn Storage, user_id: UserId) -> Result<Vec<PublicUser>, AppError> {
    let mut friends = Vec::new();
    for friendship in storage.list_friendships(user_id).await? {
        if friendship.status != FriendshipStatus::Accepted {
            continue;
        }
        let Some(other) = friendship.other_party(user_id) else {
            continue;
        };
        if let Some(user) = storage.get_user(other).await? {
            friends.push(PublicUser::from(&user));
        }
    }
    Ok(friends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use matchday_common::{Plan, Role};

    async fn user(storage: &MemoryStorage, name: &str) -> User {
        storage
            .insert_user(User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                credential_hash: String::new(),
                role: Role::Player,
                plan: Plan::Free,
                position: None,
                photo_url: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_like_toggle_round_trip() {
        let storage = MemoryStorage::new();
        let registry = ConnectionRegistry::new();
        let author = user(&storage, "Author").await;
        let fan = user(&storage, "Fan").await;

        let post = create_post(
            &storage,
            &registry,
            &author,
            CreatePostRequest {
                content: "Great game lads".to_string(),
                match_id: None,
                image_url: None,
            },
        )
        .await
        .unwrap();

        let liked = toggle_like(&storage, post.id, fan.id).await.unwrap();
        assert!(liked.likes.contains(&fan.id));
        let unliked = toggle_like(&storage, post.id, fan.id).await.unwrap();
        assert_eq!(unliked.likes, post.likes);
    }

    #[tokio::test]
    async fn test_friendship_is_symmetric_once_accepted() {
        let storage = MemoryStorage::new();
        let a = user(&storage, "Alex").await;
        let b = user(&storage, "Blair").await;

        let request = send_friend_request(&storage, &a, b.id).await.unwrap();
        assert_eq!(incoming_requests(&storage, b.id).await.unwrap().len(), 1);
        assert!(friends_of(&storage, a.id).await.unwrap().is_empty());

        // the requester cannot accept on the addressee's behalf
        assert!(matches!(
            respond_friend_request(&storage, &a, request.id, FriendshipStatus::Accepted).await,
            Err(AppError::Forbidden(_))
        ));

        respond_friend_request(&storage, &b, request.id, FriendshipStatus::Accepted)
            .await
            .unwrap();
        let friends_of_a = friends_of(&storage, a.id).await.unwrap();
        let friends_of_b = friends_of(&storage, b.id).await.unwrap();
        assert_eq!(friends_of_a[0].id, b.id);
        assert_eq!(friends_of_b[0].id, a.id);

        assert!(matches!(
            send_friend_request(&storage, &b, a.id).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_answered_request_cannot_be_answered_again() {
        let storage = MemoryStorage::new();
        let a = user(&storage, "Alex").await;
        let b = user(&storage, "Blair").await;

        let request = send_friend_request(&storage, &a, b.id).await.unwrap();
        let accepted = respond_friend_request(&storage, &b, request.id, FriendshipStatus::Accepted)
            .await
            .unwrap();
        assert!(accepted.accepted_at.is_some());

        let err = respond_friend_request(&storage, &b, request.id, FriendshipStatus::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = storage.get_friendship(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, FriendshipStatus::Accepted);
        assert_eq!(stored.accepted_at, accepted.accepted_at);
        assert_eq!(friends_of(&storage, a.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_comment_needs_existing_post() {
        let storage = MemoryStorage::new();
        let author = user(&storage, "Author").await;
        let err = add_comment(
            &storage,
            &author,
            Uuid::new_v4(),
            CreateCommentRequest {
                content: "Nice".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
