//! In-process tables shared by every storage backend.
//!
//! All query semantics (filters, sort orders, uniqueness, cascades) live
//! here so the durable and volatile backends cannot drift apart.
use matchday_common::{
    Comment, Confirmation, Friendship, Match, MatchFinance, MatchId, MatchInvitation,
    Notification, Post, Rating, Statistics, User, UserId, UserPayment,
};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// One persisted collection per entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Matches,
    Confirmations,
    Statistics,
    Ratings,
    Posts,
    Comments,
    Friendships,
    Invitations,
    Finances,
    Payments,
    Notifications,
}

impl Collection {
    pub const ALL: [Collection; 12] = [
        Collection::Users,
        Collection::Matches,
        Collection::Confirmations,
        Collection::Statistics,
        Collection::Ratings,
        Collection::Posts,
        Collection::Comments,
        Collection::Friendships,
        Collection::Invitations,
        Collection::Finances,
        Collection::Payments,
        Collection::Notifications,
    ];

    pub const fn file_name(self) -> &'static str {
        match self {
            Collection::Users => "users.json",
            Collection::Matches => "matches.json",
            Collection::Confirmations => "confirmations.json",
            Collection::Statistics => "statistics.json",
            Collection::Ratings => "ratings.json",
            Collection::Posts => "posts.json",
            Collection::Comments => "comments.json",
            Collection::Friendships => "friendships.json",
            Collection::Invitations => "invitations.json",
            Collection::Finances => "finances.json",
            Collection::Payments => "payments.json",
            Collection::Notifications => "notifications.json",
        }
    }
}

/// Rows of every entity, kept in insertion order
#[derive(Debug, Default, Clone)]
pub struct Tables {
    users: Vec<User>,
    matches: Vec<Match>,
    confirmations: Vec<Confirmation>,
    statistics: Vec<Statistics>,
    ratings: Vec<Rating>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    friendships: Vec<Friendship>,
    invitations: Vec<MatchInvitation>,
    finances: Vec<MatchFinance>,
    payments: Vec<UserPayment>,
    notifications: Vec<Notification>,
}

fn encode<T: Serialize>(rows: &[T]) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

fn decode<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, AppError> {
    Ok(serde_json::from_str(json)?)
}

/// Replace the row whose id matches, or report `what` as missing
fn replace<T: Clone>(
    rows: &mut [T],
    id: Uuid,
    row: T,
    id_of: impl Fn(&T) -> Uuid,
    what: &str,
) -> Result<T, AppError> {
    let slot = rows
        .iter_mut()
        .find(|existing| id_of(existing) == id)
        .ok_or_else(|| AppError::not_found(what))?;
    *slot = row;
    Ok(slot.clone())
}

fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    // stable, so equal timestamps keep insertion order
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

impl Tables {
    pub fn to_json(&self, collection: Collection) -> Result<String, AppError> {
        match collection {
            Collection::Users => encode(&self.users),
            Collection::Matches => encode(&self.matches),
            Collection::Confirmations => encode(&self.confirmations),
            Collection::Statistics => encode(&self.statistics),
            Collection::Ratings => encode(&self.ratings),
            Collection::Posts => encode(&self.posts),
            Collection::Comments => encode(&self.comments),
            Collection::Friendships => encode(&self.friendships),
            Collection::Invitations => encode(&self.invitations),
            Collection::Finances => encode(&self.finances),
            Collection::Payments => encode(&self.payments),
            Collection::Notifications => encode(&self.notifications),
        }
    }

    pub fn load_json(&mut self, collection: Collection, json: &str) -> Result<(), AppError> {
        match collection {
            Collection::Users => self.users = decode(json)?,
            Collection::Matches => self.matches = decode(json)?,
            Collection::Confirmations => self.confirmations = decode(json)?,
            Collection::Statistics => self.statistics = decode(json)?,
            Collection::Ratings => self.ratings = decode(json)?,
            Collection::Posts => self.posts = decode(json)?,
            Collection::Comments => self.comments = decode(json)?,
            Collection::Friendships => self.friendships = decode(json)?,
            Collection::Invitations => self.invitations = decode(json)?,
            Collection::Finances => self.finances = decode(json)?,
            Collection::Payments => self.payments = decode(json)?,
            Collection::Notifications => self.notifications = decode(json)?,
        }
        Ok(())
    }

    // --- users ---

    pub fn insert_user(&mut self, user: User) -> Result<User, AppError> {
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("email already registered".to_string()));
        }
        self.users.push(user.clone());
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.users.iter().find(|u| u.email == email).cloned()
    }

    pub fn update_user(&mut self, user: User) -> Result<User, AppError> {
        replace(&mut self.users, user.id, user, |u| u.id, "user")
    }

    // --- matches ---

    pub fn insert_match(&mut self, m: Match) -> Result<Match, AppError> {
        if self.matches.iter().any(|existing| existing.invite_code == m.invite_code) {
            return Err(AppError::Conflict("invite code already in use".to_string()));
        }
        if self.matches.iter().any(|existing| existing.invite_link == m.invite_link) {
            return Err(AppError::Conflict("invite link already in use".to_string()));
        }
        self.matches.push(m.clone());
        Ok(m)
    }

    pub fn get_match(&self, id: MatchId) -> Option<Match> {
        self.matches.iter().find(|m| m.id == id).cloned()
    }

    pub fn find_match_by_code(&self, code: &str) -> Option<Match> {
        self.matches.iter().find(|m| m.invite_code == code).cloned()
    }

    /// All matches, latest kickoff first
    pub fn list_matches(&self) -> Vec<Match> {
        newest_first(self.matches.clone(), |m| m.date)
    }

    pub fn list_matches_created_by(&self, user_id: UserId) -> Vec<Match> {
        newest_first(
            self.matches
                .iter()
                .filter(|m| m.created_by == user_id)
                .cloned()
                .collect(),
            |m| m.date,
        )
    }

    pub fn update_match(&mut self, m: Match) -> Result<Match, AppError> {
        let current = self
            .matches
            .iter()
            .find(|existing| existing.id == m.id)
            .ok_or_else(|| AppError::not_found("match"))?;
        if current.invite_code != m.invite_code || current.invite_link != m.invite_link {
            return Err(AppError::Conflict("invite code is immutable".to_string()));
        }
        replace(&mut self.matches, m.id, m, |m| m.id, "match")
    }

    /// Remove a match with its dependent rows. Posts are kept but detached.
    pub fn delete_match(&mut self, id: MatchId) -> Result<Match, AppError> {
        let index = self
            .matches
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| AppError::not_found("match"))?;
        let removed = self.matches.remove(index);

        self.confirmations.retain(|c| c.match_id != id);
        self.statistics.retain(|s| s.match_id != id);
        self.ratings.retain(|r| r.match_id != id);
        self.invitations.retain(|i| i.match_id != id);
        self.finances.retain(|f| f.match_id != id);
        self.payments.retain(|p| p.match_id != id);
        for post in self.posts.iter_mut().filter(|p| p.match_id == Some(id)) {
            post.match_id = None;
        }
        Ok(removed)
    }

    // --- confirmations ---

    pub fn get_confirmation(&self, user_id: UserId, match_id: MatchId) -> Option<Confirmation> {
        self.confirmations
            .iter()
            .find(|c| c.user_id == user_id && c.match_id == match_id)
            .cloned()
    }

    /// Insert or replace the single row for (user, match). An existing
    /// row keeps its id.
    pub fn upsert_confirmation(&mut self, mut confirmation: Confirmation) -> Confirmation {
        match self
            .confirmations
            .iter_mut()
            .find(|c| c.user_id == confirmation.user_id && c.match_id == confirmation.match_id)
        {
            Some(existing) => {
                confirmation.id = existing.id;
                *existing = confirmation.clone();
            },
            None => self.confirmations.push(confirmation.clone()),
        }
        confirmation
    }

    pub fn list_confirmations_by_match(&self, match_id: MatchId) -> Vec<Confirmation> {
        self.confirmations
            .iter()
            .filter(|c| c.match_id == match_id)
            .cloned()
            .collect()
    }

    pub fn list_confirmations_by_user(&self, user_id: UserId) -> Vec<Confirmation> {
        self.confirmations
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect()
    }

    // --- statistics ---

    pub fn insert_statistics(&mut self, stats: Statistics) -> Statistics {
        self.statistics.push(stats.clone());
        stats
    }

    pub fn get_statistics(&self, id: Uuid) -> Option<Statistics> {
        self.statistics.iter().find(|s| s.id == id).cloned()
    }

    pub fn update_statistics(&mut self, stats: Statistics) -> Result<Statistics, AppError> {
        replace(&mut self.statistics, stats.id, stats, |s| s.id, "statistics")
    }

    pub fn list_statistics_by_match(&self, match_id: MatchId) -> Vec<Statistics> {
        self.statistics
            .iter()
            .filter(|s| s.match_id == match_id)
            .cloned()
            .collect()
    }

    pub fn list_statistics_by_user(&self, user_id: UserId) -> Vec<Statistics> {
        self.statistics
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    // --- ratings ---

    pub fn insert_rating(&mut self, rating: Rating) -> Rating {
        self.ratings.push(rating.clone());
        rating
    }

    pub fn list_ratings_for_player(&self, player_id: UserId) -> Vec<Rating> {
        self.ratings
            .iter()
            .filter(|r| r.player_id == player_id)
            .cloned()
            .collect()
    }

    // --- posts & comments ---

    pub fn insert_post(&mut self, post: Post) -> Post {
        self.posts.push(post.clone());
        post
    }

    pub fn get_post(&self, id: Uuid) -> Option<Post> {
        self.posts.iter().find(|p| p.id == id).cloned()
    }

    /// Posts newest first, optionally only those attached to `match_id`
    pub fn list_posts(&self, match_id: Option<MatchId>) -> Vec<Post> {
        newest_first(
            self.posts
                .iter()
                .filter(|p| match_id.is_none() || p.match_id == match_id)
                .cloned()
                .collect(),
            |p| p.created_at,
        )
    }

    /// Flip `user_id`'s membership in the post's like set
    pub fn toggle_like(&mut self, post_id: Uuid, user_id: UserId) -> Result<Post, AppError> {
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| AppError::not_found("post"))?;
        if !post.likes.remove(&user_id) {
            post.likes.insert(user_id);
        }
        Ok(post.clone())
    }

    pub fn insert_comment(&mut self, comment: Comment) -> Comment {
        self.comments.push(comment.clone());
        comment
    }

    pub fn list_comments(&self, post_id: Uuid) -> Vec<Comment> {
        newest_first(
            self.comments
                .iter()
                .filter(|c| c.post_id == post_id)
                .cloned()
                .collect(),
            |c| c.created_at,
        )
    }

    // --- friendships ---

    pub fn insert_friendship(&mut self, friendship: Friendship) -> Friendship {
        self.friendships.push(friendship.clone());
        friendship
    }

    pub fn get_friendship(&self, id: Uuid) -> Option<Friendship> {
        self.friendships.iter().find(|f| f.id == id).cloned()
    }

    pub fn update_friendship(&mut self, friendship: Friendship) -> Result<Friendship, AppError> {
        replace(&mut self.friendships, friendship.id, friendship, |f| f.id, "friendship")
    }

    /// Requests in either direction involving `user_id`
    pub fn list_friendships(&self, user_id: UserId) -> Vec<Friendship> {
        self.friendships
            .iter()
            .filter(|f| f.involves(user_id))
            .cloned()
            .collect()
    }

    // --- invitations ---

    pub fn insert_invitation(&mut self, invitation: MatchInvitation) -> MatchInvitation {
        self.invitations.push(invitation.clone());
        invitation
    }

    pub fn get_invitation(&self, id: Uuid) -> Option<MatchInvitation> {
        self.invitations.iter().find(|i| i.id == id).cloned()
    }

    pub fn update_invitation(
        &mut self,
        invitation: MatchInvitation,
    ) -> Result<MatchInvitation, AppError> {
        replace(&mut self.invitations, invitation.id, invitation, |i| i.id, "invitation")
    }

    pub fn list_invitations_by_match(&self, match_id: MatchId) -> Vec<MatchInvitation> {
        self.invitations
            .iter()
            .filter(|i| i.match_id == match_id)
            .cloned()
            .collect()
    }

    // --- finances & payments ---

    pub fn insert_finance(&mut self, line: MatchFinance) -> MatchFinance {
        self.finances.push(line.clone());
        line
    }

    pub fn list_finances_by_match(&self, match_id: MatchId) -> Vec<MatchFinance> {
        self.finances
            .iter()
            .filter(|f| f.match_id == match_id)
            .cloned()
            .collect()
    }

    pub fn insert_payment(&mut self, payment: UserPayment) -> UserPayment {
        self.payments.push(payment.clone());
        payment
    }

    pub fn get_payment(&self, id: Uuid) -> Option<UserPayment> {
        self.payments.iter().find(|p| p.id == id).cloned()
    }

    pub fn update_payment(&mut self, payment: UserPayment) -> Result<UserPayment, AppError> {
        replace(&mut self.payments, payment.id, payment, |p| p.id, "payment")
    }

    pub fn list_payments_by_user(&self, user_id: UserId) -> Vec<UserPayment> {
        self.payments
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn list_payments_by_match(&self, match_id: MatchId) -> Vec<UserPayment> {
        self.payments
            .iter()
            .filter(|p| p.match_id == match_id)
            .cloned()
            .collect()
    }

    // --- notifications ---

    pub fn insert_notification(&mut self, notification: Notification) -> Notification {
        self.notifications.push(notification.clone());
        notification
    }

    pub fn get_notification(&self, id: Uuid) -> Option<Notification> {
        self.notifications.iter().find(|n| n.id == id).cloned()
    }

    pub fn mark_notification_read(&mut self, id: Uuid) -> Result<Notification, AppError> {
        let notification = self
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::not_found("notification"))?;
        notification.read = true;
        Ok(notification.clone())
    }

    pub fn list_notifications(&self, user_id: UserId) -> Vec<Notification> {
        newest_first(
            self.notifications
                .iter()
                .filter(|n| n.user_id == user_id)
                .cloned()
                .collect(),
            |n| n.created_at,
        )
    }
}
