//! Domain entities exchanged between the server and its clients.
//!
//! Every struct serializes with camelCase keys. Enumerations are closed sets
//! and serialize as snake_case strings.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type MatchId = Uuid;

/// Error returned when a string does not name a known enumeration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Declares `as_str`, `Display` and `FromStr` for a snake_case enum.
macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Player,
    Moderator,
    Admin,
}

string_enum!(Role, "role", { Player => "player", Moderator => "moderator", Admin => "admin" });

impl Role {
    /// Moderators and admins may review participants and record statistics.
    pub const fn is_staff(self) -> bool {
        match self {
            Role::Player => false,
            Role::Moderator | Role::Admin => true,
        }
    }

    pub const fn is_admin(self) -> bool {
        match self {
            Role::Admin => true,
            Role::Player | Role::Moderator => false,
        }
    }
}

/// Subscription tier.
///
/// Deserialization is lenient: an unrecognized plan name reads as `Free`.
/// Use [`FromStr`] where unknown names must be rejected.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Plan {
    Free,
    Basic,
    Intermediate,
    Advanced,
}

string_enum!(Plan, "plan", {
    Free => "free",
    Basic => "basic",
    Intermediate => "intermediate",
    Advanced => "advanced",
});

impl From<String> for Plan {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Plan::Free)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Finished,
}

string_enum!(MatchStatus, "match status", {
    Scheduled => "scheduled",
    InProgress => "in_progress",
    Finished => "finished",
});

impl MatchStatus {
    /// Open matches count against the creator's plan quota.
    pub const fn is_open(self) -> bool {
        match self {
            MatchStatus::Scheduled | MatchStatus::InProgress => true,
            MatchStatus::Finished => false,
        }
    }
}

/// Review state shared by confirmations and statistics.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

string_enum!(ApprovalStatus, "approval status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

string_enum!(FriendshipStatus, "friendship status", {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Sent,
    Accepted,
    Rejected,
}

string_enum!(InvitationStatus, "invitation status", {
    Sent => "sent",
    Accepted => "accepted",
    Rejected => "rejected",
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Expense,
    Revenue,
}

string_enum!(LedgerKind, "ledger kind", { Expense => "expense", Revenue => "revenue" });

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

string_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Paid => "paid",
    Overdue => "overdue",
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    FriendRequest,
    FriendAccepted,
    MatchInvitation,
    InvitationAccepted,
    MatchApproved,
    MatchRejected,
    PaymentDue,
}

string_enum!(NotificationKind, "notification kind", {
    FriendRequest => "friend_request",
    FriendAccepted => "friend_accepted",
    MatchInvitation => "match_invitation",
    InvitationAccepted => "invitation_accepted",
    MatchApproved => "match_approved",
    MatchRejected => "match_rejected",
    PaymentDue => "payment_due",
});

/// A registered account. Carries the credential hash, so it is never sent to
/// clients directly; see [`PublicUser`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub credential_hash: String,
    pub role: Role,
    pub plan: Plan,
    pub position: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Client-facing view of a [`User`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub plan: Plan,
    pub position: Option<String>,
    pub photo_url: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            plan: user.plan,
            position: user.position.clone(),
            photo_url: user.photo_url.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub date: DateTime<Utc>,
    pub max_players: u32,
    pub status: MatchStatus,
    pub is_public: bool,
    pub auto_release: bool,
    pub requires_approval: bool,
    /// Assigned once at creation. [`MatchPatch`] has no way to change it.
    pub invite_code: String,
    pub invite_link: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a match. Absent fields are left untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub max_players: Option<u32>,
    pub status: Option<MatchStatus>,
    pub is_public: Option<bool>,
    pub auto_release: Option<bool>,
    pub requires_approval: Option<bool>,
}

impl Match {
    pub fn apply(&mut self, patch: &MatchPatch) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(location) = &patch.location {
            self.location = location.trim().to_string();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(max_players) = patch.max_players {
            self.max_players = max_players;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(auto_release) = patch.auto_release {
            self.auto_release = auto_release;
        }
        if let Some(requires_approval) = patch.requires_approval {
            self.requires_approval = requires_approval;
        }
    }
}

/// Attendance record of one user for one match.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub id: Uuid,
    pub user_id: UserId,
    pub match_id: MatchId,
    pub confirmed: bool,
    pub attended: bool,
    pub status: ApprovalStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Confirmation {
    pub fn new(user_id: UserId, match_id: MatchId, status: ApprovalStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            match_id,
            confirmed: false,
            attended: false,
            status,
            confirmed_at: None,
            cancelled_at: None,
        }
    }

    /// Sets `confirmed` together with exactly one of the two timestamps.
    pub fn mark(&mut self, confirmed: bool, at: DateTime<Utc>) {
        self.confirmed = confirmed;
        if confirmed {
            self.confirmed_at = Some(at);
            self.cancelled_at = None;
        } else {
            self.confirmed_at = None;
            self.cancelled_at = Some(at);
        }
    }

    /// Still holds a place: not rejected and not cancelled.
    pub fn is_active(&self) -> bool {
        let live = match self.status {
            ApprovalStatus::Pending | ApprovalStatus::Approved => true,
            ApprovalStatus::Rejected => false,
        };
        live && self.cancelled_at.is_none()
    }

    /// Occupies one of the match's `max_players` slots.
    pub fn holds_slot(&self) -> bool {
        self.confirmed && self.status == ApprovalStatus::Approved
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub id: Uuid,
    pub match_id: MatchId,
    pub user_id: UserId,
    pub goals: u32,
    pub assists: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub status: ApprovalStatus,
    pub approved_by: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub rater_id: UserId,
    pub player_id: UserId,
    pub match_id: MatchId,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub match_id: Option<MatchId>,
    pub user_id: UserId,
    pub content: String,
    pub image_url: Option<String>,
    /// Users who currently like the post.
    pub likes: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: Uuid,
    pub requester_id: UserId,
    pub addressee_id: UserId,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Friendship {
    pub fn involves(&self, user_id: UserId) -> bool {
        self.requester_id == user_id || self.addressee_id == user_id
    }

    /// The party that is not `user_id`, if `user_id` is part of this friendship.
    pub fn other_party(&self, user_id: UserId) -> Option<UserId> {
        if self.requester_id == user_id {
            Some(self.addressee_id)
        } else if self.addressee_id == user_id {
            Some(self.requester_id)
        } else {
            None
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchInvitation {
    pub id: Uuid,
    pub match_id: MatchId,
    pub inviter_id: UserId,
    pub invitee_id: Option<UserId>,
    pub email: Option<String>,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// One ledger line. `amount` is in minor currency units.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchFinance {
    pub id: Uuid,
    pub match_id: MatchId,
    #[serde(rename = "type")]
    pub kind: LedgerKind,
    pub category: String,
    pub description: Option<String>,
    pub amount: i64,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPayment {
    pub id: Uuid,
    pub match_id: MatchId,
    pub user_id: UserId,
    pub amount: i64,
    pub status: PaymentStatus,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserPayment {
    /// Pending payments past their due date read as overdue.
    pub fn effective_status(&self, now: DateTime<Utc>) -> PaymentStatus {
        match self.status {
            PaymentStatus::Pending if self.due_date < now => PaymentStatus::Overdue,
            status => status,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of evaluating a user's plan against their current activity.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub plan: Plan,
    pub can_create: bool,
    pub can_join: bool,
    pub created_count: u32,
    pub joined_count: u32,
    pub max_created: u32,
    pub max_joined: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_matches: u64,
    pub total_goals: u64,
    pub total_assists: u64,
    pub average_rating: f64,
    pub attendance_rate: f64,
}

/// A confirmation together with the profile of the user it belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(flatten)]
    pub confirmation: Confirmation,
    pub user: PublicUser,
}

/// Aggregated ledger and payment totals for one match, in minor units.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    pub match_id: MatchId,
    pub total_revenue: i64,
    pub total_expenses: i64,
    pub balance: i64,
    /// Net amount per category: revenue positive, expenses negative.
    pub by_category: std::collections::BTreeMap<String, i64>,
    pub payments_expected: i64,
    pub payments_collected: i64,
    pub payments_outstanding: i64,
    pub overdue_count: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}
