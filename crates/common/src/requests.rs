//! JSON request bodies accepted by the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ApprovalStatus, FriendshipStatus, InvitationStatus, LedgerKind, PaymentStatus};

const fn default_max_players() -> u32 {
    20
}

const fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub position: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SetRoleRequest {
    pub role: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SetPlanRequest {
    pub plan: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    pub date: DateTime<Utc>,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub auto_release: bool,
    #[serde(default)]
    pub requires_approval: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JoinByCodeRequest {
    pub code: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReviewParticipantRequest {
    pub status: ApprovalStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AttendanceRequest {
    pub attended: bool,
}

/// Exactly one of `user_id` and `email` must be present.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InviteRequest {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RespondInvitationRequest {
    pub status: InvitationStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    #[serde(alias = "friendId")]
    pub addressee_id: Uuid,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RespondFriendRequest {
    pub status: FriendshipStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub match_id: Option<Uuid>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateStatisticsRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub yellow_cards: u32,
    #[serde(default)]
    pub red_cards: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReviewStatisticsRequest {
    pub status: ApprovalStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub match_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateFinanceRequest {
    #[serde(rename = "type")]
    pub kind: LedgerKind,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub user_id: Uuid,
    pub amount: i64,
    pub due_date: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdatePaymentRequest {
    pub status: PaymentStatus,
}
