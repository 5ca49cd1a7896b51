// ================
// crates/common/src/lib.rs
// ================
//! Common types shared by the Matchday server and its clients.
//!
//! This crate defines the domain entities, the HTTP request bodies and the
//! realtime event frames pushed over the `/ws` channel.

pub mod model;
pub mod requests;

pub use model::*;

use serde::{Deserialize, Serialize};

/// Frame pushed from server to client on the realtime channel.
///
/// Serialized as `{"type": "NEW_MATCH", "data": {...}}`. Clients treat every
/// frame as a hint to refresh the affected views; nothing is sent back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    /// A match was created
    NewMatch(Match),
    /// A match was edited
    MatchUpdated(Match),
    /// A post was published
    NewPost(Post),
    /// A confirmation was created or changed
    ConfirmationUpdated(Confirmation),
}

impl ServerEvent {
    pub const fn type_tag(&self) -> &'static str {
        match self {
            ServerEvent::NewMatch(_) => "NEW_MATCH",
            ServerEvent::MatchUpdated(_) => "MATCH_UPDATED",
            ServerEvent::NewPost(_) => "NEW_POST",
            ServerEvent::ConfirmationUpdated(_) => "CONFIRMATION_UPDATED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_confirmation() -> Confirmation {
        Confirmation::new(Uuid::new_v4(), Uuid::new_v4(), ApprovalStatus::Pending)
    }

    #[test]
    fn test_event_frame_shape() {
        let confirmation = sample_confirmation();
        let event = ServerEvent::ConfirmationUpdated(confirmation.clone());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CONFIRMATION_UPDATED");
        assert_eq!(json["data"]["userId"], confirmation.user_id.to_string());
        assert_eq!(json["data"]["status"], "pending");
        assert_eq!(event.type_tag(), "CONFIRMATION_UPDATED");
    }

    #[test]
    fn test_unknown_plan_reads_as_free() {
        let plan: Plan = serde_json::from_str("\"platinum\"").unwrap();
        assert_eq!(plan, Plan::Free);

        let plan: Plan = serde_json::from_str("\"intermediate\"").unwrap();
        assert_eq!(plan, Plan::Intermediate);
        assert_eq!(serde_json::to_string(&Plan::Basic).unwrap(), "\"basic\"");

        // strict parsing still rejects unknown names
        assert!("platinum".parse::<Plan>().is_err());
    }

    #[test]
    fn test_match_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&MatchStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!("finished".parse::<MatchStatus>().unwrap(), MatchStatus::Finished);
        assert!(!MatchStatus::Finished.is_open());
    }

    #[test]
    fn test_confirmation_timestamps_are_exclusive() {
        let mut confirmation = sample_confirmation();
        let now = Utc::now();

        confirmation.mark(true, now);
        assert!(confirmation.confirmed);
        assert_eq!(confirmation.confirmed_at, Some(now));
        assert!(confirmation.cancelled_at.is_none());

        confirmation.mark(false, now);
        assert!(!confirmation.confirmed);
        assert!(confirmation.confirmed_at.is_none());
        assert_eq!(confirmation.cancelled_at, Some(now));
        assert!(!confirmation.is_active());
    }

    #[test]
    fn test_patch_trims_title_and_location() {
        let now = Utc::now();
        let mut m = Match {
            id: Uuid::new_v4(),
            title: "Sunday league".to_string(),
            description: None,
            location: "Park".to_string(),
            date: now,
            max_players: 10,
            status: MatchStatus::Scheduled,
            is_public: true,
            auto_release: false,
            requires_approval: false,
            invite_code: "ABC123".to_string(),
            invite_link: "/join/ABC123".to_string(),
            created_by: Uuid::new_v4(),
            created_at: now,
        };
        m.apply(&MatchPatch {
            title: Some("  Cup final \n".to_string()),
            location: Some("\tRiverside pitch 2 ".to_string()),
            ..MatchPatch::default()
        });
        assert_eq!(m.title, "Cup final");
        assert_eq!(m.location, "Riverside pitch 2");
        assert_eq!(m.invite_code, "ABC123");
    }

    #[test]
    fn test_overdue_payment() {
        let now = Utc::now();
        let mut payment = UserPayment {
            id: Uuid::new_v4(),
            match_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: 1500,
            status: PaymentStatus::Pending,
            due_date: now - chrono::Duration::days(1),
            paid_at: None,
            created_at: now,
        };
        assert_eq!(payment.effective_status(now), PaymentStatus::Overdue);

        payment.status = PaymentStatus::Paid;
        assert_eq!(payment.effective_status(now), PaymentStatus::Paid);
    }

    #[test]
    fn test_ledger_kind_serializes_as_type() {
        let line = MatchFinance {
            id: Uuid::new_v4(),
            match_id: Uuid::new_v4(),
            kind: LedgerKind::Expense,
            category: "pitch".to_string(),
            description: None,
            amount: 12000,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["amount"], 12000);
    }
}
