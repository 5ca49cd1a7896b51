// ============================
// crates/backend-lib/src/matches.rs
// ============================
//! Match lifecycle: creation, discovery, joining and participation.
//!
//! Every mutation is authorized before it touches storage, and every change
//! to a match or a confirmation is pushed to connected clients.
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use matchday_common::requests::{CreateMatchRequest, InviteRequest};
use matchday_common::{
    ApprovalStatus, Confirmation, InvitationStatus, Match, MatchId, MatchInvitation, MatchPatch,
    MatchStatus, NotificationKind, Participant, PublicUser, ServerEvent, User, UserId,
};
use rand::Rng;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::config::{CapacityPolicy, MatchSettings};
use crate::error::AppError;
use crate::fanout::ConnectionRegistry;
use crate::storage::Storage;
use crate::validation::{normalize_email, normalize_invite_code, validate_email};
use crate::{metrics, notifications, plan_limits, validation};

/// Invite code alphabet without look-alike characters (0/O, 1/I)
const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const MAX_CODE_ATTEMPTS: usize = 16;

pub struct MatchManager {
    storage: Arc<dyn Storage>,
    registry: Arc<ConnectionRegistry>,
    settings: MatchSettings,
    // per-user guard around quota check and insert
    reservations: DashMap<UserId, Arc<Mutex<()>>>,
}

impl MatchManager {
    pub fn new(
        storage: Arc<dyn Storage>,
        registry: Arc<ConnectionRegistry>,
        settings: MatchSettings,
    ) -> Self {
        Self {
            storage,
            registry,
            settings,
            reservations: DashMap::new(),
        }
    }

    async fn reserve(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = self.reservations.entry(user_id).or_default().clone();
        lock.lock_owned().await
    }

    async fn load(&self, match_id: MatchId) -> Result<Match, AppError> {
        self.storage
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::not_found("match"))
    }

    fn generate_code(&self) -> String {
        let mut rng = rand::rng();
        (0..self.settings.invite_code_length)
            .map(|_| INVITE_ALPHABET[rng.random_range(0..INVITE_ALPHABET.len())] as char)
            .collect()
    }

    fn invite_link(&self, code: &str) -> String {
        format!(
            "{}/join/{code}",
            self.settings.public_base_url.trim_end_matches('/')
        )
    }

    async fn unique_code(&self) -> Result<String, AppError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = self.generate_code();
            if self.storage.find_match_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            tracing::debug!("invite code collision, retrying");
        }
        Err(AppError::Internal(
            "could not generate a unique invite code".to_string(),
        ))
    }

    /// Under the strict policy, refuse a participant who would exceed
    /// `max_players`. Rows already holding a slot are never refused.
    async fn ensure_capacity(
        &self,
        m: &Match,
        current: Option<&Confirmation>,
    ) -> Result<(), AppError> {
        match self.settings.capacity_policy {
            CapacityPolicy::Advisory => Ok(()),
            CapacityPolicy::Strict => {
                if current.is_some_and(Confirmation::holds_slot) {
                    return Ok(());
                }
                let taken = self
                    .storage
                    .list_confirmations_by_match(m.id)
                    .await?
                    .iter()
                    .filter(|c| c.holds_slot())
                    .count();
                if taken >= m.max_players as usize {
                    return Err(AppError::Conflict("match is full".to_string()));
                }
                Ok(())
            },
        }
    }

    /// A rejection stands until a reviewer or an accepted invitation lifts it
    fn ensure_not_rejected(current: Option<&Confirmation>) -> Result<(), AppError> {
        if current.is_some_and(|c| c.status == ApprovalStatus::Rejected) {
            return Err(AppError::Forbidden(
                "your participation in this match was declined".to_string(),
            ));
        }
        Ok(())
    }

    fn may_manage(actor: &User, m: &Match) -> bool {
        m.created_by == actor.id || actor.role.is_admin()
    }

    fn may_moderate(actor: &User, m: &Match) -> bool {
        m.created_by == actor.id || actor.role.is_staff()
    }

    async fn store_confirmation(&self, confirmation: Confirmation) -> Result<Confirmation, AppError> {
        let stored = self.storage.upsert_confirmation(confirmation).await?;
        self.registry
            .broadcast(&ServerEvent::ConfirmationUpdated(stored.clone()));
        Ok(stored)
    }

    pub async fn create_match(
        &self,
        creator: &User,
        request: CreateMatchRequest,
    ) -> Result<Match, AppError> {
        validation::validate_new_match(&request)?;

        let _reservation = self.reserve(creator.id).await;
        let limits = plan_limits::evaluate(self.storage.as_ref(), creator).await?;
        if !limits.can_create {
            ::metrics::counter!(metrics::QUOTA_REJECTED, "op" => "create").increment(1);
            tracing::info!(user_id = %creator.id, plan = %limits.plan, "match creation over quota");
            return Err(AppError::QuotaExceeded(limits));
        }

        let invite_code = self.unique_code().await?;
        let m = Match {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description,
            location: request.location.trim().to_string(),
            date: request.date,
            max_players: request.max_players,
            status: MatchStatus::Scheduled,
            is_public: request.is_public,
            auto_release: request.auto_release,
            requires_approval: request.requires_approval,
            invite_link: self.invite_link(&invite_code),
            invite_code,
            created_by: creator.id,
            created_at: Utc::now(),
        };
        let m = self.storage.insert_match(m).await?;

        ::metrics::counter!(metrics::MATCH_CREATED).increment(1);
        tracing::info!(match_id = %m.id, user_id = %creator.id, "match created");
        self.registry.broadcast(&ServerEvent::NewMatch(m.clone()));
        Ok(m)
    }

    pub async fn get_match(&self, match_id: MatchId) -> Result<Match, AppError> {
        self.load(match_id).await
    }

    /// Public matches plus private ones the viewer created or takes part in;
    /// admins see everything
    pub async fn list_matches(&self, viewer: &User) -> Result<Vec<Match>, AppError> {
        let all = self.storage.list_matches().await?;
        if viewer.role.is_admin() {
            return Ok(all);
        }
        let participating: HashSet<MatchId> = self
            .storage
            .list_confirmations_by_user(viewer.id)
            .await?
            .into_iter()
            .filter(Confirmation::is_active)
            .map(|c| c.match_id)
            .collect();
        Ok(all
            .into_iter()
            .filter(|m| m.is_public || m.created_by == viewer.id || participating.contains(&m.id))
            .collect())
    }

    pub async fn update_match(
        &self,
        editor: &User,
        match_id: MatchId,
        patch: MatchPatch,
    ) -> Result<Match, AppError> {
        let mut m = self.load(match_id).await?;
        if !Self::may_manage(editor, &m) {
            return Err(AppError::Forbidden(
                "only the creator or an admin may edit this match".to_string(),
            ));
        }
        validation::validate_match_patch(&patch)?;

        // reopening a finished match takes a slot of the creator's quota again
        let reopening = !m.status.is_open() && patch.status.is_some_and(MatchStatus::is_open);
        let _reservation = if reopening {
            Some(self.reserve(m.created_by).await)
        } else {
            None
        };
        if reopening {
            let creator = self
                .storage
                .get_user(m.created_by)
                .await?
                .ok_or_else(|| AppError::not_found("user"))?;
            let limits = plan_limits::evaluate(self.storage.as_ref(), &creator).await?;
            if !limits.can_create {
                ::metrics::counter!(metrics::QUOTA_REJECTED, "op" => "reopen").increment(1);
                tracing::info!(%match_id, user_id = %creator.id, plan = %limits.plan, "reopen over quota");
                return Err(AppError::QuotaExceeded(limits));
            }
        }

        m.apply(&patch);
        let m = self.storage.update_match(m).await?;
        tracing::info!(match_id = %m.id, user_id = %editor.id, "match updated");
        self.registry.broadcast(&ServerEvent::MatchUpdated(m.clone()));
        Ok(m)
    }

    /// Delete a match together with its confirmations, statistics, ratings,
    /// invitations and ledger. Posts stay, detached from the match.
    pub async fn delete_match(&self, actor: &User, match_id: MatchId) -> Result<Match, AppError> {
        let m = self.load(match_id).await?;
        if !Self::may_manage(actor, &m) {
            return Err(AppError::Forbidden(
                "only the creator or an admin may delete this match".to_string(),
            ));
        }
        let removed = self.storage.delete_match(match_id).await?;
        tracing::info!(match_id = %match_id, user_id = %actor.id, "match deleted");
        Ok(removed)
    }

    pub async fn join_by_code(&self, user: &User, code: &str) -> Result<Match, AppError> {
        let code = normalize_invite_code(code);
        let m = self
            .storage
            .find_match_by_code(&code)
            .await?
            .ok_or(AppError::InvalidCode)?;

        let _reservation = self.reserve(user.id).await;
        let existing = self.storage.get_confirmation(user.id, m.id).await?;
        Self::ensure_not_rejected(existing.as_ref())?;

        // re-joining a match the user already counts toward is free
        if !existing.as_ref().is_some_and(Confirmation::is_active) {
            let limits = plan_limits::evaluate(self.storage.as_ref(), user).await?;
            if !limits.can_join {
                ::metrics::counter!(metrics::QUOTA_REJECTED, "op" => "join").increment(1);
                tracing::info!(user_id = %user.id, plan = %limits.plan, "join over quota");
                return Err(AppError::QuotaExceeded(limits));
            }
        }

        let now = Utc::now();
        let already_approved = existing
            .as_ref()
            .is_some_and(|c| c.status == ApprovalStatus::Approved);
        let mut confirmation = existing
            .clone()
            .unwrap_or_else(|| Confirmation::new(user.id, m.id, ApprovalStatus::Pending));

        if m.requires_approval && !already_approved {
            confirmation.status = ApprovalStatus::Pending;
            confirmation.confirmed = false;
            confirmation.confirmed_at = None;
            confirmation.cancelled_at = None;
        } else {
            self.ensure_capacity(&m, existing.as_ref()).await?;
            confirmation.status = ApprovalStatus::Approved;
            confirmation.mark(true, now);
        }

        let confirmation = self.store_confirmation(confirmation).await?;
        ::metrics::counter!(metrics::MATCH_JOINED).increment(1);
        tracing::info!(
            match_id = %m.id,
            user_id = %user.id,
            status = %confirmation.status,
            "joined by invite code"
        );
        Ok(m)
    }

    /// Idempotent upsert of the caller's attendance intent
    pub async fn set_confirmation(
        &self,
        user: &User,
        match_id: MatchId,
        confirmed: bool,
    ) -> Result<Confirmation, AppError> {
        let m = self.load(match_id).await?;
        let existing = self.storage.get_confirmation(user.id, match_id).await?;

        if confirmed {
            Self::ensure_not_rejected(existing.as_ref())?;
            let approved = existing
                .as_ref()
                .is_some_and(|c| c.status == ApprovalStatus::Approved);
            if m.requires_approval && !approved {
                return Err(AppError::Forbidden(
                    "this match requires approval; join with the invite code".to_string(),
                ));
            }
            self.ensure_capacity(&m, existing.as_ref()).await?;
        }

        let mut confirmation = existing
            .unwrap_or_else(|| Confirmation::new(user.id, match_id, ApprovalStatus::Approved));
        confirmation.mark(confirmed, Utc::now());
        self.store_confirmation(confirmation).await
    }

    pub async fn list_confirmations(&self, match_id: MatchId) -> Result<Vec<Confirmation>, AppError> {
        self.load(match_id).await?;
        self.storage.list_confirmations_by_match(match_id).await
    }

    /// Confirmations joined with the participants' public profiles
    pub async fn participants(&self, match_id: MatchId) -> Result<Vec<Participant>, AppError> {
        let confirmations = self.list_confirmations(match_id).await?;
        let mut participants = Vec::with_capacity(confirmations.len());
        for confirmation in confirmations {
            if let Some(user) = self.storage.get_user(confirmation.user_id).await? {
                participants.push(Participant {
                    user: PublicUser::from(&user),
                    confirmation,
                });
            }
        }
        Ok(participants)
    }

    pub async fn review_participant(
        &self,
        reviewer: &User,
        match_id: MatchId,
        user_id: UserId,
        decision: ApprovalStatus,
    ) -> Result<Confirmation, AppError> {
        let m = self.load(match_id).await?;
        if !Self::may_moderate(reviewer, &m) {
            return Err(AppError::Forbidden(
                "only the creator or a moderator may review participants".to_string(),
            ));
        }
        if decision == ApprovalStatus::Pending {
            return Err(AppError::Validation(
                "decision must be approved or rejected".to_string(),
            ));
        }
        let mut confirmation = self
            .storage
            .get_confirmation(user_id, match_id)
            .await?
            .ok_or_else(|| AppError::not_found("confirmation"))?;

        let (kind, title) = match decision {
            ApprovalStatus::Approved => {
                self.ensure_capacity(&m, Some(&confirmation)).await?;
                confirmation.status = ApprovalStatus::Approved;
                confirmation.mark(true, Utc::now());
                (NotificationKind::MatchApproved, "Participation approved")
            },
            ApprovalStatus::Rejected | ApprovalStatus::Pending => {
                confirmation.status = ApprovalStatus::Rejected;
                confirmation.confirmed = false;
                confirmation.confirmed_at = None;
                (NotificationKind::MatchRejected, "Participation declined")
            },
        };
        let confirmation = self.store_confirmation(confirmation).await?;

        notifications::notify(
            self.storage.as_ref(),
            user_id,
            kind,
            title,
            format!("Your request to join \"{}\" was {}", m.title, decision),
            Some(m.id),
        )
        .await;
        tracing::info!(%match_id, %user_id, decision = %decision, "participant reviewed");
        Ok(confirmation)
    }

    /// Record after the fact whether a participant showed up
    pub async fn set_attendance(
        &self,
        actor: &User,
        match_id: MatchId,
        user_id: UserId,
        attended: bool,
    ) -> Result<Confirmation, AppError> {
        let m = self.load(match_id).await?;
        if !Self::may_moderate(actor, &m) {
            return Err(AppError::Forbidden(
                "only the creator or a moderator may record attendance".to_string(),
            ));
        }
        let mut confirmation = self
            .storage
            .get_confirmation(user_id, match_id)
            .await?
            .ok_or_else(|| AppError::not_found("confirmation"))?;
        confirmation.attended = attended;
        self.store_confirmation(confirmation).await
    }

    pub async fn invite_user(
        &self,
        inviter: &User,
        match_id: MatchId,
        request: InviteRequest,
    ) -> Result<MatchInvitation, AppError> {
        let m = self.load(match_id).await?;
        let allowed = Self::may_moderate(inviter, &m)
            || self
                .storage
                .get_confirmation(inviter.id, match_id)
                .await?
                .is_some_and(|c| c.status == ApprovalStatus::Approved);
        if !allowed {
            return Err(AppError::Forbidden(
                "only participants may invite to this match".to_string(),
            ));
        }

        let (invitee_id, email) = match (request.user_id, request.email) {
            (Some(user_id), None) => {
                if self.storage.get_user(user_id).await?.is_none() {
                    return Err(AppError::not_found("user"));
                }
                (Some(user_id), None)
            },
            (None, Some(email)) => {
                validate_email(email.trim())?;
                (None, Some(normalize_email(&email)))
            },
            _ => {
                return Err(AppError::Validation(
                    "exactly one of userId and email is required".to_string(),
                ))
            },
        };

        let invitation = self
            .storage
            .insert_invitation(MatchInvitation {
                id: Uuid::new_v4(),
                match_id,
                inviter_id: inviter.id,
                invitee_id,
                email,
                status: InvitationStatus::Sent,
                created_at: Utc::now(),
                responded_at: None,
            })
            .await?;

        if let Some(invitee_id) = invitee_id {
            notifications::notify(
                self.storage.as_ref(),
                invitee_id,
                NotificationKind::MatchInvitation,
                "Match invitation",
                format!("{} invited you to \"{}\"", inviter.name, m.title),
                Some(invitation.id),
            )
            .await;
        }
        tracing::info!(%match_id, invitation_id = %invitation.id, "invitation sent");
        Ok(invitation)
    }

    pub async fn list_invitations(
        &self,
        actor: &User,
        match_id: MatchId,
    ) -> Result<Vec<MatchInvitation>, AppError> {
        let m = self.load(match_id).await?;
        if !Self::may_moderate(actor, &m) {
            return Err(AppError::Forbidden(
                "only the creator or a moderator may list invitations".to_string(),
            ));
        }
        self.storage.list_invitations_by_match(match_id).await
    }

    /// Accepting an invitation confirms the invitee outright, ignoring
    /// approval and capacity gates
    pub async fn respond_to_invitation(
        &self,
        user: &User,
        invitation_id: Uuid,
        decision: InvitationStatus,
    ) -> Result<MatchInvitation, AppError> {
        let mut invitation = self
            .storage
            .get_invitation(invitation_id)
            .await?
            .ok_or_else(|| AppError::not_found("invitation"))?;

        let addressed = invitation.invitee_id == Some(user.id)
            || invitation
                .email
                .as_deref()
                .is_some_and(|email| email == normalize_email(&user.email));
        if !addressed {
            return Err(AppError::Forbidden(
                "invitation is addressed to someone else".to_string(),
            ));
        }
        if decision == InvitationStatus::Sent {
            return Err(AppError::Validation(
                "decision must be accepted or rejected".to_string(),
            ));
        }
        if invitation.status != InvitationStatus::Sent {
            return Err(AppError::Conflict(
                "invitation was already answered".to_string(),
            ));
        }

        let m = self.load(invitation.match_id).await?;
        invitation.status = decision;
        invitation.responded_at = Some(Utc::now());
        let invitation = self.storage.update_invitation(invitation).await?;

        if decision == InvitationStatus::Accepted {
            let mut confirmation = self
                .storage
                .get_confirmation(user.id, m.id)
                .await?
                .unwrap_or_else(|| Confirmation::new(user.id, m.id, ApprovalStatus::Approved));
            confirmation.status = ApprovalStatus::Approved;
            confirmation.mark(true, Utc::now());
            self.store_confirmation(confirmation).await?;

            notifications::notify(
                self.storage.as_ref(),
                invitation.inviter_id,
                NotificationKind::InvitationAccepted,
                "Invitation accepted",
                format!("{} will play in \"{}\"", user.name, m.title),
                Some(m.id),
            )
            .await;
        }
        tracing::info!(%invitation_id, user_id = %user.id, decision = %decision, "invitation answered");
        Ok(invitation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::Duration;
    use matchday_common::{Plan, Role};

    fn manager(policy: CapacityPolicy) -> MatchManager {
        let settings = MatchSettings {
            capacity_policy: policy,
            ..MatchSettings::default()
        };
        MatchManager::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(ConnectionRegistry::new()),
            settings,
        )
    }

    async fn user(manager: &MatchManager, name: &str, plan: Plan) -> User {
        manager
            .storage
            .insert_user(User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                credential_hash: String::new(),
                role: Role::Player,
                plan,
                position: None,
                photo_url: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    fn request(max_players: u32, requires_approval: bool) -> CreateMatchRequest {
        CreateMatchRequest {
            title: "Sunday league".to_string(),
            description: None,
            location: "Hackney Marshes".to_string(),
            date: Utc::now() + Duration::days(3),
            max_players,
            is_public: true,
            auto_release: true,
            requires_approval,
        }
    }

    #[test]
    fn test_invite_code_shape() {
        let manager = manager(CapacityPolicy::Advisory);
        let code = manager.generate_code();
        assert_eq!(code.len(), 8);
        assert!(code.bytes().all(|b| INVITE_ALPHABET.contains(&b)));
        assert_eq!(
            manager.invite_link(&code),
            format!("http://localhost:3000/join/{code}")
        );
    }

    #[tokio::test]
    async fn test_strict_capacity_rejects_overflow() {
        let manager = manager(CapacityPolicy::Strict);
        let host = user(&manager, "Host", Plan::Basic).await;
        let m = manager.create_match(&host, request(4, false)).await.unwrap();

        for i in 0..4 {
            let player = user(&manager, &format!("Player{i}"), Plan::Free).await;
            manager.join_by_code(&player, &m.invite_code).await.unwrap();
        }
        let late = user(&manager, "Late", Plan::Free).await;
        let err = manager.join_by_code(&late, &m.invite_code).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_advisory_capacity_admits_overflow() {
        let manager = manager(CapacityPolicy::Advisory);
        let host = user(&manager, "Host", Plan::Basic).await;
        let m = manager.create_match(&host, request(4, false)).await.unwrap();

        for i in 0..5 {
            let player = user(&manager, &format!("Player{i}"), Plan::Free).await;
            manager.join_by_code(&player, &m.invite_code).await.unwrap();
        }
        assert_eq!(manager.list_confirmations(m.id).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_confirm_requires_approval_first() {
        let manager = manager(CapacityPolicy::Advisory);
        let host = user(&manager, "Host", Plan::Basic).await;
        let player = user(&manager, "Player", Plan::Free).await;
        let m = manager.create_match(&host, request(10, true)).await.unwrap();

        let err = manager.set_confirmation(&player, m.id, true).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        manager.join_by_code(&player, &m.invite_code).await.unwrap();
        manager
            .review_participant(&host, m.id, player.id, ApprovalStatus::Approved)
            .await
            .unwrap();
        let confirmation = manager.set_confirmation(&player, m.id, true).await.unwrap();
        assert!(confirmation.confirmed);
        assert_eq!(confirmation.status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn test_rejected_player_cannot_confirm_or_rejoin() {
        let manager = manager(CapacityPolicy::Advisory);
        let host = user(&manager, "Host", Plan::Basic).await;
        let player = user(&manager, "Player", Plan::Free).await;
        let m = manager.create_match(&host, request(10, true)).await.unwrap();

        manager.join_by_code(&player, &m.invite_code).await.unwrap();
        let rejected = manager
            .review_participant(&host, m.id, player.id, ApprovalStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(rejected.status, ApprovalStatus::Rejected);
        assert!(!rejected.confirmed);
        assert!(rejected.confirmed_at.is_none());

        let notices = manager.storage.list_notifications(player.id).await.unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NotificationKind::MatchRejected);
        assert_eq!(notices[0].related_id, Some(m.id));

        let err = manager.set_confirmation(&player, m.id, true).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = manager.join_by_code(&player, &m.invite_code).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let stored = manager
            .storage
            .get_confirmation(player.id, m.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ApprovalStatus::Rejected);
        assert!(!stored.confirmed);

        // withdrawing is still allowed
        let withdrawn = manager.set_confirmation(&player, m.id, false).await.unwrap();
        assert_eq!(withdrawn.status, ApprovalStatus::Rejected);
    }

    #[tokio::test]
    async fn test_rejection_on_open_match_blocks_self_confirm() {
        let manager = manager(CapacityPolicy::Advisory);
        let host = user(&manager, "Host", Plan::Basic).await;
        let player = user(&manager, "Player", Plan::Free).await;
        let m = manager.create_match(&host, request(10, false)).await.unwrap();

        manager.join_by_code(&player, &m.invite_code).await.unwrap();
        manager
            .review_participant(&host, m.id, player.id, ApprovalStatus::Rejected)
            .await
            .unwrap();

        let err = manager.set_confirmation(&player, m.id, true).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_invitation_lifts_rejection() {
        let manager = manager(CapacityPolicy::Advisory);
        let host = user(&manager, "Host", Plan::Basic).await;
        let player = user(&manager, "Player", Plan::Free).await;
        let m = manager.create_match(&host, request(10, true)).await.unwrap();

        manager.join_by_code(&player, &m.invite_code).await.unwrap();
        manager
            .review_participant(&host, m.id, player.id, ApprovalStatus::Rejected)
            .await
            .unwrap();

        let invitation = manager
            .invite_user(
                &host,
                m.id,
                InviteRequest {
                    user_id: Some(player.id),
                    email: None,
                },
            )
            .await
            .unwrap();
        manager
            .respond_to_invitation(&player, invitation.id, InvitationStatus::Accepted)
            .await
            .unwrap();

        let stored = manager
            .storage
            .get_confirmation(player.id, m.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ApprovalStatus::Approved);
        assert!(stored.confirmed);
    }

    #[tokio::test]
    async fn test_reopening_finished_match_counts_against_quota() {
        let manager = manager(CapacityPolicy::Advisory);
        let host = user(&manager, "Host", Plan::Basic).await;
        let finish = MatchPatch {
            status: Some(MatchStatus::Finished),
            ..MatchPatch::default()
        };
        let reopen = MatchPatch {
            status: Some(MatchStatus::Scheduled),
            ..MatchPatch::default()
        };

        let a = manager.create_match(&host, request(10, false)).await.unwrap();
        let b = manager.create_match(&host, request(10, false)).await.unwrap();
        manager.update_match(&host, a.id, finish.clone()).await.unwrap();
        manager.update_match(&host, b.id, finish.clone()).await.unwrap();
        let c = manager.create_match(&host, request(10, false)).await.unwrap();
        manager.create_match(&host, request(10, false)).await.unwrap();

        let err = manager.update_match(&host, a.id, reopen.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded(_)));
        assert_eq!(manager.get_match(a.id).await.unwrap().status, MatchStatus::Finished);

        // edits that keep a finished match finished are not gated
        let renamed = manager
            .update_match(
                &host,
                a.id,
                MatchPatch {
                    title: Some("Last season".to_string()),
                    ..MatchPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.title, "Last season");

        manager.update_match(&host, c.id, finish).await.unwrap();
        let reopened = manager.update_match(&host, a.id, reopen).await.unwrap();
        assert_eq!(reopened.status, MatchStatus::Scheduled);
    }
}
