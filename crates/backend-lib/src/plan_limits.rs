// ============================
// crates/backend-lib/src/plan_limits.rs
// ============================
//! Subscription quotas for creating and joining matches.
use matchday_common::{Plan, PlanLimits, User};

use crate::error::AppError;
use crate::storage::Storage;

/// Ceiling on concurrently open matches per plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub max_created: u32,
    pub max_joined: u32,
}

pub const fn quota(plan: Plan) -> Quota {
    match plan {
        Plan::Free => Quota {
            max_created: 0,
            max_joined: 1,
        },
        Plan::Basic => Quota {
            max_created: 2,
            max_joined: 4,
        },
        Plan::Intermediate => Quota {
            max_created: 5,
            max_joined: 10,
        },
        Plan::Advanced => Quota {
            max_created: 10,
            max_joined: 20,
        },
    }
}

/// Compare raw counts with the plan's table entry
pub fn evaluate_counts(plan: Plan, created_count: u32, joined_count: u32) -> PlanLimits {
    let Quota {
        max_created,
        max_joined,
    } = quota(plan);
    PlanLimits {
        plan,
        can_create: created_count < max_created,
        can_join: joined_count < max_joined,
        created_count,
        joined_count,
        max_created,
        max_joined,
    }
}

/// Count the user's open created matches and live participations.
///
/// A missing quota is a normal answer here; only storage failures error.
pub async fn evaluate(storage: &dyn Storage, user: &User) -> Result<PlanLimits, AppError> {
    let created = storage
        .list_matches_created_by(user.id)
        .await?
        .iter()
        .filter(|m| m.status.is_open())
        .count();

    let mut joined = 0usize;
    for confirmation in storage.list_confirmations_by_user(user.id).await? {
        if !confirmation.is_active() {
            continue;
        }
        if let Some(m) = storage.get_match(confirmation.match_id).await? {
            if m.status.is_open() {
                joined += 1;
            }
        }
    }

    Ok(evaluate_counts(
        user.plan,
        u32::try_from(created).unwrap_or(u32::MAX),
        u32::try_from(joined).unwrap_or(u32::MAX),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_plan_never_creates() {
        for created in [0, 1, 5] {
            assert!(!evaluate_counts(Plan::Free, created, 0).can_create);
        }
    }

    #[test]
    fn test_free_plan_joins_once() {
        assert!(evaluate_counts(Plan::Free, 0, 0).can_join);
        assert!(!evaluate_counts(Plan::Free, 0, 1).can_join);
    }

    #[test]
    fn test_table_boundaries() {
        let basic = evaluate_counts(Plan::Basic, 1, 3);
        assert!(basic.can_create && basic.can_join);

        let basic = evaluate_counts(Plan::Basic, 2, 4);
        assert!(!basic.can_create && !basic.can_join);
        assert_eq!((basic.max_created, basic.max_joined), (2, 4));

        assert_eq!(quota(Plan::Intermediate), Quota { max_created: 5, max_joined: 10 });
        assert_eq!(quota(Plan::Advanced), Quota { max_created: 10, max_joined: 20 });
    }

    #[test]
    fn test_counts_are_reported() {
        let limits = evaluate_counts(Plan::Advanced, 3, 7);
        assert_eq!(limits.created_count, 3);
        assert_eq!(limits.joined_count, 7);
        assert_eq!(limits.plan, Plan::Advanced);
    }
}
