// SPDX-License-Identifier: MIT

//! Plan lifecycle and membership engine.
//!
//! Join and leave are single atomic read-modify-write units: the
//! capacity check, the participants mutation, both point deltas and the
//! creator notification commit together or not at all.

use crate::error::{AppError, Result};
use crate::models::{MemberProfile, Plan, PlanCategory, PlanDetails};
use crate::services::fanout;
use crate::session::SessionContext;
use crate::store::{collections, Direction, MemoryStore, Query, TxnError};
use chrono::{DateTime, Utc};

/// Points credited to both parties on a join, debited on a leave.
pub const XP_PER_JOIN: i64 = 50;

/// Creation-time cap on plans a member may hold at once.
pub const MAX_LIVE_PLANS: usize = 3;

/// Input for plan creation.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub details: PlanDetails,
    /// RFC3339; `None` means "flexible".
    pub scheduled_time: Option<String>,
    pub capacity: u32,
}

#[derive(Clone)]
pub struct PlanService {
    store: MemoryStore,
}

impl PlanService {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a plan.
    ///
    /// The live-plan quota is checked via a fresh read immediately
    /// before the write, *not* transactionally: two rapid creations
    /// from the same member can both pass the check. Preserved as-is;
    /// see DESIGN.md.
    pub fn create(&self, session: &SessionContext, new_plan: NewPlan) -> Result<(String, Plan)> {
        if new_plan.capacity < 2 {
            return Err(AppError::BadRequest(
                "Capacity must be at least 2".to_string(),
            ));
        }
        if let Some(raw) = new_plan.scheduled_time.as_deref() {
            if crate::time_utils::parse_rfc3339(raw).is_none() {
                return Err(AppError::BadRequest(
                    "scheduled_time must be an RFC3339 datetime".to_string(),
                ));
            }
        }

        let live = self.live_plan_count(&session.member_id)?;
        if live >= MAX_LIVE_PLANS {
            return Err(AppError::QuotaExceeded(live));
        }

        // Denormalize the creator onto the plan; no live join against
        // the profile afterwards.
        let profile: MemberProfile = self
            .store
            .get(collections::USERS, &session.member_id)?
            .ok_or(AppError::Unauthorized)?;

        let plan = Plan {
            details: new_plan.details,
            scheduled_time: new_plan.scheduled_time,
            created_at: crate::time_utils::now_rfc3339(),
            capacity: new_plan.capacity,
            participants: vec![],
            creator_id: session.member_id.clone(),
            creator_name: profile.display_name,
            creator_avatar: profile.avatar_url,
            creator_payment_handle: profile.payment_handle,
        };

        let id = self.store.add(collections::PLANS, &plan)?;
        tracing::info!(
            plan_id = %id,
            creator = %session.member_id,
            category = plan.details.category().label(),
            "Plan created"
        );

        // Creation is public via the live feed; no targeted alert.
        Ok((id, plan))
    }

    pub fn get(&self, plan_id: &str) -> Result<Plan> {
        self.store
            .get(collections::PLANS, plan_id)?
            .ok_or_else(|| AppError::NotFound("Plan no longer exists".to_string()))
    }

    /// Join a plan: one atomic unit covering the capacity check, the
    /// participants append, both +50 point credits and the JOIN
    /// notification to the creator.
    pub fn join(&self, plan_id: &str, session: &SessionContext) -> Result<Plan> {
        let updated = self
            .store
            .run_atomic(|txn| {
                let mut plan: Plan = txn
                    .get(collections::PLANS, plan_id)?
                    .ok_or_else(|| gone())?;

                if plan.creator_id == session.member_id {
                    return Err(TxnError::Abort(AppError::BadRequest(
                        "Cannot join your own plan".to_string(),
                    )));
                }
                if plan.has_participant(&session.member_id) {
                    return Err(TxnError::Abort(AppError::AlreadyJoined));
                }
                if plan.is_full() {
                    return Err(TxnError::Abort(AppError::PlanFull));
                }

                let mut creator: MemberProfile = txn
                    .get(collections::USERS, &plan.creator_id)?
                    .ok_or_else(|| gone())?;
                let mut joiner: MemberProfile = txn
                    .get(collections::USERS, &session.member_id)?
                    .ok_or(TxnError::Abort(AppError::Unauthorized))?;

                plan.participants.push(session.member_id.clone());
                // Symmetric reward: both parties, exactly.
                creator.points += XP_PER_JOIN;
                joiner.points += XP_PER_JOIN;

                let notification = fanout::join_notification(&plan, session, txn.server_time());

                txn.set(collections::PLANS, plan_id, &plan)?;
                txn.set(collections::USERS, &plan.creator_id, &creator)?;
                txn.set(collections::USERS, &session.member_id, &joiner)?;
                txn.add(collections::NOTIFICATIONS, &notification)?;

                Ok(plan)
            })
            .map_err(AppError::from)?;

        tracing::info!(
            plan_id,
            member = %session.member_id,
            occupancy = updated.participants.len(),
            capacity = updated.capacity,
            "Member joined plan"
        );
        Ok(updated)
    }

    /// Leave a plan: the symmetric inverse of `join`, in one
    /// transaction. Never fails on capacity, only if the plan vanished
    /// or the member was not a participant.
    pub fn leave(&self, plan_id: &str, session: &SessionContext) -> Result<Plan> {
        let updated = self
            .store
            .run_atomic(|txn| {
                let mut plan: Plan = txn
                    .get(collections::PLANS, plan_id)?
                    .ok_or_else(|| gone())?;

                if !plan.has_participant(&session.member_id) {
                    return Err(TxnError::Abort(AppError::NotParticipant));
                }

                let mut creator: MemberProfile = txn
                    .get(collections::USERS, &plan.creator_id)?
                    .ok_or_else(|| gone())?;
                let mut leaver: MemberProfile = txn
                    .get(collections::USERS, &session.member_id)?
                    .ok_or(TxnError::Abort(AppError::Unauthorized))?;

                plan.participants.retain(|p| p != &session.member_id);
                creator.points -= XP_PER_JOIN;
                leaver.points -= XP_PER_JOIN;

                let notification = fanout::leave_notification(&plan, session, txn.server_time());

                txn.set(collections::PLANS, plan_id, &plan)?;
                txn.set(collections::USERS, &plan.creator_id, &creator)?;
                txn.set(collections::USERS, &session.member_id, &leaver)?;
                txn.add(collections::NOTIFICATIONS, &notification)?;

                Ok(plan)
            })
            .map_err(AppError::from)?;

        tracing::info!(
            plan_id,
            member = %session.member_id,
            occupancy = updated.participants.len(),
            "Member left plan"
        );
        Ok(updated)
    }

    /// Delete a plan. Creator-only; silent (no notification fan-out);
    /// previously awarded points are not reversed. The message log is
    /// swept best-effort before the plan document goes away.
    pub fn delete(&self, plan_id: &str, session: &SessionContext) -> Result<()> {
        let plan = self.get(plan_id)?;
        if plan.creator_id != session.member_id {
            return Err(AppError::AccessDenied(
                "Only the creator may delete a plan".to_string(),
            ));
        }

        if let Err(err) = self.clear_messages(plan_id) {
            tracing::warn!(plan_id, error = %err, "Message sweep failed, deleting plan anyway");
        }
        self.store.delete(collections::PLANS, plan_id)?;

        tracing::info!(plan_id, creator = %session.member_id, "Plan deleted");
        Ok(())
    }

    /// The visibility-filtered feed: plans with `now <= expires_at`,
    /// newest first, optionally narrowed to one category.
    pub fn feed(
        &self,
        now: DateTime<Utc>,
        category: Option<PlanCategory>,
    ) -> Result<Vec<(String, Plan)>> {
        let docs = self.store.query(
            &Query::collection(collections::PLANS)
                .order_by("created_at", Direction::Descending),
        )?;

        let mut plans = Vec::with_capacity(docs.len());
        for doc in docs {
            let plan: Plan = match doc.to_obj() {
                Ok(plan) => plan,
                Err(err) => {
                    tracing::warn!(plan_id = %doc.id, error = %err, "Skipping malformed plan");
                    continue;
                }
            };
            if !plan.is_visible(now) {
                continue;
            }
            if category.is_some_and(|c| plan.details.category() != c) {
                continue;
            }
            plans.push((doc.id, plan));
        }
        Ok(plans)
    }

    /// Opportunistically delete the caller's own expired plans.
    ///
    /// Owner-scoped and best-effort: failures are logged and ignored,
    /// and the read-time visibility filter never relies on this having
    /// run.
    pub fn sweep_expired(&self, session: &SessionContext, now: DateTime<Utc>) {
        let docs = match self.store.query(
            &Query::collection(collections::PLANS).filter("creator_id", session.member_id.as_str()),
        ) {
            Ok(docs) => docs,
            Err(err) => {
                tracing::warn!(error = %err, "Expiry sweep query failed");
                return;
            }
        };

        for doc in docs {
            let Ok(plan) = doc.to_obj::<Plan>() else {
                continue;
            };
            if plan.is_visible(now) {
                continue;
            }
            if let Err(err) = self.clear_messages(&doc.id) {
                tracing::warn!(plan_id = %doc.id, error = %err, "Expired-plan message sweep failed");
            }
            match self.store.delete(collections::PLANS, &doc.id) {
                Ok(()) => tracing::debug!(plan_id = %doc.id, "Swept expired plan"),
                Err(err) => {
                    tracing::warn!(plan_id = %doc.id, error = %err, "Expired-plan delete failed")
                }
            }
        }
    }

    /// Quota input: all stored plans by this creator. Every stored plan
    /// is OPEN or FULL by derivation, so the count is the live count.
    fn live_plan_count(&self, member_id: &str) -> Result<usize> {
        let docs = self
            .store
            .query(&Query::collection(collections::PLANS).filter("creator_id", member_id))?;
        Ok(docs.len())
    }

    fn clear_messages(&self, plan_id: &str) -> Result<()> {
        let collection = collections::plan_messages(plan_id);
        let docs = self.store.query(&Query::collection(collection.clone()))?;
        for doc in docs {
            self.store.delete(&collection, &doc.id)?;
        }
        Ok(())
    }
}

fn gone() -> TxnError<AppError> {
    TxnError::Abort(AppError::NotFound("Plan no longer exists".to_string()))
}
