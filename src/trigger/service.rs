use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use super::conditions::conditions_met;
use super::executor::ActionExecutor;
use super::models::{
    ActionOutcome, ActionStatus, EventTrigger, TriggerOutcome, TriggerResult, TriggerState,
};
use super::scheduler::ActionScheduler;
use crate::{
    catalog::Catalog,
    clock::Clock,
    event::ActivityEvent,
    shared::AppError,
    storage::{Storage, UserLocks},
};

/// Reacts to tracked events with the catalog's triggers
pub struct TriggerSystem {
    storage: Arc<dyn Storage>,
    catalog: Arc<Catalog>,
    executor: Arc<ActionExecutor>,
    scheduler: ActionScheduler,
    clock: Arc<dyn Clock>,
}

impl TriggerSystem {
    pub fn new(
        storage: Arc<dyn Storage>,
        catalog: Arc<Catalog>,
        executor: Arc<ActionExecutor>,
        locks: Arc<UserLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            catalog,
            scheduler: ActionScheduler::new(executor.clone(), locks),
            executor,
            clock,
        }
    }

    pub fn scheduler(&self) -> &ActionScheduler {
        &self.scheduler
    }

    /// Runs every active trigger listening for the event's type, in catalog
    /// order. The caller holds the user's lock. Each trigger sees the profile
    /// as left by the triggers before it. A storage failure is reported in
    /// that trigger's outcome and the remaining triggers still run.
    #[instrument(skip(self, event), fields(user_id = %event.user_id, event_type = %event.event_type))]
    pub async fn process(&self, event: &ActivityEvent) -> Vec<TriggerOutcome> {
        let mut outcomes = Vec::new();

        for trigger in self.catalog.triggers_for(event.event_type) {
            let result = match self.run_trigger(trigger, event).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        user_id = %event.user_id,
                        trigger_id = %trigger.id,
                        "Trigger skipped: {}",
                        e
                    );
                    TriggerResult::Errored {
                        error: e.to_string(),
                    }
                }
            };
            debug!(
                trigger_id = %trigger.id,
                fired = matches!(result, TriggerResult::Fired { .. }),
                "Trigger evaluated"
            );
            outcomes.push(TriggerOutcome {
                trigger_id: trigger.id.clone(),
                result,
            });
        }

        outcomes
    }

    async fn run_trigger(
        &self,
        trigger: &EventTrigger,
        event: &ActivityEvent,
    ) -> Result<TriggerResult, AppError> {
        let profile = self
            .storage
            .get_profile(&event.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile for user '{}'", event.user_id)))?;

        if !conditions_met(&trigger.conditions, event, &profile) {
            return Ok(TriggerResult::ConditionsNotMet);
        }

        let now = self.clock.now();
        let mut state = self
            .storage
            .get_trigger_state(&trigger.id, &event.user_id)
            .await?
            .unwrap_or_else(|| TriggerState::new(&trigger.id, &event.user_id));

        if let Some(max_triggers) = trigger.max_triggers {
            if state.trigger_count >= max_triggers {
                return Ok(TriggerResult::CapReached {
                    trigger_count: state.trigger_count,
                });
            }
        }

        if let Some(remaining_secs) = cooldown_remaining(trigger, &state, now) {
            return Ok(TriggerResult::CoolingDown { remaining_secs });
        }

        // Recorded before any action runs
        state.trigger_count += 1;
        state.last_triggered_at = Some(now);
        self.storage.put_trigger_state(&state).await?;

        let mut actions = Vec::with_capacity(trigger.actions.len());
        for action in &trigger.actions {
            let status = match action.delay_ms.filter(|delay_ms| *delay_ms > 0) {
                Some(delay_ms) => {
                    self.scheduler
                        .schedule(
                            &event.user_id,
                            &trigger.id,
                            action.kind.clone(),
                            Duration::from_millis(delay_ms),
                        )
                        .await;
                    let run_at = i64::try_from(delay_ms)
                        .ok()
                        .and_then(|ms| now.checked_add_signed(chrono::Duration::milliseconds(ms)))
                        .unwrap_or(now);
                    ActionStatus::Scheduled { run_at }
                }
                None => match self
                    .executor
                    .execute(&event.user_id, &trigger.id, &action.kind)
                    .await
                {
                    Ok(()) => ActionStatus::Succeeded,
                    Err(e) => {
                        warn!(
                            user_id = %event.user_id,
                            trigger_id = %trigger.id,
                            action = action.kind.name(),
                            "Trigger action failed: {}",
                            e
                        );
                        ActionStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                },
            };
            actions.push(ActionOutcome {
                action: action.kind.name().to_string(),
                status,
            });
        }

        info!(
            user_id = %event.user_id,
            trigger_id = %trigger.id,
            trigger_count = state.trigger_count,
            "Trigger fired"
        );

        Ok(TriggerResult::Fired { actions })
    }
}

/// Whole seconds left on the user's cooldown, rounded up
fn cooldown_remaining(
    trigger: &EventTrigger,
    state: &TriggerState,
    now: DateTime<Utc>,
) -> Option<i64> {
    let cooldown_secs = i64::try_from(trigger.cooldown_secs?).unwrap_or(i64::MAX);
    let last = state.last_triggered_at?;
    let elapsed_ms = (now - last).num_milliseconds();
    let cooldown_ms = cooldown_secs.saturating_mul(1000);

    if elapsed_ms >= cooldown_ms {
        return None;
    }
    let remaining_ms = cooldown_ms - elapsed_ms;
    Some((remaining_ms + 999) / 1000)
}
