use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{resolve_slots, BookingMode, ScheduleError, SlotQuery};
use crate::limits::*;
use crate::model::*;
use crate::observability::{
    RESOLVE_DURATION_SECONDS, RESOLVE_TOTAL, SCHEDULE_ERRORS_TOTAL, SLOTS_RETURNED,
};
use crate::store::ScheduleStore;

/// A customer-facing availability question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRequest {
    pub day_of_week: DayOfWeek,
    /// Empty for "salon only", one id for a fixed stylist, several for "any of".
    #[serde(default)]
    pub stylists: Vec<StylistId>,
    /// Service whose duration to use when `duration` is absent.
    #[serde(default)]
    pub service_id: Option<ServiceId>,
    #[serde(default)]
    pub duration: Option<ServiceDuration>,
    #[serde(default)]
    pub step: Option<SlotStep>,
    #[serde(default)]
    pub booked: HashMap<StylistId, Vec<TimeInterval>>,
}

impl SlotRequest {
    pub fn new(day_of_week: DayOfWeek) -> Self {
        Self {
            day_of_week,
            stylists: Vec::new(),
            service_id: None,
            duration: None,
            step: None,
            booked: HashMap::new(),
        }
    }

    pub fn mode(&self) -> BookingMode {
        BookingMode::for_candidates(self.stylists.len())
    }
}

/// Answers availability questions against the schedule store.
pub struct BookingDesk {
    store: Arc<ScheduleStore>,
    default_step: SlotStep,
}

impl BookingDesk {
    pub fn new(store: Arc<ScheduleStore>, default_step: SlotStep) -> Self {
        Self {
            store,
            default_step,
        }
    }

    pub fn store(&self) -> &Arc<ScheduleStore> {
        &self.store
    }

    pub fn default_step(&self) -> SlotStep {
        self.default_step
    }

    /// Explicit duration wins; otherwise the named service's duration.
    async fn duration_for(&self, req: &SlotRequest) -> Result<ServiceDuration, ScheduleError> {
        if let Some(d) = req.duration {
            return Ok(d);
        }
        match req.service_id {
            Some(id) => self
                .store
                .service(&id)
                .await
                .map(|s| s.duration)
                .ok_or(ScheduleError::NotFound(id)),
            None => Err(ScheduleError::MissingDuration),
        }
    }

    /// Owned engine query for the request.
    pub async fn query(&self, req: &SlotRequest) -> Result<SlotQuery, ScheduleError> {
        let duration = self.duration_for(req).await?;
        let step = req.step.unwrap_or(self.default_step);
        let mut query = self
            .store
            .snapshot(req.day_of_week, &req.stylists, duration, step)
            .await?;
        for (id, booked) in &req.booked {
            if booked.len() > MAX_BOOKED_PER_STYLIST {
                return Err(ScheduleError::LimitExceeded("too many booked intervals"));
            }
            query = query.with_booked(*id, booked.clone());
        }
        Ok(query)
    }

    pub async fn available_slots(&self, req: &SlotRequest) -> Result<Vec<ClockTime>, ScheduleError> {
        let started = Instant::now();
        let result = self.query(req).await.map(|q| resolve_slots(&q));
        record(req, started, result.as_ref().map(Vec::len));
        result
    }

    /// Whether `start` is a bookable start time for the request.
    pub async fn validate_start(
        &self,
        req: &SlotRequest,
        start: ClockTime,
    ) -> Result<bool, ScheduleError> {
        let started = Instant::now();
        let slots = self.query(req).await.map(|q| resolve_slots(&q));
        record(req, started, slots.as_ref().map(Vec::len));
        slots.map(|slots| slots.binary_search(&start).is_ok())
    }
}

fn record(req: &SlotRequest, started: Instant, outcome: Result<usize, &ScheduleError>) {
    let mode = req.mode().label();
    match outcome {
        Ok(count) => {
            metrics::counter!(RESOLVE_TOTAL, "mode" => mode, "status" => "ok").increment(1);
            metrics::histogram!(RESOLVE_DURATION_SECONDS, "mode" => mode)
                .record(started.elapsed().as_secs_f64());
            metrics::histogram!(SLOTS_RETURNED, "mode" => mode).record(count as f64);
            debug!(
                "resolved {mode} on {} for {} stylist(s): {count} slot(s)",
                req.day_of_week,
                req.stylists.len()
            );
        }
        Err(e) => {
            metrics::counter!(RESOLVE_TOTAL, "mode" => mode, "status" => "error").increment(1);
            metrics::counter!(SCHEDULE_ERRORS_TOTAL, "kind" => e.kind()).increment(1);
            debug!("resolve {mode} on {} failed: {e}", req.day_of_week);
        }
    }
}
