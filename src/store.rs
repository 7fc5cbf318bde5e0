use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::engine::{classify, ScheduleError, SlotQuery};
use crate::limits::*;
use crate::model::*;
use crate::notify::NotifyHub;

/// One stylist's name and per-day overrides; `None` means "follow salon hours".
#[derive(Debug, Clone)]
struct StylistRecord {
    name: String,
    days: [Option<DayAvailability>; 7],
}

impl StylistRecord {
    fn new(name: String) -> Self {
        Self {
            name,
            days: Default::default(),
        }
    }
}

/// Everything a query reads. Replaced or mutated only under the write lock.
#[derive(Debug)]
struct ScheduleState {
    salon: Vec<DayAvailability>,
    stylists: HashMap<StylistId, StylistRecord>,
    services: HashMap<ServiceId, ServiceInfo>,
}

impl ScheduleState {
    fn empty() -> Self {
        Self {
            salon: DayOfWeek::ALL.map(DayAvailability::closed).to_vec(),
            stylists: HashMap::new(),
            services: HashMap::new(),
        }
    }

    fn from_file(file: ScheduleFile) -> Self {
        let mut state = Self::empty();
        for day in file.salon {
            let index = day.day_of_week.index();
            state.salon[index] = day;
        }
        for entry in file.stylists {
            let mut record = StylistRecord::new(entry.name);
            for day in entry.days {
                let index = day.day_of_week.index();
                record.days[index] = Some(day);
            }
            state.stylists.insert(entry.id, record);
        }
        for s in file.services {
            state.services.insert(
                s.id,
                ServiceInfo {
                    id: s.id,
                    name: s.name,
                    duration: s.duration,
                },
            );
        }
        state
    }

    fn stylist_mut(&mut self, id: StylistId) -> Result<&mut StylistRecord, ScheduleError> {
        self.stylists.get_mut(&id).ok_or(ScheduleError::NotFound(id))
    }
}

/// Cache key: a lookup is only valid for the schedule version it was read at.
type LookupKey = (StylistId, DayOfWeek, u64);

/// In-memory schedule source: salon hours, stylists, services.
///
/// Every mutation runs under the state write lock, bumps `version` before
/// releasing it and is broadcast on the notify hub. Readers hold the read
/// lock for the whole of a lookup or snapshot, so they always see a single
/// version. Resolved lookups are cached per `(stylist, day, version)`.
pub struct ScheduleStore {
    state: RwLock<ScheduleState>,
    lookups: DashMap<LookupKey, LookupResult>,
    version: AtomicU64,
    notify: Arc<NotifyHub>,
}

impl ScheduleStore {
    /// Empty store; the salon starts closed every day.
    pub fn new(notify: Arc<NotifyHub>) -> Self {
        Self {
            state: RwLock::new(ScheduleState::empty()),
            lookups: DashMap::new(),
            version: AtomicU64::new(0),
            notify,
        }
    }

    pub fn notify(&self) -> &Arc<NotifyHub> {
        &self.notify
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Caller holds the state write lock.
    fn bump(&self) -> u64 {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::gauge!(crate::observability::SCHEDULE_VERSION).set(version as f64);
        version
    }

    // ── Salon hours ──────────────────────────────────────────

    pub async fn set_salon_day(&self, day: DayAvailability) -> Result<u64, ScheduleError> {
        check_day(&day)?;
        let day_of_week = day.day_of_week;
        let version = {
            let mut state = self.state.write().await;
            state.salon[day_of_week.index()] = day;
            self.bump()
        };
        info!("salon hours set for {day_of_week} (version {version})");
        self.notify.send(&ScheduleEvent::SalonDaySet {
            day: day_of_week,
            version,
        });
        Ok(version)
    }

    pub async fn salon_day(&self, day: DayOfWeek) -> DayAvailability {
        self.state.read().await.salon[day.index()].clone()
    }

    // ── Stylists ─────────────────────────────────────────────

    pub async fn upsert_stylist(&self, id: StylistId, name: String) -> Result<u64, ScheduleError> {
        if name.len() > MAX_NAME_LEN {
            return Err(ScheduleError::LimitExceeded("stylist name too long"));
        }
        let (version, active) = {
            let mut state = self.state.write().await;
            if !state.stylists.contains_key(&id) && state.stylists.len() >= MAX_STYLISTS {
                return Err(ScheduleError::LimitExceeded("too many stylists"));
            }
            state
                .stylists
                .entry(id)
                .and_modify(|r| r.name = name.clone())
                .or_insert_with(|| StylistRecord::new(name));
            (self.bump(), state.stylists.len())
        };
        metrics::gauge!(crate::observability::STYLISTS_ACTIVE).set(active as f64);
        info!("stylist {id} upserted (version {version})");
        self.notify
            .send(&ScheduleEvent::StylistUpserted { id, version });
        Ok(version)
    }

    pub async fn remove_stylist(&self, id: StylistId) -> Result<u64, ScheduleError> {
        let (version, active) = {
            let mut state = self.state.write().await;
            if state.stylists.remove(&id).is_none() {
                return Err(ScheduleError::NotFound(id));
            }
            (self.bump(), state.stylists.len())
        };
        metrics::gauge!(crate::observability::STYLISTS_ACTIVE).set(active as f64);
        info!("stylist {id} removed (version {version})");
        self.notify.send(&ScheduleEvent::StylistRemoved { id, version });
        self.notify.remove(&id);
        Ok(version)
    }

    /// Replace the stylist's entry for `day.day_of_week`.
    pub async fn set_stylist_day(
        &self,
        id: StylistId,
        day: DayAvailability,
    ) -> Result<u64, ScheduleError> {
        check_day(&day)?;
        let day_of_week = day.day_of_week;
        let version = {
            let mut state = self.state.write().await;
            state.stylist_mut(id)?.days[day_of_week.index()] = Some(day);
            self.bump()
        };
        info!("stylist {id} hours set for {day_of_week} (version {version})");
        self.notify.send(&ScheduleEvent::StylistDaySet {
            id,
            day: day_of_week,
            version,
        });
        Ok(version)
    }

    /// Drop the stylist's entry for `day` so they follow salon hours again.
    pub async fn clear_stylist_day(
        &self,
        id: StylistId,
        day: DayOfWeek,
    ) -> Result<u64, ScheduleError> {
        let version = {
            let mut state = self.state.write().await;
            state.stylist_mut(id)?.days[day.index()] = None;
            self.bump()
        };
        info!("stylist {id} hours cleared for {day} (version {version})");
        self.notify
            .send(&ScheduleEvent::StylistDayCleared { id, day, version });
        Ok(version)
    }

    pub async fn stylist(&self, id: &StylistId) -> Option<StylistInfo> {
        self.state.read().await.stylists.get(id).map(|r| StylistInfo {
            id: *id,
            name: r.name.clone(),
        })
    }

    pub async fn stylist_days(&self, id: &StylistId) -> Option<Vec<DayAvailability>> {
        self.state
            .read()
            .await
            .stylists
            .get(id)
            .map(|r| r.days.iter().flatten().cloned().collect())
    }

    pub async fn list_stylists(&self) -> Vec<StylistInfo> {
        let state = self.state.read().await;
        let mut out: Vec<StylistInfo> = state
            .stylists
            .iter()
            .map(|(id, r)| StylistInfo {
                id: *id,
                name: r.name.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        out
    }

    // ── Services ─────────────────────────────────────────────

    pub async fn upsert_service(
        &self,
        id: ServiceId,
        name: String,
        duration: ServiceDuration,
    ) -> Result<u64, ScheduleError> {
        if name.len() > MAX_NAME_LEN {
            return Err(ScheduleError::LimitExceeded("service name too long"));
        }
        let version = {
            let mut state = self.state.write().await;
            if !state.services.contains_key(&id) && state.services.len() >= MAX_SERVICES {
                return Err(ScheduleError::LimitExceeded("too many services"));
            }
            state.services.insert(id, ServiceInfo { id, name, duration });
            self.bump()
        };
        info!("service {id} upserted (version {version})");
        self.notify
            .send(&ScheduleEvent::ServiceUpserted { id, version });
        Ok(version)
    }

    pub async fn remove_service(&self, id: ServiceId) -> Result<u64, ScheduleError> {
        let version = {
            let mut state = self.state.write().await;
            if state.services.remove(&id).is_none() {
                return Err(ScheduleError::NotFound(id));
            }
            self.bump()
        };
        info!("service {id} removed (version {version})");
        self.notify.send(&ScheduleEvent::ServiceRemoved { id, version });
        Ok(version)
    }

    pub async fn service(&self, id: &ServiceId) -> Option<ServiceInfo> {
        self.state.read().await.services.get(id).cloned()
    }

    pub async fn list_services(&self) -> Vec<ServiceInfo> {
        let state = self.state.read().await;
        let mut out: Vec<ServiceInfo> = state.services.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        out
    }

    // ── Lookups ──────────────────────────────────────────────

    /// What the stylist's schedule says about `day`, cached per version.
    pub async fn lookup(&self, id: &StylistId, day: DayOfWeek) -> Result<LookupResult, ScheduleError> {
        let state = self.state.read().await;
        self.lookup_in(&state, id, day)
    }

    /// Caller holds the state read lock, so the version cannot move underneath.
    fn lookup_in(
        &self,
        state: &ScheduleState,
        id: &StylistId,
        day: DayOfWeek,
    ) -> Result<LookupResult, ScheduleError> {
        let key = (*id, day, self.version());
        if let Some(hit) = self.lookups.get(&key) {
            metrics::counter!(crate::observability::LOOKUP_CACHE_HITS_TOTAL).increment(1);
            return Ok(hit.value().clone());
        }
        metrics::counter!(crate::observability::LOOKUP_CACHE_MISSES_TOTAL).increment(1);

        let record = state.stylists.get(id).ok_or(ScheduleError::NotFound(*id))?;
        let result = classify(record.days[day.index()].as_ref());
        self.lookups.insert(key, result.clone());
        Ok(result)
    }

    /// Drop cached lookups from older versions. Returns how many were removed.
    pub fn prune_cache(&self) -> usize {
        let current = self.version();
        let before = self.lookups.len();
        self.lookups.retain(|(_, _, version), _| *version == current);
        before.saturating_sub(self.lookups.len())
    }

    pub fn cached_lookups(&self) -> usize {
        self.lookups.len()
    }

    /// Owned query for `day` over `candidates`, detached from the store.
    ///
    /// Salon hours and every candidate lookup are read at one schedule version.
    pub async fn snapshot(
        &self,
        day: DayOfWeek,
        candidates: &[StylistId],
        duration: ServiceDuration,
        step: SlotStep,
    ) -> Result<SlotQuery, ScheduleError> {
        if candidates.len() > MAX_CANDIDATES {
            return Err(ScheduleError::LimitExceeded("too many candidate stylists"));
        }
        let state = self.state.read().await;
        let salon = state.salon[day.index()].clone();
        let mut schedule = EntitySchedule::new();
        for id in candidates {
            match self.lookup_in(&state, id, day)? {
                LookupResult::NoOverride => {}
                LookupResult::ClosedAllDay => schedule.upsert(*id, DayAvailability::closed(day)),
                LookupResult::Intervals(list) => {
                    schedule.upsert(*id, DayAvailability::open(day, list))
                }
            }
        }
        drop(state);
        SlotQuery::new(salon, schedule, candidates.to_vec(), duration, step)
    }

    // ── Bulk load ────────────────────────────────────────────

    /// Replace the whole store with `file`. Nothing changes if validation fails.
    ///
    /// The new state is built before the write lock is taken and swapped in
    /// whole; readers see either the old schedule or the new one.
    pub async fn load(&self, file: ScheduleFile) -> Result<u64, ScheduleError> {
        file.validate()?;
        let next = ScheduleState::from_file(file);
        let (stylists, services) = (next.stylists.len(), next.services.len());

        let version = {
            let mut state = self.state.write().await;
            *state = next;
            self.bump()
        };
        self.prune_cache();
        metrics::gauge!(crate::observability::STYLISTS_ACTIVE).set(stylists as f64);
        info!("schedule loaded: {stylists} stylists, {services} services (version {version})");
        self.notify.send(&ScheduleEvent::Reloaded { version });
        Ok(version)
    }
}

fn check_day(day: &DayAvailability) -> Result<(), ScheduleError> {
    if day.intervals.len() > MAX_INTERVALS_PER_DAY {
        return Err(ScheduleError::LimitExceeded("too many intervals in one day"));
    }
    Ok(())
}

// ── Schedule file ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleFile {
    #[serde(default)]
    pub salon: Vec<DayAvailability>,
    #[serde(default)]
    pub stylists: Vec<StylistEntry>,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylistEntry {
    pub id: StylistId,
    pub name: String,
    #[serde(default)]
    pub days: Vec<DayAvailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub id: ServiceId,
    pub name: String,
    pub duration: ServiceDuration,
}

impl ScheduleFile {
    pub fn from_json(raw: &str) -> Result<Self, ScheduleError> {
        serde_json::from_str(raw).map_err(|e| ScheduleError::Malformed(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.stylists.len() > MAX_STYLISTS {
            return Err(ScheduleError::LimitExceeded("too many stylists"));
        }
        if self.services.len() > MAX_SERVICES {
            return Err(ScheduleError::LimitExceeded("too many services"));
        }

        let mut seen = HashSet::new();
        for day in &self.salon {
            check_day(day)?;
            if !seen.insert(day.day_of_week) {
                return Err(ScheduleError::DuplicateDay {
                    stylist: None,
                    day: day.day_of_week,
                });
            }
        }

        let mut ids = HashSet::new();
        let mut schedule = EntitySchedule::new();
        for entry in &self.stylists {
            if entry.name.len() > MAX_NAME_LEN {
                return Err(ScheduleError::LimitExceeded("stylist name too long"));
            }
            if !ids.insert(entry.id) {
                return Err(ScheduleError::Malformed(format!("duplicate stylist {}", entry.id)));
            }
            for day in &entry.days {
                check_day(day)?;
                schedule.insert(entry.id, day.clone())?;
            }
        }

        let mut service_ids = HashSet::new();
        for s in &self.services {
            if s.name.len() > MAX_NAME_LEN {
                return Err(ScheduleError::LimitExceeded("service name too long"));
            }
            if !service_ids.insert(s.id) {
                return Err(ScheduleError::Malformed(format!("duplicate service {}", s.id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use ulid::Ulid;

    fn iv(open: &str, close: &str) -> TimeInterval {
        TimeInterval::parse(open, close).unwrap()
    }

    fn store() -> ScheduleStore {
        ScheduleStore::new(Arc::new(NotifyHub::new()))
    }

    fn dur(m: u16) -> ServiceDuration {
        ServiceDuration::new(m).unwrap()
    }

    fn step(m: u16) -> SlotStep {
        SlotStep::new(m).unwrap()
    }

    #[tokio::test]
    async fn salon_starts_closed() {
        let s = store();
        for day in DayOfWeek::ALL {
            assert!(s.salon_day(day).await.is_closed);
        }
        assert_eq!(s.version(), 0);
    }

    #[tokio::test]
    async fn mutations_bump_version() {
        let s = store();
        let id = Ulid::new();
        let v1 = s
            .set_salon_day(DayAvailability::open(DayOfWeek::MONDAY, vec![iv("09:00", "18:00")]))
            .await
            .unwrap();
        let v2 = s.upsert_stylist(id, "Ana".into()).await.unwrap();
        let v3 = s
            .set_stylist_day(id, DayAvailability::closed(DayOfWeek::MONDAY))
            .await
            .unwrap();
        assert!(v1 < v2 && v2 < v3);
        assert_eq!(s.version(), v3);
    }

    #[tokio::test]
    async fn stylist_day_roundtrip_through_lookup() {
        let s = store();
        let id = Ulid::new();
        s.upsert_stylist(id, "Ana".into()).await.unwrap();
        assert_eq!(s.lookup(&id, DayOfWeek::MONDAY).await.unwrap(), LookupResult::NoOverride);

        s.set_stylist_day(id, DayAvailability::open(DayOfWeek::MONDAY, vec![iv("10:00", "14:00")]))
            .await
            .unwrap();
        assert_eq!(
            s.lookup(&id, DayOfWeek::MONDAY).await.unwrap(),
            LookupResult::Intervals(vec![iv("10:00", "14:00")])
        );

        s.set_stylist_day(id, DayAvailability::closed(DayOfWeek::MONDAY))
            .await
            .unwrap();
        assert_eq!(s.lookup(&id, DayOfWeek::MONDAY).await.unwrap(), LookupResult::ClosedAllDay);

        s.clear_stylist_day(id, DayOfWeek::MONDAY).await.unwrap();
        assert_eq!(s.lookup(&id, DayOfWeek::MONDAY).await.unwrap(), LookupResult::NoOverride);
    }

    #[tokio::test]
    async fn unknown_stylist_is_not_found() {
        let s = store();
        let id = Ulid::new();
        assert_eq!(s.lookup(&id, DayOfWeek::MONDAY).await, Err(ScheduleError::NotFound(id)));
        assert_eq!(
            s.set_stylist_day(id, DayAvailability::closed(DayOfWeek::MONDAY)).await,
            Err(ScheduleError::NotFound(id))
        );
        assert_eq!(s.remove_stylist(id).await, Err(ScheduleError::NotFound(id)));
        let snap = s
            .snapshot(DayOfWeek::MONDAY, &[id], dur(30), step(15))
            .await;
        assert!(matches!(snap, Err(ScheduleError::NotFound(_))));
    }

    #[tokio::test]
    async fn lookup_cache_is_versioned() {
        let s = store();
        let id = Ulid::new();
        s.upsert_stylist(id, "Ana".into()).await.unwrap();
        s.lookup(&id, DayOfWeek::MONDAY).await.unwrap();
        s.lookup(&id, DayOfWeek::MONDAY).await.unwrap();
        assert_eq!(s.cached_lookups(), 1);

        s.set_stylist_day(id, DayAvailability::closed(DayOfWeek::MONDAY))
            .await
            .unwrap();
        // Stale entry must not be served.
        assert_eq!(s.lookup(&id, DayOfWeek::MONDAY).await.unwrap(), LookupResult::ClosedAllDay);
        assert_eq!(s.cached_lookups(), 2);

        assert_eq!(s.prune_cache(), 1);
        assert_eq!(s.cached_lookups(), 1);
        assert_eq!(s.prune_cache(), 0);
    }

    #[tokio::test]
    async fn snapshot_builds_engine_query() {
        let s = store();
        let a = Ulid::new();
        let b = Ulid::new();
        let c = Ulid::new();
        s.set_salon_day(DayAvailability::open(DayOfWeek::MONDAY, vec![iv("09:00", "18:00")]))
            .await
            .unwrap();
        s.upsert_stylist(a, "A".into()).await.unwrap();
        s.upsert_stylist(b, "B".into()).await.unwrap();
        s.upsert_stylist(c, "C".into()).await.unwrap();
        s.set_stylist_day(a, DayAvailability::open(DayOfWeek::MONDAY, vec![iv("09:00", "13:00")]))
            .await
            .unwrap();
        s.set_stylist_day(b, DayAvailability::closed(DayOfWeek::MONDAY))
            .await
            .unwrap();

        let q = s
            .snapshot(DayOfWeek::MONDAY, &[a, b, c], dur(60), step(30))
            .await
            .unwrap();
        assert_eq!(q.day(), DayOfWeek::MONDAY);
        assert_eq!(q.candidates, vec![a, b, c]);
        assert!(crate::engine::lookup(&q.schedule, &c, DayOfWeek::MONDAY) == LookupResult::NoOverride);
        assert!(crate::engine::lookup(&q.schedule, &b, DayOfWeek::MONDAY) == LookupResult::ClosedAllDay);
        assert_eq!(
            crate::engine::lookup(&q.schedule, &a, DayOfWeek::MONDAY),
            LookupResult::Intervals(vec![iv("09:00", "13:00")])
        );
    }

    #[tokio::test]
    async fn events_are_broadcast() {
        let s = store();
        let mut feed = s.notify().subscribe_all();
        let id = Ulid::new();
        let mut stylist_rx = s.notify().subscribe(id);
        let version = s.upsert_stylist(id, "Ana".into()).await.unwrap();
        let expected = ScheduleEvent::StylistUpserted { id, version };
        assert_eq!(feed.recv().await.unwrap(), expected);
        assert_eq!(stylist_rx.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn services_crud() {
        let s = store();
        let id = Ulid::new();
        s.upsert_service(id, "Cut".into(), dur(45)).await.unwrap();
        assert_eq!(s.service(&id).await.unwrap().duration, dur(45));
        s.upsert_service(id, "Cut & dry".into(), dur(60)).await.unwrap();
        assert_eq!(s.list_services().await.len(), 1);
        assert_eq!(s.service(&id).await.unwrap().name, "Cut & dry");
        s.remove_service(id).await.unwrap();
        assert!(s.service(&id).await.is_none());
        assert_eq!(s.remove_service(id).await, Err(ScheduleError::NotFound(id)));
    }

    #[tokio::test]
    async fn upsert_keeps_existing_days() {
        let s = store();
        let id = Ulid::new();
        s.upsert_stylist(id, "Ana".into()).await.unwrap();
        s.set_stylist_day(id, DayAvailability::closed(DayOfWeek::FRIDAY))
            .await
            .unwrap();
        s.upsert_stylist(id, "Ana Maria".into()).await.unwrap();
        assert_eq!(s.stylist(&id).await.unwrap().name, "Ana Maria");
        assert_eq!(s.stylist_days(&id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn name_limit_enforced() {
        let s = store();
        let long = "x".repeat(MAX_NAME_LEN + 1);
        let result = s.upsert_stylist(Ulid::new(), long).await;
        assert!(matches!(result, Err(ScheduleError::LimitExceeded(_))));
    }

    #[tokio::test]
    async fn load_replaces_everything() {
        let s = store();
        let old = Ulid::new();
        s.upsert_stylist(old, "Old".into()).await.unwrap();

        let a = Ulid::new();
        let cut = Ulid::new();
        let json = format!(
            r#"{{
                "salon": [
                    {{"day_of_week": 1, "intervals": [{{"open": "09:00", "close": "18:00"}}]}},
                    {{"day_of_week": 0, "is_closed": true}}
                ],
                "stylists": [
                    {{"id": "{a}", "name": "Ana", "days": [
                        {{"day_of_week": 1, "intervals": [{{"open": "09:00", "close": "13:00"}}]}}
                    ]}}
                ],
                "services": [{{"id": "{cut}", "name": "Cut", "duration": 60}}]
            }}"#
        );
        let file = ScheduleFile::from_json(&json).unwrap();
        s.load(file).await.unwrap();

        assert!(s.stylist(&old).await.is_none());
        assert_eq!(s.stylist(&a).await.unwrap().name, "Ana");
        assert_eq!(s.service(&cut).await.unwrap().duration, dur(60));
        assert_eq!(
            s.salon_day(DayOfWeek::MONDAY).await.intervals,
            vec![iv("09:00", "18:00")]
        );
        assert!(s.salon_day(DayOfWeek::TUESDAY).await.is_closed);
        assert_eq!(
            s.lookup(&a, DayOfWeek::MONDAY).await.unwrap(),
            LookupResult::Intervals(vec![iv("09:00", "13:00")])
        );
    }

    #[tokio::test]
    async fn load_rejects_duplicate_days_without_changes() {
        let s = store();
        let keep = Ulid::new();
        s.upsert_stylist(keep, "Keep".into()).await.unwrap();
        let version = s.version();

        let a = Ulid::new();
        let file = ScheduleFile {
            salon: vec![],
            stylists: vec![StylistEntry {
                id: a,
                name: "Ana".into(),
                days: vec![
                    DayAvailability::closed(DayOfWeek::MONDAY),
                    DayAvailability::closed(DayOfWeek::MONDAY),
                ],
            }],
            services: vec![],
        };
        let result = s.load(file).await;
        assert!(matches!(result, Err(ScheduleError::DuplicateDay { stylist: Some(_), .. })));
        assert!(s.stylist(&keep).await.is_some());
        assert_eq!(s.version(), version);

        let salon_dup = ScheduleFile {
            salon: vec![
                DayAvailability::closed(DayOfWeek::SUNDAY),
                DayAvailability::closed(DayOfWeek::SUNDAY),
            ],
            ..Default::default()
        };
        assert!(matches!(
            s.load(salon_dup).await,
            Err(ScheduleError::DuplicateDay { stylist: None, .. })
        ));
    }

    /// Salon and stylist both open on Monday for the same hours.
    fn shift_file(stylist: StylistId, open: &str, close: &str) -> ScheduleFile {
        let hours = vec![iv(open, close)];
        ScheduleFile {
            salon: vec![DayAvailability::open(DayOfWeek::MONDAY, hours.clone())],
            stylists: vec![StylistEntry {
                id: stylist,
                name: "Ana".into(),
                days: vec![DayAvailability::open(DayOfWeek::MONDAY, hours)],
            }],
            services: vec![],
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn lookups_during_reload_always_find_stylist() {
        let s = Arc::new(store());
        let id = Ulid::new();
        let file = shift_file(id, "09:00", "13:00");
        s.load(file.clone()).await.unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let reader = {
            let s = s.clone();
            let stop = stop.clone();
            tokio::spawn(async move {
                let mut reads = 0u64;
                let mut misses = 0u64;
                loop {
                    if s.lookup(&id, DayOfWeek::MONDAY).await.is_err() {
                        misses += 1;
                    }
                    reads += 1;
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
                (reads, misses)
            })
        };

        for _ in 0..500 {
            s.load(file.clone()).await.unwrap();
            tokio::task::yield_now().await;
        }
        stop.store(true, Ordering::Relaxed);
        let (reads, misses) = reader.await.unwrap();
        assert!(reads > 0);
        assert_eq!(misses, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn snapshot_reads_one_version() {
        // Each file is self-consistent. Salon hours from one paired with the
        // stylist hours of the other would leave no slot at all.
        let s = Arc::new(store());
        let id = Ulid::new();
        let morning = shift_file(id, "09:00", "12:00");
        let afternoon = shift_file(id, "13:00", "18:00");
        s.load(morning.clone()).await.unwrap();

        let writer = {
            let s = s.clone();
            tokio::spawn(async move {
                for i in 0..500 {
                    let file = if i % 2 == 0 { afternoon.clone() } else { morning.clone() };
                    s.load(file).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..500 {
            let q = s
                .snapshot(DayOfWeek::MONDAY, &[id], dur(60), step(30))
                .await
                .unwrap();
            assert!(!crate::engine::resolve_slots(&q).is_empty());
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
    }

    #[test]
    fn malformed_file_reported() {
        let result = ScheduleFile::from_json(r#"{"salon": [{"day_of_week": 1, "intervals": [{"open": "9", "close": "10:00"}]}]}"#);
        assert!(matches!(result, Err(ScheduleError::Malformed(_))));
    }
}
