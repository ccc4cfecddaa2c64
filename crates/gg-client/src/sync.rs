//! # Sync Controller
//!
//! Holds the two views the app renders: *active* gossips for the map
//! (optionally filtered to one category) and *all* gossips, expired ones
//! included, for the personal feed. Every mutation goes through here so the
//! views stay consistent with the server.
//!
//! # Developer Note
//! Locks are only held while copying data in or out, never across an
//! `.await`. A failed background refresh keeps whatever was loaded before.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, FixedOffset, Utc};
use gg_core::clock::Clock;
use gg_core::expiry::ExpiryHours;
use gg_core::models::{AuthorId, Coordinates, GossipView, LocationPreference, SubmitGossipRequest};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::{GossipApi, ListFilter};
use crate::error::{ClientError, Result};
use crate::inflight::{InFlight, InFlightMarkers};
use crate::labels::{self, EXPIRED_LABEL};
use crate::settings::ClientSettings;
use crate::theme::Palette;

/// Map filter value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// Duration given to a repost when the original's is unknown.
pub const REPOST_FALLBACK_HOURS: ExpiryHours = ExpiryHours::TwentyFour;

/// A gossip normalized for display.
#[derive(Debug, Clone, PartialEq)]
pub struct GossipCard {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub category: String,
    pub freshness: String,
    /// `Expired`, a countdown, or `None` when the server sent no expiry.
    pub expiry_label: Option<String>,
    pub expires_in_hours: Option<ExpiryHours>,
    pub expired: bool,
    pub location: Option<Coordinates>,
    pub location_preference: Option<LocationPreference>,
    pub author_id: Option<AuthorId>,
}

impl GossipCard {
    pub fn from_view(view: GossipView, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let expiry_label = if view.expired {
            Some(EXPIRED_LABEL.to_string())
        } else {
            labels::format_expiry_countdown(view.expires_at.as_deref(), now)
        };

        Self {
            id: view.id,
            freshness: labels::format_freshness(&view.freshness, offset),
            expiry_label,
            title: view.title,
            body: view.body,
            category: view.category,
            expires_in_hours: view.expires_in_hours,
            expired: view.expired,
            location: view.location,
            location_preference: view.location_preference,
            author_id: view.author_id,
        }
    }

    /// What the card shows next to the author line.
    pub fn freshness_display(&self) -> String {
        match self.expiry_label.as_deref() {
            Some(label) if label != EXPIRED_LABEL => format!("{} ({label})", self.freshness),
            _ => self.freshness.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub status: ViewStatus,
    pub items: Vec<GossipCard>,
}

#[derive(Debug, Default)]
struct Views {
    active: ViewState,
    all: ViewState,
    category: Option<String>,
}

/// What the composer hands over.
#[derive(Debug, Clone, PartialEq)]
pub struct GossipForm {
    pub subject: String,
    pub description: String,
    pub gossip_type: String,
    pub location_preference: LocationPreference,
    pub location: Option<Coordinates>,
    pub expires_in_hours: ExpiryHours,
}

pub struct SyncController {
    api: Arc<dyn GossipApi>,
    clock: Arc<dyn Clock>,
    settings: ClientSettings,
    views: RwLock<Views>,
    in_flight: InFlightMarkers,
    loading: AtomicUsize,
    generation: AtomicU64,
}

impl SyncController {
    pub fn new(api: Arc<dyn GossipApi>, clock: Arc<dyn Clock>, settings: ClientSettings) -> Self {
        Self {
            api,
            clock,
            settings,
            views: RwLock::new(Views::default()),
            in_flight: InFlightMarkers::new(),
            loading: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn palette(&self) -> &'static Palette {
        self.settings.theme.palette()
    }

    pub fn active(&self) -> ViewState {
        self.read_views().active.clone()
    }

    pub fn all(&self) -> ViewState {
        self.read_views().all.clone()
    }

    pub fn category_filter(&self) -> Option<String> {
        self.read_views().category.clone()
    }

    /// True while any combined refresh is running.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub fn in_flight(&self, id: Uuid) -> Option<InFlight> {
        self.in_flight.get(id)
    }

    /// Sets the map filter (`All` or blank clears it) and reloads.
    pub async fn set_category_filter(&self, filter: Option<&str>) {
        let category = filter
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
            .map(str::to_owned);
        self.write_views().category = category;
        self.refresh().await;
    }

    /// Fetches both views concurrently and replaces them in full.
    ///
    /// Failures are logged and leave the previously loaded items in place.
    /// A refresh that finishes after a newer one has started is discarded.
    #[instrument(skip(self), name = "sync.refresh")]
    pub async fn refresh(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.loading.fetch_add(1, Ordering::SeqCst);

        let category = {
            let mut views = self.write_views();
            views.active.status = ViewStatus::Loading;
            views.all.status = ViewStatus::Loading;
            views.category.clone()
        };

        let result = tokio::try_join!(
            self.api.list(ListFilter::active(category)),
            self.api.list(ListFilter::everything()),
        );

        if self.generation.load(Ordering::SeqCst) == generation {
            let mut views = self.write_views();
            match result {
                Ok((active, all)) => {
                    let now = self.clock.now();
                    let offset = self.settings.display_offset();
                    views.active = ViewState {
                        status: ViewStatus::Loaded,
                        items: normalize(active, now, offset),
                    };
                    views.all = ViewState {
                        status: ViewStatus::Loaded,
                        items: normalize(all, now, offset),
                    };
                }
                Err(err) => {
                    warn!(error = %err, "failed to load gossips");
                    views.active.status = ViewStatus::Error(err.to_string());
                    views.all.status = ViewStatus::Error(err.to_string());
                }
            }
        }

        self.loading.fetch_sub(1, Ordering::SeqCst);
    }

    /// Validates and submits a new gossip, then reloads both views.
    #[instrument(skip_all, name = "sync.submit")]
    pub async fn submit(&self, form: GossipForm) -> Result<Uuid> {
        if form.subject.trim().is_empty() || form.description.trim().is_empty() {
            return Err(ClientError::Validation(
                "Subject and description are required.".to_string(),
            ));
        }

        let request = SubmitGossipRequest {
            subject: Some(form.subject),
            description: Some(form.description),
            gossip_type: Some(form.gossip_type),
            location_preference: Some(form.location_preference.as_str().to_string()),
            location: Some(form.location.unwrap_or(self.settings.default_location)),
            expires_in_hours: Some(form.expires_in_hours.hours().into()),
        };

        let id = self.api.submit(&request).await?;
        info!(%id, "gossip posted");
        self.refresh().await;
        Ok(id)
    }

    /// Deletes a gossip and splices it out of both views once the server
    /// has confirmed. The marker is cleared either way.
    #[instrument(skip(self), name = "sync.delete")]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let _marker = self.in_flight.begin(id, InFlight::Deleting)?;
        self.api.delete(id).await?;

        let mut views = self.write_views();
        views.active.items.retain(|item| item.id != id);
        views.all.items.retain(|item| item.id != id);
        Ok(())
    }

    /// Publishes a fresh copy of an expired gossip from the feed and reloads.
    ///
    /// The copy gets its own id and expiry clock; the original is untouched.
    #[instrument(skip(self), name = "sync.repost")]
    pub async fn repost(&self, id: Uuid) -> Result<Uuid> {
        let target = self
            .read_views()
            .all
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("Gossip {id} is not in the feed")))?;
        if !target.expired {
            return Err(ClientError::Validation(
                "Only expired gossips can be reposted.".to_string(),
            ));
        }

        let _marker = self.in_flight.begin(id, InFlight::Reposting)?;
        let request = repost_request(&target, self.settings.default_location);
        let new_id = self.api.submit(&request).await?;

        info!(original = %id, repost = %new_id, "gossip reposted");
        self.refresh().await;
        Ok(new_id)
    }

    fn read_views(&self) -> std::sync::RwLockReadGuard<'_, Views> {
        self.views.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_views(&self) -> std::sync::RwLockWriteGuard<'_, Views> {
        self.views.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn normalize(items: Vec<GossipView>, now: DateTime<Utc>, offset: FixedOffset) -> Vec<GossipCard> {
    items
        .into_iter()
        .map(|view| GossipCard::from_view(view, now, offset))
        .collect()
}

fn repost_request(target: &GossipCard, fallback_location: Coordinates) -> SubmitGossipRequest {
    let preference = if target.location.is_some() {
        LocationPreference::Map
    } else {
        target.location_preference.unwrap_or_default()
    };

    SubmitGossipRequest {
        subject: Some(target.title.clone()),
        description: Some(target.body.clone()),
        gossip_type: Some(target.category.clone()),
        location_preference: Some(preference.as_str().to_string()),
        location: Some(target.location.unwrap_or(fallback_location)),
        expires_in_hours: Some(
            target
                .expires_in_hours
                .unwrap_or(REPOST_FALLBACK_HOURS)
                .hours()
                .into(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockGossipApi;
    use chrono::{Offset, TimeDelta, TimeZone};
    use gg_core::clock::ManualClock;
    use gg_core::models::to_wire_timestamp;
    use serde_json::json;
    use tokio::sync::Notify;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 10, 18, 0, 0).unwrap()
    }

    fn view(title: &str, created_minutes_ago: i64, hours: ExpiryHours) -> GossipView {
        let created_at = now() - TimeDelta::minutes(created_minutes_ago);
        let expires_at = created_at + hours.duration();
        GossipView {
            id: Uuid::now_v7(),
            title: title.to_string(),
            body: "body".to_string(),
            category: "Traffic".to_string(),
            freshness: to_wire_timestamp(created_at),
            location: None,
            expires_at: Some(to_wire_timestamp(expires_at)),
            expires_in_hours: Some(hours),
            expired: expires_at <= now(),
            location_preference: Some(LocationPreference::Current),
            author_id: None,
        }
    }

    fn controller(api: impl GossipApi + 'static) -> SyncController {
        SyncController::new(
            Arc::new(api),
            Arc::new(ManualClock::new(now())),
            ClientSettings::default(),
        )
    }

    #[test]
    fn test_card_labels() {
        let active = GossipCard::from_view(view("fresh", 20, ExpiryHours::One), now(), Utc.fix());
        assert_eq!(active.expiry_label.as_deref(), Some("40m left"));
        assert_eq!(active.freshness, "10-08-2024 05:40 PM");
        assert_eq!(active.freshness_display(), "10-08-2024 05:40 PM (40m left)");

        let gone = GossipCard::from_view(view("stale", 120, ExpiryHours::One), now(), Utc.fix());
        assert_eq!(gone.expiry_label.as_deref(), Some(EXPIRED_LABEL));
        assert_eq!(gone.freshness_display(), gone.freshness);
    }

    #[tokio::test]
    async fn test_refresh_fills_both_views() {
        let fresh = view("fresh", 5, ExpiryHours::Six);
        let stale = view("stale", 600, ExpiryHours::Six);
        let (active_rows, all_rows) = (vec![fresh.clone()], vec![fresh.clone(), stale.clone()]);

        let mut api = MockGossipApi::new();
        api.expect_list()
            .withf(|f| !f.include_expired && f.category.as_deref() == Some("Traffic"))
            .times(1)
            .returning(move |_| Ok(active_rows.clone()));
        api.expect_list()
            .withf(|f| f.include_expired && f.category.is_none())
            .times(1)
            .returning(move |_| Ok(all_rows.clone()));

        let sync = controller(api);
        sync.set_category_filter(Some("Traffic")).await;

        let active = sync.active();
        assert_eq!(active.status, ViewStatus::Loaded);
        assert_eq!(active.items.len(), 1);
        assert_eq!(active.items[0].expiry_label.as_deref(), Some("5h 55m left"));

        let all = sync.all();
        assert_eq!(all.items.len(), 2);
        assert!(all.items[1].expired);
        assert!(!sync.is_loading());
    }

    #[tokio::test]
    async fn test_all_filter_means_no_category() {
        let mut api = MockGossipApi::new();
        api.expect_list()
            .withf(|f| f.category.is_none())
            .times(2)
            .returning(|_| Ok(Vec::new()));

        let sync = controller(api);
        sync.set_category_filter(Some(ALL_CATEGORIES)).await;
        assert_eq!(sync.category_filter(), None);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_items() {
        let rows = vec![view("kept", 5, ExpiryHours::One)];
        let mut api = MockGossipApi::new();
        api.expect_list()
            .times(2)
            .returning(move |_| Ok(rows.clone()));
        api.expect_list()
            .returning(|_| Err(ClientError::Transport("connection refused".into())));

        let sync = controller(api);
        sync.refresh().await;
        assert_eq!(sync.all().items.len(), 1);

        sync.refresh().await;
        let all = sync.all();
        assert!(matches!(all.status, ViewStatus::Error(_)));
        assert_eq!(all.items.len(), 1);
        assert_eq!(sync.active().items.len(), 1);
        assert!(!sync.is_loading());
    }

    #[tokio::test]
    async fn test_submit_validates_before_sending() {
        let mut api = MockGossipApi::new();
        api.expect_submit().times(0);

        let sync = controller(api);
        let form = GossipForm {
            subject: "   ".into(),
            description: "body".into(),
            gossip_type: "General".into(),
            location_preference: LocationPreference::Map,
            location: None,
            expires_in_hours: ExpiryHours::One,
        };
        assert!(matches!(sync.submit(form).await, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_splices_both_views() {
        let doomed = view("doomed", 5, ExpiryHours::One);
        let doomed_id = doomed.id;
        let rows = vec![doomed, view("other", 6, ExpiryHours::One)];

        let mut api = MockGossipApi::new();
        api.expect_list().times(2).returning(move |_| Ok(rows.clone()));
        api.expect_delete()
            .withf(move |id| *id == doomed_id)
            .times(1)
            .returning(|_| Ok(()));

        let sync = controller(api);
        sync.refresh().await;
        sync.delete(doomed_id).await.unwrap();

        assert!(sync.active().items.iter().all(|i| i.id != doomed_id));
        assert!(sync.all().items.iter().all(|i| i.id != doomed_id));
        assert_eq!(sync.all().items.len(), 1);
        assert_eq!(sync.in_flight(doomed_id), None);
    }

    #[tokio::test]
    async fn test_failed_delete_clears_marker_and_keeps_item() {
        let target = view("target", 5, ExpiryHours::One);
        let target_id = target.id;
        let rows = vec![target];

        let mut api = MockGossipApi::new();
        api.expect_list().times(2).returning(move |_| Ok(rows.clone()));
        api.expect_delete()
            .returning(|_| Err(ClientError::NotFound("gone".into())));

        let sync = controller(api);
        sync.refresh().await;
        assert!(matches!(sync.delete(target_id).await, Err(ClientError::NotFound(_))));
        assert_eq!(sync.in_flight(target_id), None);
        assert_eq!(sync.all().items.len(), 1);
    }

    #[tokio::test]
    async fn test_repost_copies_fields_and_refreshes() {
        let mut original = view("Speed trap", 120, ExpiryHours::One);
        original.location = Some(Coordinates { latitude: 17.45, longitude: 78.38 });
        original.location_preference = Some(LocationPreference::Current);
        let original_id = original.id;
        let rows = vec![original];

        let mut api = MockGossipApi::new();
        api.expect_list().times(4).returning(move |_| Ok(rows.clone()));
        api.expect_submit()
            .withf(|req| {
                req.subject.as_deref() == Some("Speed trap")
                    && req.gossip_type.as_deref() == Some("Traffic")
                    && req.location_preference.as_deref() == Some("map")
                    && req.location.map(|c| c.latitude) == Some(17.45)
                    && req.expires_in_hours == Some(json!(1))
            })
            .times(1)
            .returning(|_| Ok(Uuid::now_v7()));

        let sync = controller(api);
        sync.refresh().await;
        let new_id = sync.repost(original_id).await.unwrap();
        assert_ne!(new_id, original_id);
        assert_eq!(sync.in_flight(original_id), None);
    }

    #[tokio::test]
    async fn test_repost_defaults_duration_and_location() {
        let mut original = view("No pin", 90, ExpiryHours::One);
        original.expires_in_hours = None;
        let original_id = original.id;
        let rows = vec![original];

        let mut api = MockGossipApi::new();
        api.expect_list().returning(move |_| Ok(rows.clone()));
        api.expect_submit()
            .withf(|req| {
                req.expires_in_hours == Some(json!(24))
                    && req.location_preference.as_deref() == Some("current")
                    && req.location == Some(crate::settings::DEFAULT_LOCATION)
            })
            .times(1)
            .returning(|_| Ok(Uuid::now_v7()));

        let sync = controller(api);
        sync.refresh().await;
        sync.repost(original_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_repost_of_active_gossip_is_rejected() {
        let active = view("Still fresh", 5, ExpiryHours::TwentyFour);
        let active_id = active.id;
        let rows = vec![active];

        let mut api = MockGossipApi::new();
        api.expect_list().times(2).returning(move |_| Ok(rows.clone()));
        api.expect_submit().times(0);

        let sync = controller(api);
        sync.refresh().await;
        assert!(matches!(sync.repost(active_id).await, Err(ClientError::Validation(_))));
        assert_eq!(sync.in_flight(active_id), None);
        assert_eq!(sync.all().items.len(), 1);
    }

    #[tokio::test]
    async fn test_repost_of_unknown_id() {
        let sync = controller(MockGossipApi::new());
        assert!(matches!(sync.repost(Uuid::now_v7()).await, Err(ClientError::NotFound(_))));
    }

    /// Holds deletes open until released, to observe markers mid-flight.
    struct GatedApi {
        gate: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl GossipApi for GatedApi {
        async fn submit(&self, _request: &SubmitGossipRequest) -> Result<Uuid> {
            Ok(Uuid::now_v7())
        }

        async fn list(&self, _filter: ListFilter) -> Result<Vec<GossipView>> {
            Ok(Vec::new())
        }

        async fn delete(&self, _id: Uuid) -> Result<()> {
            self.gate.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_one_mutation_per_item_while_in_flight() {
        let gate = Arc::new(Notify::new());
        let sync = Arc::new(controller(GatedApi { gate: gate.clone() }));
        let (busy, other) = (Uuid::now_v7(), Uuid::now_v7());

        let pending = tokio::spawn({
            let sync = sync.clone();
            async move { sync.delete(busy).await }
        });
        while sync.in_flight(busy).is_none() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            sync.delete(busy).await,
            Err(ClientError::Busy { kind: InFlight::Deleting, .. })
        ));

        let second = tokio::spawn({
            let sync = sync.clone();
            async move { sync.delete(other).await }
        });
        while sync.in_flight(other).is_none() {
            tokio::task::yield_now().await;
        }
        assert_eq!(sync.in_flight(busy), Some(InFlight::Deleting));

        gate.notify_waiters();
        pending.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(sync.in_flight(busy), None);
        assert_eq!(sync.in_flight(other), None);
    }
}
