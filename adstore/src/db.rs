//! Repositories of the Ad Store.
//!
//! The database engine itself is out of scope, the store keeps everything
//! in memory behind the [`AdRepository`] & [`EventRepository`] traits so
//! that a persistent engine can be swapped in without touching the routes.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use rand::seq::IteratorRandom;
use tokio::sync::RwLock;

use primitives::{
    ad::AdContent,
    analytics::{Event, EventType},
    Ad, AdId,
};

#[async_trait]
pub trait AdRepository: Send + Sync {
    /// All ads, active and inactive, ordered by creation time.
    async fn list(&self) -> Vec<Ad>;

    async fn get(&self, ad_id: AdId) -> Option<Ad>;

    /// A random **active** ad, `None` when no active ad exists.
    async fn random_active(&self) -> Option<Ad>;

    async fn insert(&self, ad: Ad);

    /// Full replace of the editable fields, see [`Ad::apply`].
    /// Returns the updated [`Ad`], `None` for an unknown id.
    async fn update(&self, ad_id: AdId, content: AdContent) -> Option<Ad>;

    /// Returns whether an ad was deleted. Irreversible.
    async fn delete(&self, ad_id: AdId) -> bool;

    /// Increments the counter of the given event type by 1.
    /// Returns `false` for an unknown id, leaving all counters untouched.
    async fn record(&self, ad_id: AdId, event_type: EventType) -> bool;

    /// Sums of the (impressions, clicks) counters across all ads.
    async fn totals(&self) -> (u64, u64);
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn append(&self, event: Event);

    async fn list(&self) -> Vec<Event>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryAds {
    records: Arc<RwLock<HashMap<AdId, Ad>>>,
}

#[async_trait]
impl AdRepository for MemoryAds {
    async fn list(&self) -> Vec<Ad> {
        let mut ads = self
            .records
            .read()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();
        // the map iteration order is arbitrary
        ads.sort_by_key(|ad| (ad.created_at, ad.ad_id));

        ads
    }

    async fn get(&self, ad_id: AdId) -> Option<Ad> {
        self.records.read().await.get(&ad_id).cloned()
    }

    async fn random_active(&self) -> Option<Ad> {
        self.records
            .read()
            .await
            .values()
            .filter(|ad| ad.active)
            .choose(&mut rand::thread_rng())
            .cloned()
    }

    async fn insert(&self, ad: Ad) {
        self.records.write().await.insert(ad.ad_id, ad);
    }

    async fn update(&self, ad_id: AdId, content: AdContent) -> Option<Ad> {
        let mut records = self.records.write().await;
        let ad = records.get_mut(&ad_id)?;
        ad.apply(content);

        Some(ad.clone())
    }

    async fn delete(&self, ad_id: AdId) -> bool {
        self.records.write().await.remove(&ad_id).is_some()
    }

    async fn record(&self, ad_id: AdId, event_type: EventType) -> bool {
        let mut records = self.records.write().await;

        match records.get_mut(&ad_id) {
            Some(ad) => {
                match event_type {
                    EventType::Impression => ad.impressions += 1,
                    EventType::Click => ad.clicks += 1,
                }
                true
            }
            None => false,
        }
    }

    async fn totals(&self) -> (u64, u64) {
        self.records
            .read()
            .await
            .values()
            .fold((0, 0), |(impressions, clicks), ad| {
                (impressions + ad.impressions, clicks + ad.clicks)
            })
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryEvents {
    records: Arc<RwLock<Vec<Event>>>,
}

#[async_trait]
impl EventRepository for MemoryEvents {
    async fn append(&self, event: Event) {
        self.records.write().await.push(event);
    }

    async fn list(&self) -> Vec<Event> {
        self.records.read().await.clone()
    }
}
