use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ApiaryStore, CropInsert, HivePage, StoreError};
use crate::crop::{Crop, NearbyQuery, NewCrop};
use crate::geo::OVERLAP_RADIUS_M;
use crate::hive::{Hive, HiveFilter, NewHive, Pagination};

/// In-process store with the same semantics as [`super::PgStore`].
/// Distances are haversine on a spherical Earth.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

#[derive(Debug, Default)]
struct Records {
    hives: Vec<Hive>,
    crops: Vec<Crop>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiaryStore for MemoryStore {
    async fn insert_hive(&self, hive: NewHive) -> Result<Hive, StoreError> {
        let mut records = self.records.write().await;
        if records.hives.iter().any(|h| h.hive_id == hive.hive_id) {
            return Err(StoreError::DuplicateHiveId(hive.hive_id));
        }

        let hive = Hive::from_new(hive, Uuid::now_v7(), Utc::now());
        records.hives.push(hive.clone());
        tracing::debug!(hive_id = %hive.hive_id, "hive stored in memory");
        Ok(hive)
    }

    async fn list_hives(
        &self,
        filter: &HiveFilter,
        pagination: Pagination,
    ) -> Result<HivePage, StoreError> {
        let records = self.records.read().await;
        let mut matching: Vec<&Hive> = records
            .hives
            .iter()
            .filter(|h| filter.matches(h.date_placed))
            .collect();
        matching.sort_by_key(|h| (Reverse(h.date_placed), Reverse(h.id)));

        let skip = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let hives = matching
            .iter()
            .skip(skip)
            .take(pagination.limit as usize)
            .map(|h| (*h).clone())
            .collect();

        Ok(HivePage {
            total: matching.len() as u64,
            hives,
        })
    }

    async fn insert_crop(&self, crop: NewCrop) -> Result<CropInsert, StoreError> {
        // Held across check and insert.
        let mut records = self.records.write().await;
        let overlapping = records.crops.iter().any(|existing| {
            existing.name == crop.name
                && existing.window.overlaps(&crop.window)
                && existing
                    .position
                    .location()
                    .distance_m(crop.position.location())
                    <= OVERLAP_RADIUS_M
        });
        if overlapping {
            return Ok(CropInsert::Overlapping);
        }

        let crop = Crop::from_new(crop, Uuid::now_v7(), Utc::now());
        records.crops.push(crop.clone());
        tracing::debug!(name = %crop.name, "crop stored in memory");
        Ok(CropInsert::Created(crop))
    }

    async fn find_flowering_crops_near(
        &self,
        query: &NearbyQuery,
    ) -> Result<Vec<Crop>, StoreError> {
        let records = self.records.read().await;
        let mut found: Vec<(f64, &Crop)> = records
            .crops
            .iter()
            .filter(|c| c.window.contains(query.date))
            .map(|c| (c.position.location().distance_m(&query.point), c))
            .filter(|(distance, _)| *distance <= query.radius_m)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

        Ok(found.into_iter().map(|(_, c)| c.clone()).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::{FloweringWindow, NearbyCropsParams};
    use crate::geo::Position;
    use chrono::{DateTime, TimeZone};

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn hive(id: &str, placed: DateTime<Utc>) -> NewHive {
        NewHive {
            hive_id: id.to_string(),
            date_placed: placed,
            position: Position::new(10.0, 20.0).unwrap(),
            num_colonies: None,
        }
    }

    fn crop(name: &str, lat: f64, start: DateTime<Utc>, end: DateTime<Utc>) -> NewCrop {
        NewCrop {
            name: name.to_string(),
            window: FloweringWindow::new(start, end).unwrap(),
            position: Position::new(lat, 20.0).unwrap(),
            recommended_hive_density: 2.0,
        }
    }

    fn nearby(date: &str, radius_km: &str) -> NearbyQuery {
        NearbyCropsParams {
            latitude: Some("10.0".into()),
            longitude: Some("20.0".into()),
            radius: Some(radius_km.into()),
            date: Some(date.into()),
        }
        .parse(Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_hive_id_is_rejected() {
        let store = MemoryStore::new();
        store.insert_hive(hive("H-1", day(2024, 3, 1))).await.unwrap();
        let err = store
            .insert_hive(hive("H-1", day(2024, 4, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateHiveId(ref id) if id == "H-1"));
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn pages_are_newest_first_and_total_ignores_window() {
        let store = MemoryStore::new();
        for d in 1..=7 {
            store
                .insert_hive(hive(&format!("H-{d}"), day(2024, 3, d)))
                .await
                .unwrap();
        }

        let page = store
            .list_hives(&HiveFilter::default(), Pagination { page: 2, limit: 3 })
            .await
            .unwrap();
        assert_eq!(page.total, 7);
        let ids: Vec<_> = page.hives.iter().map(|h| h.hive_id.as_str()).collect();
        assert_eq!(ids, ["H-4", "H-3", "H-2"]);

        let last = store
            .list_hives(&HiveFilter::default(), Pagination { page: 3, limit: 3 })
            .await
            .unwrap();
        assert_eq!(last.hives.len(), 1);

        let beyond = store
            .list_hives(&HiveFilter::default(), Pagination { page: 9, limit: 3 })
            .await
            .unwrap();
        assert!(beyond.hives.is_empty());
        assert_eq!(beyond.total, 7);
    }

    #[tokio::test]
    async fn date_filter_applies_to_total() {
        let store = MemoryStore::new();
        for d in 1..=5 {
            store
                .insert_hive(hive(&format!("H-{d}"), day(2024, 3, d)))
                .await
                .unwrap();
        }
        let filter = HiveFilter {
            start_date: Some(day(2024, 3, 2)),
            end_date: Some(day(2024, 3, 4)),
        };
        let page = store
            .list_hives(&filter, Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.hives.first().unwrap().hive_id, "H-4");
    }

    #[tokio::test]
    async fn overlapping_crop_nearby_is_refused() {
        let store = MemoryStore::new();
        let a = crop("Almond", 10.0, day(2024, 3, 1), day(2024, 4, 1));
        assert!(matches!(
            store.insert_crop(a).await.unwrap(),
            CropInsert::Created(_)
        ));

        // ~1.1 km north, fully contained window
        let b = crop("Almond", 10.01, day(2024, 3, 15), day(2024, 3, 20));
        assert_eq!(store.insert_crop(b).await.unwrap(), CropInsert::Overlapping);

        let c = crop("Almond", 10.0, day(2024, 5, 1), day(2024, 6, 1));
        assert!(matches!(
            store.insert_crop(c).await.unwrap(),
            CropInsert::Created(_)
        ));
    }

    #[tokio::test]
    async fn overlap_needs_same_name_and_proximity() {
        let store = MemoryStore::new();
        store
            .insert_crop(crop("Almond", 10.0, day(2024, 3, 1), day(2024, 4, 1)))
            .await
            .unwrap();

        let other_name = crop("Clover", 10.0, day(2024, 3, 1), day(2024, 4, 1));
        assert!(matches!(
            store.insert_crop(other_name).await.unwrap(),
            CropInsert::Created(_)
        ));

        // ~3.3 km north
        let far = crop("Almond", 10.03, day(2024, 3, 1), day(2024, 4, 1));
        assert!(matches!(
            store.insert_crop(far).await.unwrap(),
            CropInsert::Created(_)
        ));
    }

    #[tokio::test]
    async fn concurrent_duplicate_crops_admit_exactly_one() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert_crop(crop("Almond", 10.0, day(2024, 3, 1), day(2024, 4, 1)))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), CropInsert::Created(_)) {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn nearby_filters_by_bloom_date_and_orders_by_distance() {
        let store = MemoryStore::new();
        store
            .insert_crop(crop("Far", 10.5, day(2024, 3, 1), day(2024, 4, 1)))
            .await
            .unwrap();
        store
            .insert_crop(crop("Near", 10.0, day(2024, 3, 1), day(2024, 4, 1)))
            .await
            .unwrap();
        store
            .insert_crop(crop("Late", 10.0, day(2024, 6, 1), day(2024, 7, 1)))
            .await
            .unwrap();

        let found = store
            .find_flowering_crops_near(&nearby("2024-03-15", "100"))
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Near", "Far"]);

        // Far is ~55 km away
        let close = store
            .find_flowering_crops_near(&nearby("2024-03-15", "10"))
            .await
            .unwrap();
        assert_eq!(close.len(), 1);

        let none = store
            .find_flowering_crops_near(&nearby("2024-05-01", "100"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn zero_radius_finds_only_the_exact_point() {
        let store = MemoryStore::new();
        store
            .insert_crop(crop("Here", 10.0, day(2024, 3, 1), day(2024, 4, 1)))
            .await
            .unwrap();
        store
            .insert_crop(crop("Beside", 10.001, day(2024, 3, 1), day(2024, 4, 1)))
            .await
            .unwrap();

        let found = store
            .find_flowering_crops_near(&nearby("2024-03-15", "0"))
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Here"]);
    }
}
