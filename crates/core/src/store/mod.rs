//! Persistence for hives and crops.
//!
//! Handlers talk to an [`ApiaryStore`] trait object; the binary picks the
//! backend at startup. Proximity and date-range filtering happen inside the
//! store so the PostgreSQL backend can use its indexes.

pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::crop::{Crop, NearbyQuery, NewCrop};
use crate::hive::{Hive, HiveFilter, NewHive, Pagination};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// One page of hives plus the number of hives matching the filter overall.
#[derive(Debug, Clone, PartialEq)]
pub struct HivePage {
    pub total: u64,
    pub hives: Vec<Hive>,
}

/// Outcome of a conditional crop insert.
#[derive(Debug, Clone, PartialEq)]
pub enum CropInsert {
    Created(Crop),
    /// A crop with the same name within the overlap radius already flowers
    /// during part of the requested window. Nothing was written.
    Overlapping,
}

#[async_trait]
pub trait ApiaryStore: Send + Sync {
    /// Persist a hive. Fails with [`StoreError::DuplicateHiveId`] if the id is taken.
    async fn insert_hive(&self, hive: NewHive) -> Result<Hive, StoreError>;

    /// Hives matching `filter`, newest placement first.
    async fn list_hives(
        &self,
        filter: &HiveFilter,
        pagination: Pagination,
    ) -> Result<HivePage, StoreError>;

    /// Insert a crop unless a same-named crop within the overlap radius has an
    /// overlapping flowering window. Check and insert are atomic with respect
    /// to other inserts of the same name.
    async fn insert_crop(&self, crop: NewCrop) -> Result<CropInsert, StoreError>;

    /// Crops within `query.radius_m` of `query.point` that are in bloom on
    /// `query.date`, nearest first. The full radius is scanned.
    async fn find_flowering_crops_near(&self, query: &NearbyQuery)
        -> Result<Vec<Crop>, StoreError>;

    /// Connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release connections at shutdown.
    async fn close(&self) {}
}
