use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ApiaryStore, CropInsert, HivePage, StoreError};
use crate::crop::{Crop, FloweringWindow, NearbyQuery, NewCrop};
use crate::geo::{Position, OVERLAP_RADIUS_M};
use crate::hive::{Hive, HiveFilter, NewHive, Pagination};
use crate::validate::ValidationError;

/// PostgreSQL + PostGIS backend.
///
/// `location` is a generated `geography(Point, 4326)` column computed from
/// `longitude`/`latitude`, indexed with GiST. Distances use the sphere model
/// (`use_spheroid = false`) to agree with [`super::MemoryStore`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the schema migrations in `migrations/`.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct HiveRow {
    id: Uuid,
    hive_id: String,
    date_placed: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    num_colonies: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HiveRow> for Hive {
    type Error = ValidationError;

    fn try_from(row: HiveRow) -> Result<Self, Self::Error> {
        Ok(Hive {
            id: row.id,
            hive_id: row.hive_id,
            date_placed: row.date_placed,
            position: Position::new(row.latitude, row.longitude)?,
            num_colonies: row.num_colonies,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CropRow {
    id: Uuid,
    name: String,
    flowering_start: DateTime<Utc>,
    flowering_end: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    recommended_hive_density: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CropRow> for Crop {
    type Error = ValidationError;

    fn try_from(row: CropRow) -> Result<Self, Self::Error> {
        Ok(Crop {
            id: row.id,
            name: row.name,
            window: FloweringWindow::new(row.flowering_start, row.flowering_end)?,
            position: Position::new(row.latitude, row.longitude)?,
            recommended_hive_density: row.recommended_hive_density,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const HIVE_COLUMNS: &str =
    "id, hive_id, date_placed, latitude, longitude, num_colonies, created_at, updated_at";

const INSERT_HIVE: &str = r#"
    INSERT INTO hives (id, hive_id, date_placed, latitude, longitude, num_colonies)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, hive_id, date_placed, latitude, longitude, num_colonies, created_at, updated_at
"#;

const LOCK_CROP_NAME: &str = "SELECT pg_advisory_xact_lock(hashtext($1))";

const CROP_OVERLAP_EXISTS: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM crops
        WHERE name = $1
          AND ST_DWithin(location, ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography, $4, false)
          AND flowering_start <= $6
          AND flowering_end >= $5
    )
"#;

const INSERT_CROP: &str = r#"
    INSERT INTO crops (id, name, flowering_start, flowering_end, latitude, longitude, recommended_hive_density)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING id, name, flowering_start, flowering_end, latitude, longitude,
              recommended_hive_density, created_at, updated_at
"#;

const FLOWERING_CROPS_NEAR: &str = r#"
    SELECT id, name, flowering_start, flowering_end, latitude, longitude,
           recommended_hive_density, created_at, updated_at
    FROM crops
    WHERE ST_DWithin(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3, false)
      AND flowering_start <= $4
      AND flowering_end >= $4
    ORDER BY ST_Distance(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, false), id
"#;

fn push_hive_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &HiveFilter) {
    builder.push(" WHERE TRUE");
    if let Some(start) = filter.start_date {
        builder.push(" AND date_placed >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        builder.push(" AND date_placed <= ").push_bind(end);
    }
}

/// Split constraint violations (caller's fault) from infrastructure failures.
fn classify(err: sqlx::Error, hive_id: Option<&str>) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            if let Some(id) = hive_id {
                return StoreError::DuplicateHiveId(id.to_string());
            }
        }
        if db.is_check_violation() || db.is_unique_violation() {
            return StoreError::Constraint(db.message().to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl ApiaryStore for PgStore {
    async fn insert_hive(&self, hive: NewHive) -> Result<Hive, StoreError> {
        let row: HiveRow = sqlx::query_as(INSERT_HIVE)
            .bind(Uuid::now_v7())
            .bind(&hive.hive_id)
            .bind(hive.date_placed)
            .bind(hive.position.latitude())
            .bind(hive.position.longitude())
            .bind(hive.num_colonies)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, Some(hive.hive_id.as_str())))?;

        Ok(Hive::try_from(row)?)
    }

    async fn list_hives(
        &self,
        filter: &HiveFilter,
        pagination: Pagination,
    ) -> Result<HivePage, StoreError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM hives");
        push_hive_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {HIVE_COLUMNS} FROM hives"));
        push_hive_filter(&mut select, filter);
        select
            .push(" ORDER BY date_placed DESC, id DESC LIMIT ")
            .push_bind(i64::from(pagination.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX));
        let rows: Vec<HiveRow> = select.build_query_as::<HiveRow>().fetch_all(&self.pool).await?;

        let hives = rows
            .into_iter()
            .map(Hive::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HivePage {
            total: u64::try_from(total).unwrap_or_default(),
            hives,
        })
    }

    async fn insert_crop(&self, crop: NewCrop) -> Result<CropInsert, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serializes inserts of the same crop name until commit/rollback.
        sqlx::query(LOCK_CROP_NAME)
            .bind(&crop.name)
            .execute(&mut *tx)
            .await?;

        let overlapping: bool = sqlx::query_scalar(CROP_OVERLAP_EXISTS)
            .bind(&crop.name)
            .bind(crop.position.longitude())
            .bind(crop.position.latitude())
            .bind(OVERLAP_RADIUS_M)
            .bind(crop.window.start())
            .bind(crop.window.end())
            .fetch_one(&mut *tx)
            .await?;

        if overlapping {
            tx.rollback().await?;
            tracing::debug!(name = %crop.name, "overlapping crop found");
            return Ok(CropInsert::Overlapping);
        }

        let row: CropRow = sqlx::query_as(INSERT_CROP)
            .bind(Uuid::now_v7())
            .bind(&crop.name)
            .bind(crop.window.start())
            .bind(crop.window.end())
            .bind(crop.position.latitude())
            .bind(crop.position.longitude())
            .bind(crop.recommended_hive_density)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify(e, None))?;

        tx.commit().await?;
        Ok(CropInsert::Created(Crop::try_from(row)?))
    }

    async fn find_flowering_crops_near(
        &self,
        query: &NearbyQuery,
    ) -> Result<Vec<Crop>, StoreError> {
        let rows: Vec<CropRow> = sqlx::query_as(FLOWERING_CROPS_NEAR)
            .bind(query.point.longitude())
            .bind(query.point.latitude())
            .bind(query.radius_m)
            .bind(query.date)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(Crop::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
