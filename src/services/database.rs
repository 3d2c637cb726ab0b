//! Database service for the resource catalog.

use crate::error::AppError;
use crate::models::{ListResourcesFilter, NewResource, Resource, ResourcePage, ResourcePatch};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

const RESOURCE_COLUMNS: &str =
    "id, title, description, resource_type, url, tags, created_at, updated_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Create a new resource.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_resource(&self, input: &NewResource) -> Result<Resource, AppError> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            r#"
            INSERT INTO resources (title, description, resource_type, url, tags)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RESOURCE_COLUMNS}
            "#,
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.resource_type.as_str())
        .bind(&input.url)
        .bind(&input.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create resource: {}", e)))?;

        info!(resource_id = %resource.id, title = %resource.title, "Resource created");

        Ok(resource)
    }

    /// Get a resource by ID. Absent rows are an outcome, not an error.
    #[instrument(skip(self), fields(resource_id = %resource_id))]
    pub async fn get_resource(&self, resource_id: i64) -> Result<Option<Resource>, AppError> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            r#"
            SELECT {RESOURCE_COLUMNS}
            FROM resources
            WHERE id = $1
            "#,
        ))
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get resource: {}", e)))?;

        Ok(resource)
    }

    /// List resources with pagination, title search and type filter.
    ///
    /// The total count runs as a separate query with the same filters so
    /// pagination metadata stays correct even when the requested page is
    /// past the end of the result set.
    #[instrument(skip(self, filter), fields(page = %filter.page, page_size = %filter.page_size))]
    pub async fn list_resources(
        &self,
        filter: &ListResourcesFilter,
    ) -> Result<ResourcePage, AppError> {
        let type_str = filter.resource_type.map(|t| t.as_str().to_string());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM resources
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::varchar IS NULL OR resource_type = $2)
            "#,
        )
        .bind(&filter.search)
        .bind(&type_str)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count resources: {}", e)))?;

        // Page has no upper bound, so the offset must saturate instead of
        // overflowing. A saturated offset is simply past the end of the
        // result set and yields an empty page.
        let offset = filter.page.saturating_sub(1).saturating_mul(filter.page_size);

        let items = sqlx::query_as::<_, Resource>(&format!(
            r#"
            SELECT {RESOURCE_COLUMNS}
            FROM resources
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::varchar IS NULL OR resource_type = $2)
            ORDER BY created_at DESC
            OFFSET $3
            LIMIT $4
            "#,
        ))
        .bind(&filter.search)
        .bind(&type_str)
        .bind(offset)
        .bind(filter.page_size)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list resources: {}", e)))?;

        info!(
            page = filter.page,
            page_size = filter.page_size,
            total = total,
            search = ?filter.search,
            resource_type = ?type_str,
            "Resources listed"
        );

        Ok(ResourcePage {
            items,
            total,
            page: filter.page,
            page_size: filter.page_size,
            total_pages: total_pages(total, filter.page_size),
        })
    }

    /// Apply a partial update; unsupplied fields keep their prior values.
    /// The whole update lands in one statement, so it is atomic.
    #[instrument(skip(self, patch), fields(resource_id = %resource_id))]
    pub async fn update_resource(
        &self,
        resource_id: i64,
        patch: &ResourcePatch,
    ) -> Result<Option<Resource>, AppError> {
        let type_str = patch.resource_type.map(|t| t.as_str().to_string());

        let resource = sqlx::query_as::<_, Resource>(&format!(
            r#"
            UPDATE resources
            SET title = COALESCE($2::varchar, title),
                description = COALESCE($3::text, description),
                resource_type = COALESCE($4::varchar, resource_type),
                url = COALESCE($5::varchar, url),
                tags = COALESCE($6::text[], tags),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RESOURCE_COLUMNS}
            "#,
        ))
        .bind(resource_id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&type_str)
        .bind(&patch.url)
        .bind(&patch.tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update resource: {}", e)))?;

        if let Some(ref r) = resource {
            info!(resource_id = %r.id, "Resource updated");
        }

        Ok(resource)
    }

    /// Hard delete. Returns false when the id does not exist.
    #[instrument(skip(self), fields(resource_id = %resource_id))]
    pub async fn delete_resource(&self, resource_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM resources
            WHERE id = $1
            "#,
        )
        .bind(resource_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete resource: {}", e)))?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(resource_id = %resource_id, "Resource deleted");
        }

        Ok(deleted)
    }
}

/// `ceil(total / page_size)` with a floor of 1 even for an empty result set.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    ((total + page_size - 1) / page_size).max(1)
}

#[cfg(test)]
mod tests {
    use super::total_pages;

    #[test]
    fn total_pages_has_floor_of_one() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(0, 1), 1);
        assert_eq!(total_pages(0, 100), 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(101, 100), 2);
        assert_eq!(total_pages(99, 1), 99);
    }

    #[test]
    fn total_pages_matches_ceil_for_all_page_sizes() {
        for page_size in 1..=100i64 {
            for total in [0, 1, 7, 50, 999, 1000] {
                let expected = ((total as f64) / (page_size as f64)).ceil().max(1.0) as i64;
                assert_eq!(
                    total_pages(total, page_size),
                    expected,
                    "total={} page_size={}",
                    total,
                    page_size
                );
            }
        }
    }
}
