use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};

use super::ServiceRequestRepository;
use crate::core::error::{AppError, Result};
use crate::features::service_requests::models::{
    CustomerProfile, ServiceRequest, ServiceRequestDetail, ServiceRequestStatus, User, Vehicle,
};

const DETAIL_SELECT: &str = r#"
    SELECT
        sr.id, sr.vehicle_id, sr.service_type, sr.delivery_date, sr.additional_description,
        sr.admin_id, sr.service_advisor_id, sr.status, sr.created_at, sr.updated_at,
        v.customer_id, v.brand, v.model, v.registration_number, v.category AS vehicle_category,
        c.membership_status,
        u.id AS user_id, u.first_name, u.last_name, u.email, u.role,
        CASE WHEN a.id IS NULL THEN NULL ELSE a.first_name || ' ' || a.last_name END
            AS service_advisor_name
    FROM service_requests sr
    JOIN vehicles v ON v.id = sr.vehicle_id
    JOIN customer_profiles c ON c.id = v.customer_id
    JOIN users u ON u.id = c.user_id
    LEFT JOIN users a ON a.id = sr.service_advisor_id
"#;

/// Joined row, split into domain models by `From`
#[derive(Debug, FromRow)]
struct ServiceRequestDetailRow {
    id: i32,
    vehicle_id: i32,
    service_type: String,
    delivery_date: Option<NaiveDate>,
    additional_description: Option<String>,
    admin_id: Option<i32>,
    service_advisor_id: Option<i32>,
    status: ServiceRequestStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    customer_id: i32,
    brand: String,
    model: String,
    registration_number: String,
    vehicle_category: Option<String>,
    membership_status: Option<String>,
    user_id: i32,
    first_name: String,
    last_name: String,
    email: String,
    role: String,
    service_advisor_name: Option<String>,
}

impl From<ServiceRequestDetailRow> for ServiceRequestDetail {
    fn from(row: ServiceRequestDetailRow) -> Self {
        Self {
            request: ServiceRequest {
                id: row.id,
                vehicle_id: row.vehicle_id,
                service_type: row.service_type,
                delivery_date: row.delivery_date,
                additional_description: row.additional_description,
                admin_id: row.admin_id,
                service_advisor_id: row.service_advisor_id,
                status: row.status,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            vehicle: Vehicle {
                id: row.vehicle_id,
                customer_id: row.customer_id,
                brand: row.brand,
                model: row.model,
                registration_number: row.registration_number,
                category: row.vehicle_category,
            },
            customer: CustomerProfile {
                id: row.customer_id,
                user: User {
                    id: row.user_id,
                    first_name: row.first_name,
                    last_name: row.last_name,
                    email: row.email,
                    role: row.role,
                },
                membership_status: row.membership_status,
            },
            service_advisor_name: row.service_advisor_name,
        }
    }
}

pub struct PgServiceRequestRepository {
    pool: PgPool,
}

impl PgServiceRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRequestRepository for PgServiceRequestRepository {
    async fn find_detail(&self, id: i32) -> Result<Option<ServiceRequestDetail>> {
        let query = format!("{} WHERE sr.id = $1", DETAIL_SELECT);
        let row = sqlx::query_as::<_, ServiceRequestDetailRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch service request {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        Ok(row.map(Into::into))
    }

    async fn list_for_advisor(
        &self,
        advisor_id: i32,
        status: ServiceRequestStatus,
    ) -> Result<Vec<ServiceRequestDetail>> {
        let query = format!(
            "{} WHERE sr.service_advisor_id = $1 AND sr.status = $2 \
             ORDER BY sr.delivery_date NULLS LAST, sr.created_at",
            DETAIL_SELECT
        );
        let rows = sqlx::query_as::<_, ServiceRequestDetailRow>(&query)
            .bind(advisor_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to list {} requests for advisor {}: {:?}",
                    status,
                    advisor_id,
                    e
                );
                AppError::Database(e)
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_status(&self, id: i32, status: ServiceRequestStatus) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE service_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status <> $3
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(ServiceRequestStatus::Completed)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update status of request {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn assign_advisor(
        &self,
        id: i32,
        advisor_id: i32,
        status: ServiceRequestStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE service_requests
            SET service_advisor_id = $2, status = $3, updated_at = NOW()
            WHERE id = $1 AND status <> $4
            "#,
        )
        .bind(id)
        .bind(advisor_id)
        .bind(status)
        .bind(ServiceRequestStatus::Completed)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to assign request {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
