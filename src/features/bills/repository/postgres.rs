use async_trait::async_trait;
use sqlx::PgPool;

use super::BillRepository;
use crate::core::error::{AppError, Result};
use crate::features::bills::models::{Bill, BillLineItem, BillWithItems, NewBill};
use crate::features::service_requests::models::ServiceRequestStatus;

const BILL_COLUMNS: &str = "id, request_id, materials_total, labor_total, subtotal, gst, \
                            grand_total, notes, email_sent, generated_at";

const ITEM_COLUMNS: &str = "id, bill_id, kind, position, description, quantity, unit_price, total";

pub struct PgBillRepository {
    pool: PgPool,
}

impl PgBillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillRepository for PgBillRepository {
    async fn finalize(&self, new_bill: NewBill) -> Result<BillWithItems> {
        let request_id = new_bill.request_id;
        let mut tx = self.pool.begin().await?;

        let completed = sqlx::query(
            r#"
            UPDATE service_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status <> $2
            "#,
        )
        .bind(request_id)
        .bind(ServiceRequestStatus::Completed)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to complete service request {}: {:?}", request_id, e);
            AppError::Database(e)
        })?;

        if completed.rows_affected() > 0 {
            tracing::info!("Service request {} marked completed", request_id);
        }

        let insert_bill = format!(
            r#"
            INSERT INTO bills (request_id, materials_total, labor_total, subtotal, gst, grand_total, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            BILL_COLUMNS
        );
        let bill = sqlx::query_as::<_, Bill>(&insert_bill)
            .bind(request_id)
            .bind(new_bill.materials_total)
            .bind(new_bill.labor_total)
            .bind(new_bill.subtotal)
            .bind(new_bill.gst)
            .bind(new_bill.grand_total)
            .bind(&new_bill.notes)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert bill for request {}: {:?}", request_id, e);
                AppError::Database(e)
            })?;

        let insert_item = format!(
            r#"
            INSERT INTO bill_line_items (bill_id, kind, position, description, quantity, unit_price, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );
        let mut items = Vec::with_capacity(new_bill.items.len());
        for item in &new_bill.items {
            let saved = sqlx::query_as::<_, BillLineItem>(&insert_item)
                .bind(bill.id)
                .bind(item.kind)
                .bind(item.position)
                .bind(&item.description)
                .bind(item.quantity)
                .bind(item.unit_price)
                .bind(item.total)
                .fetch_one(&mut *tx)
                .await?;
            items.push(saved);
        }

        tx.commit().await?;

        Ok(BillWithItems { bill, items })
    }

    async fn set_email_sent(&self, bill_id: i64, sent: bool) -> Result<()> {
        sqlx::query("UPDATE bills SET email_sent = $2 WHERE id = $1")
            .bind(bill_id)
            .bind(sent)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn latest_for_request(&self, request_id: i32) -> Result<Option<BillWithItems>> {
        let select_bill = format!(
            r#"
            SELECT {}
            FROM bills
            WHERE request_id = $1
            ORDER BY generated_at DESC, id DESC
            LIMIT 1
            "#,
            BILL_COLUMNS
        );
        let bill = sqlx::query_as::<_, Bill>(&select_bill)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(bill) = bill else {
            return Ok(None);
        };

        let select_items = format!(
            "SELECT {} FROM bill_line_items WHERE bill_id = $1 ORDER BY kind, position",
            ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, BillLineItem>(&select_items)
            .bind(bill.id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(BillWithItems { bill, items }))
    }
}
