use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Line item kind enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "bill_line_item_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LineItemKind {
    Material,
    Labor,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Bill {
    pub id: i64,
    pub request_id: i32,
    pub materials_total: Decimal,
    pub labor_total: Decimal,
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub grand_total: Decimal,
    pub notes: Option<String>,
    pub email_sent: bool,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BillLineItem {
    pub id: i64,
    pub bill_id: i64,
    pub kind: LineItemKind,
    pub position: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// A persisted bill and its line items in entry order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillWithItems {
    pub bill: Bill,
    pub items: Vec<BillLineItem>,
}

impl BillWithItems {
    pub fn items_of(&self, kind: LineItemKind) -> impl Iterator<Item = &BillLineItem> {
        self.items.iter().filter(move |item| item.kind == kind)
    }
}

#[derive(Debug, Clone)]
pub struct NewBill {
    pub request_id: i32,
    pub materials_total: Decimal,
    pub labor_total: Decimal,
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub grand_total: Decimal,
    pub notes: Option<String>,
    pub items: Vec<NewBillLineItem>,
}

#[derive(Debug, Clone)]
pub struct NewBillLineItem {
    pub kind: LineItemKind,
    pub position: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}
