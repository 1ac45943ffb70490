//! Service bills: generation, lookup and PDF download.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/bills/service-request/{id}` | Staff | Generate bill, complete request |
//! | GET | `/api/bills/service-request/{id}` | Yes | Latest bill (customers: own only) |
//! | GET | `/api/bills/service-request/{id}/download` | Yes | Latest bill as PDF |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

pub use repository::{BillRepository, PgBillRepository};
pub use services::BillService;
