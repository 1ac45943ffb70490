//! Fixtures shared by unit and handler tests

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    Router,
};
use axum_test::{TestResponse, TestServer};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::config::SessionConfig;
use crate::core::error::{AppError, Result};
use crate::core::middleware::session_middleware;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::JwtValidator;
use crate::features::bills::models::{Bill, BillLineItem, BillWithItems, NewBill};
use crate::features::bills::repository::BillRepository;
use crate::features::service_advisor::{routes as advisor_routes, AdvisorState};
use crate::features::service_requests::models::{
    CustomerProfile, ServiceRequest, ServiceRequestDetail, ServiceRequestStatus, User, Vehicle,
};
use crate::features::service_requests::repository::ServiceRequestRepository;
use crate::features::service_requests::{AssignmentService, ServiceRequestService};
use crate::modules::email::{EmailError, EmailSender};
use crate::modules::session::SessionStore;
use crate::shared::constants::ROLE_CUSTOMER;

pub const TEST_JWT_SECRET: &str = "service-center-test-secret";

pub const TEST_SESSION_COOKIE: &str = "sc_session";

/// HS256 token for `user_id` with the given roles, valid for an hour
pub fn issue_token(user_id: i32, roles: &[&str]) -> String {
    sign(json!({
        "sub": user_id.to_string(),
        "exp": (Utc::now() + ChronoDuration::hours(1)).timestamp(),
        "roles": roles,
    }))
}

pub fn issue_token_with_names(user_id: i32, roles: &[&str], first: &str, last: &str) -> String {
    sign(json!({
        "sub": user_id.to_string(),
        "exp": (Utc::now() + ChronoDuration::hours(1)).timestamp(),
        "roles": roles,
        "given_name": first,
        "family_name": last,
    }))
}

fn sign(claims: serde_json::Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn test_validator() -> Arc<JwtValidator> {
    Arc::new(JwtValidator::new(
        TEST_JWT_SECRET,
        None,
        Duration::from_secs(0),
    ))
}

pub fn test_session_store() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(&SessionConfig {
        cookie_name: TEST_SESSION_COOKIE.to_string(),
        idle_timeout: Duration::from_secs(600),
        secure_cookie: false,
    }))
}

/// Request principal matching a stored user
pub fn authenticated(user: &User) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: user.id,
        sub: user.id.to_string(),
        roles: vec![user.role.clone()],
        first_name: Some(user.first_name.clone()),
        last_name: Some(user.last_name.clone()),
        email: Some(user.email.clone()),
    }
}

pub fn with_session(router: Router, store: Arc<SessionStore>) -> Router {
    router.layer(axum::middleware::from_fn_with_state(
        store,
        session_middleware,
    ))
}

/// Inject a fixed principal, standing in for the bearer-token middleware
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}

/// Dashboard routes over `store`, behind a fresh session layer
pub fn advisor_server(store: &Arc<InMemoryStore>) -> TestServer {
    let state = AdvisorState {
        service_requests: Arc::new(ServiceRequestService::new(store.clone())),
        assignments: Arc::new(AssignmentService::new(store.clone())),
        jwt_validator: test_validator(),
    };
    let app = with_session(advisor_routes::routes(state), test_session_store());
    TestServer::new(app).unwrap()
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

/// `Cookie` header value for the session issued by `response`, if any
pub fn session_cookie(response: &TestResponse) -> Option<HeaderValue> {
    let raw = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let pair = raw.split(';').next()?.trim();
    let value = pair.strip_prefix(TEST_SESSION_COOKIE)?.strip_prefix('=')?;
    if value.is_empty() {
        return None;
    }
    HeaderValue::from_str(pair).ok()
}

#[derive(Default)]
struct StoreState {
    next_id: i32,
    next_bill_id: i64,
    users: HashMap<i32, User>,
    customers: HashMap<i32, CustomerProfile>,
    vehicles: HashMap<i32, Vehicle>,
    requests: HashMap<i32, ServiceRequest>,
    bills: Vec<BillWithItems>,
    status_writes: usize,
}

impl StoreState {
    fn id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn detail(&self, id: i32) -> Option<ServiceRequestDetail> {
        let request = self.requests.get(&id)?.clone();
        let vehicle = self.vehicles.get(&request.vehicle_id)?.clone();
        let customer = self.customers.get(&vehicle.customer_id)?.clone();
        let service_advisor_name = request
            .service_advisor_id
            .and_then(|advisor| self.users.get(&advisor))
            .map(User::full_name);

        Some(ServiceRequestDetail {
            request,
            vehicle,
            customer,
            service_advisor_name,
        })
    }
}

/// In-memory stand-in for the Postgres repositories
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn add_user(&self, role: &str) -> User {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        let user = User {
            id,
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            email: format!("user{}@example.com", id),
            role: role.to_string(),
        };
        state.users.insert(id, user.clone());
        user
    }

    /// A request for a freshly created customer and vehicle
    pub fn add_request(&self, status: ServiceRequestStatus, advisor_id: Option<i32>) -> i32 {
        let owner = self.add_user(ROLE_CUSTOMER);

        let mut state = self.state.lock().unwrap();
        let customer_id = state.id();
        state.customers.insert(
            customer_id,
            CustomerProfile {
                id: customer_id,
                user: owner,
                membership_status: Some("Standard".to_string()),
            },
        );

        let vehicle_id = state.id();
        state.vehicles.insert(
            vehicle_id,
            Vehicle {
                id: vehicle_id,
                customer_id,
                brand: "Maruti".to_string(),
                model: "Swift".to_string(),
                registration_number: format!("KA-01-AB-{:04}", vehicle_id),
                category: Some("Hatchback".to_string()),
            },
        );

        let id = state.id();
        let now = Utc::now();
        state.requests.insert(
            id,
            ServiceRequest {
                id,
                vehicle_id,
                service_type: "General Service".to_string(),
                delivery_date: NaiveDate::from_ymd_opt(2025, 6, 1),
                additional_description: None,
                admin_id: None,
                service_advisor_id: advisor_id,
                status,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn request(&self, id: i32) -> ServiceRequest {
        self.state.lock().unwrap().requests[&id].clone()
    }

    pub fn request_detail(&self, id: i32) -> ServiceRequestDetail {
        self.state.lock().unwrap().detail(id).unwrap()
    }

    /// Status updates written through either repository
    pub fn status_writes(&self) -> usize {
        self.state.lock().unwrap().status_writes
    }

    /// Overwrite a status directly, bypassing the write counter
    pub fn set_status(&self, id: i32, status: ServiceRequestStatus) {
        if let Some(request) = self.state.lock().unwrap().requests.get_mut(&id) {
            request.status = status;
        }
    }
}

/// Repository wrapper that completes the request (as a concurrent bill
/// generation would) between the caller's read and its write.
pub struct CompletedBeforeWrite {
    store: Arc<InMemoryStore>,
}

impl CompletedBeforeWrite {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ServiceRequestRepository for CompletedBeforeWrite {
    async fn find_detail(&self, id: i32) -> Result<Option<ServiceRequestDetail>> {
        self.store.find_detail(id).await
    }

    async fn list_for_advisor(
        &self,
        advisor_id: i32,
        status: ServiceRequestStatus,
    ) -> Result<Vec<ServiceRequestDetail>> {
        self.store.list_for_advisor(advisor_id, status).await
    }

    async fn update_status(&self, id: i32, status: ServiceRequestStatus) -> Result<bool> {
        self.store.set_status(id, ServiceRequestStatus::Completed);
        self.store.update_status(id, status).await
    }

    async fn assign_advisor(
        &self,
        id: i32,
        advisor_id: i32,
        status: ServiceRequestStatus,
    ) -> Result<bool> {
        self.store.set_status(id, ServiceRequestStatus::Completed);
        self.store.assign_advisor(id, advisor_id, status).await
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>> {
        self.store.find_user(id).await
    }
}

#[async_trait]
impl ServiceRequestRepository for InMemoryStore {
    async fn find_detail(&self, id: i32) -> Result<Option<ServiceRequestDetail>> {
        Ok(self.state.lock().unwrap().detail(id))
    }

    async fn list_for_advisor(
        &self,
        advisor_id: i32,
        status: ServiceRequestStatus,
    ) -> Result<Vec<ServiceRequestDetail>> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<i32> = state
            .requests
            .values()
            .filter(|r| r.service_advisor_id == Some(advisor_id) && r.status == status)
            .map(|r| r.id)
            .collect();
        ids.sort_unstable();

        Ok(ids.into_iter().filter_map(|id| state.detail(id)).collect())
    }

    async fn update_status(&self, id: i32, status: ServiceRequestStatus) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let Some(request) = state.requests.get_mut(&id) else {
            return Ok(false);
        };
        if request.status == ServiceRequestStatus::Completed {
            return Ok(false);
        }
        request.status = status;
        request.updated_at = Utc::now();
        state.status_writes += 1;
        Ok(true)
    }

    async fn assign_advisor(
        &self,
        id: i32,
        advisor_id: i32,
        status: ServiceRequestStatus,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let Some(request) = state.requests.get_mut(&id) else {
            return Ok(false);
        };
        if request.status == ServiceRequestStatus::Completed {
            return Ok(false);
        }
        request.service_advisor_id = Some(advisor_id);
        request.status = status;
        Ok(true)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>> {
        Ok(self.state.lock().unwrap().users.get(&id).cloned())
    }
}

#[async_trait]
impl BillRepository for InMemoryStore {
    async fn finalize(&self, new_bill: NewBill) -> Result<BillWithItems> {
        let mut state = self.state.lock().unwrap();

        let request = state
            .requests
            .get_mut(&new_bill.request_id)
            .ok_or_else(|| AppError::Database(sqlx::Error::RowNotFound))?;
        let completed_now = request.status != ServiceRequestStatus::Completed;
        request.status = ServiceRequestStatus::Completed;
        if completed_now {
            state.status_writes += 1;
        }

        state.next_bill_id += 1;
        let bill_id = state.next_bill_id;
        let items = new_bill
            .items
            .into_iter()
            .enumerate()
            .map(|(i, item)| BillLineItem {
                id: bill_id * 1000 + i as i64,
                bill_id,
                kind: item.kind,
                position: item.position,
                description: item.description,
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: item.total,
            })
            .collect();

        let saved = BillWithItems {
            bill: Bill {
                id: bill_id,
                request_id: new_bill.request_id,
                materials_total: new_bill.materials_total,
                labor_total: new_bill.labor_total,
                subtotal: new_bill.subtotal,
                gst: new_bill.gst,
                grand_total: new_bill.grand_total,
                notes: new_bill.notes,
                email_sent: false,
                generated_at: Utc::now(),
            },
            items,
        };
        state.bills.push(saved.clone());
        Ok(saved)
    }

    async fn set_email_sent(&self, bill_id: i64, sent: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(saved) = state.bills.iter_mut().find(|b| b.bill.id == bill_id) {
            saved.bill.email_sent = sent;
        }
        Ok(())
    }

    async fn latest_for_request(&self, request_id: i32) -> Result<Option<BillWithItems>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .bills
            .iter()
            .filter(|b| b.bill.request_id == request_id)
            .max_by_key(|b| b.bill.id)
            .cloned())
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Keeps every message instead of delivering it
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> std::result::Result<(), EmailError> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Fails every delivery
pub struct FailingEmailSender;

#[async_trait]
impl EmailSender for FailingEmailSender {
    async fn send(
        &self,
        _to: &str,
        _subject: &str,
        _body: &str,
    ) -> std::result::Result<(), EmailError> {
        Err(EmailError::Transport("connection refused".to_string()))
    }
}
