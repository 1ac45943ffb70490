//! Service advisor dashboard: server-rendered pages plus the JSON API the
//! page calls.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/serviceAdvisor/dashboard` | Dashboard page |
//! | GET | `/serviceAdvisor/login` | Sign-in landing page |
//! | POST | `/serviceAdvisor/logout` | End the session |
//! | GET | `/serviceAdvisor/api/new-assignments` | Assigned, not started |
//! | GET | `/serviceAdvisor/api/assigned-services` | Assigned, in progress |
//! | GET | `/serviceAdvisor/api/service-details/{id}` | Request details |
//! | PUT | `/serviceAdvisor/api/update-status/{id}` | Change status |
//! | POST | `/serviceAdvisor/api/assign-service/{id}` | Assign request |

pub mod handlers;
pub mod routes;
mod state;

pub use state::AdvisorState;
