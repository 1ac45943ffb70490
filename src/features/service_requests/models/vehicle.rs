use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i32,
    pub customer_id: i32,
    pub brand: String,
    pub model: String,
    pub registration_number: String,
    pub category: Option<String>,
}

impl Vehicle {
    /// "Brand Model", as printed on bills
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}
