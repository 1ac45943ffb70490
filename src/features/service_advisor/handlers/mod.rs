mod api_handler;
mod page_handler;

pub use api_handler::*;
pub use page_handler::*;
