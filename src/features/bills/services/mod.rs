mod bill_service;
mod pdf_renderer;

pub use bill_service::BillService;
pub use pdf_renderer::{PdfError, PdfRenderer};
