mod bill_handler;

pub use bill_handler::*;
