mod bill;

pub use bill::{Bill, BillLineItem, BillWithItems, LineItemKind, NewBill, NewBillLineItem};
