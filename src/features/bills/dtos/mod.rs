mod bill_dto;

pub use bill_dto::{BillLineItemDto, BillLineItemResponseDto, BillRequestDto, BillResponseDto};
