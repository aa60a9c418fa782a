pub mod messages;
pub mod payments;
pub mod receipts;
