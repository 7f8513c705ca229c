pub mod lead;
pub mod payment;
pub mod quote;
