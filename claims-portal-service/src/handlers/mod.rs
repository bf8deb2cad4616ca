pub mod claims;
pub mod reports;
