pub mod models;
pub mod transaction_log_repository;
pub mod wallet_repository;
