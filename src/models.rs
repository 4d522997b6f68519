pub mod auth;
pub mod campaigns;
pub mod checkpoint;
pub mod notifications;
pub mod platform;
pub mod transactions;
pub mod users;
