pub mod chain;
pub mod contract;
pub mod expirations;
pub mod record;
