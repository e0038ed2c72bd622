// src/blockchain/services/mod.rs

pub mod approval;
pub mod balance;
pub mod quote;
pub mod router;
pub mod swap;
pub mod token;
pub mod transfer;
