// src/services/mod.rs
//
// Database-facing operations shared by the HTTP handlers. Each multi-row
// write runs in a single transaction.

pub mod account;
pub mod feed;
pub mod interaction;
pub mod notification;
pub mod post;
pub mod profile;
