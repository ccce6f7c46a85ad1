// src/models/mod.rs

pub mod comment;
pub mod notification;
pub mod post;
pub mod profile;
pub mod relation;
pub mod tag;
pub mod user;
