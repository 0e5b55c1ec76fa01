//! Core library for the Pazar catalog back-office.
//!
//! This crate exposes the catalog domain model, Diesel-backed repositories,
//! the bulk feed import pipeline and the service layer used by the admin
//! application.

pub mod db;
pub mod domain;
mod error_conversions;
pub mod feed;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod schema;
pub mod services;
