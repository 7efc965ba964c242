//! # reelsim API
//!
//! JSON REST surface over a [`reelsim_core::QueryEngine`]. Queries run on
//! actix's blocking pool because category filtering may call a remote oracle.

mod rest;

pub use rest::{routes, AppState, RestApi};
