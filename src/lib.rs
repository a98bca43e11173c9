//! Forum content and moderation engine.
//!
//! Owns categories, topics and posts, their lock/pin/report states, the
//! role-based authorization matrix governing every mutation, and the
//! counting/cascade invariants that must hold across concurrent readers
//! and writers. The binary wires a JSON API over these operations; see
//! the `web` module.

pub mod config;
pub mod constants;
pub mod db;
pub mod forum;
pub mod identity;
pub mod web;
