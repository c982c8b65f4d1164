//! `ledvirt` is the backend service of a browser-based LED lighting control
//! panel. It manages a catalog of physical LED strip devices, a registry of
//! virtual displays composed of per-device segments, and the effect state of
//! each display, and exposes them to the panel over a JSON protocol (raw TCP
//! and web).

#![recursion_limit = "256"]

#[macro_use]
extern crate tracing;

pub mod api;
pub mod db;
pub mod global;
pub mod models;
pub mod registry;
pub mod servers;
pub mod web;
