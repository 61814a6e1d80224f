//! Expositor Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Expositor
//! renderer pipeline. It includes:
//!
//! - **Capabilities**: Detection of optional external rendering engines
//!   ([`capability::CapabilitySet`], [`capability::probe`])
//! - **Requests**: The per-invocation input and normalized output of a render
//!   ([`request::RenderRequest`], [`request::RenderResult`])
//! - **Class model**: The in-memory graph of classes and relationships built
//!   from the structured class notation ([`class_model`] module)

pub mod capability;
pub mod class_model;
pub mod request;
