//! Defines the business logic of the knowledge base server: the models,
//! traits and service types upstream adapters (app/) implement and wire up.

pub mod document;
pub mod model;
pub mod plugin;
pub mod plugins;
pub mod provider;
pub mod repo;
pub mod service;
pub mod vector;
