// Anti-portfolio domain: data model, model-output ingestion and the build pipeline.
// Model calls go through llm_client and text extraction through extraction;
// nothing in here talks to the network directly.

pub mod analysis;
pub mod audio;
pub mod builder;
pub mod coerce;
pub mod flight_log;
pub mod handlers;
pub mod models;
pub mod names;
pub mod prompts;
pub mod repair;
pub mod sanitize;
pub mod schema;
