#![doc = "The `todoserve` library crate."]
#![doc = ""]
#![doc = "Contains the domain models, authentication and authorization logic,"]
#![doc = "routing configuration, and error handling for the todoserve API."]
#![doc = "The binary (`main.rs`) uses this crate to construct and run the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod routes;
