//! Core topology resolver and integration verifier for a multi-product Kubernetes platform
//! installer: given a bundle of annotated Helm charts and a cluster configuration document,
//! resolves a deployment topology and verifies every chart's prerequisite integrations.
//!
//! CLI flag parsing, Helm invocation mechanics, Kubernetes client construction and MCP wire
//! framing are consumed as external collaborators (see [`kube_client`] and [`helm_client`]) and
//! are not implemented here.

pub mod cel;
pub mod chart_source;
pub mod config;
pub mod constants;
pub mod dependency;
pub mod errors;
pub mod helm_client;
pub mod integration;
pub mod kube_client;
pub mod logger;
pub mod phase;
pub mod resolver;
pub mod settings;
pub mod topology;
pub mod topology_builder;
