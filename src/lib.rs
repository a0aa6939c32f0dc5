//! Vigil - Autonomous Web Security Agent
//!
//! Drives page navigation against a target, reasons about page content with
//! a locally hosted language model, optionally invokes an external OWASP ZAP
//! scan, and aggregates findings into a report filtered by risk threshold.

pub mod agent;
pub mod analysis;
pub mod config;
pub mod download;
pub mod error;
pub mod models;
pub mod navigator;
pub mod reasoning;
pub mod report;
pub mod scanner;
