//! frpsctl - A control panel for a local frps server
//!
//! This library provides a small HTTP service that:
//! - Discovers the frps install (config file, executable, log path) once at startup
//! - Reports whether frps is running by scanning the OS process table
//! - Starts frps detached with its config file, or force-stops every frps process
//! - Reads and rewrites the flat `key=value` frps configuration file

pub mod api;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod monitor;
pub mod paths;
pub mod process;
pub mod service;
pub mod store;
