//! Command-line front end for the answer grader.
//!
//! The binary wires configuration, providers and the evaluation engine
//! together; the command bodies live here so they can be tested without
//! spawning a process.

#![warn(missing_docs)]

pub mod commands;
