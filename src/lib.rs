//! serverfn - server function extraction for JavaScript builds.
//!
//! serverfn runs after a client build and looks for functions whose body
//! opens with the `"use server"` directive. Each one is replaced in the
//! client bundle by a stub that POSTs `{ id, args }` to the backend, and the
//! function itself is collected into a generated server SDK that
//! dispatches calls by id.
//!
//! # Architecture
//!
//! - `parser`: tree-sitter JavaScript parsing and source spans
//! - `transform`: the pass itself (scan, extract, rewrite, register)
//! - `sdk`: rendering the registry as a dispatch module
//! - `emit`: writing rewritten artifacts and the SDK to disk
//! - `dispatch`: a typed Rust counterpart of the SDK for the wire protocol
//! - `config`: YAML configuration
//! - `report`: output formatting (text, JSON)

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod emit;
pub mod parser;
pub mod report;
pub mod sdk;
pub mod transform;

pub use config::{Config, ModuleFormat};
pub use dispatch::{BffRequest, DispatchError, Dispatcher};
pub use sdk::SdkAssembler;
pub use transform::{
    run_pass, Artifact, Diagnostic, FunctionRecord, IdentifierRegistry, Pass, PassOutput,
    TransformError,
};
