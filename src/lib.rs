//! pyintel: code intelligence for unsaved Python buffers.
//!
//! A tree-sitter engine answers completion, hover and definition queries;
//! a YAML SDK dictionary covers attribute access the engine cannot see
//! through (`kfp.dsl.`). Served as JSON over HTTP.

pub mod config;
pub mod lsp;
pub mod server;
pub mod treesitter;
