//! Tool call handlers for docbase-mcp

pub mod documents;

pub use documents::DocToolHandler;
