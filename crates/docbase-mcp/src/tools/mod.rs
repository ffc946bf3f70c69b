//! Tool modules for docbase-mcp
//!
//! Each module registers tools for a specific category.

pub mod documents;
pub mod info;
