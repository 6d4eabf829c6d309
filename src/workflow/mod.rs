/// Workflow Management Layer
///
/// This module handles workflow definitions and the live session registry.
/// It provides the core workflow management functionality including:
/// - Type definitions (Workflow, Node, Edge, Payload)
/// - Data type compatibility checks for connections
/// - The node library and graph editing operations
/// - Lock-free session registry using ArcSwap

// Core workflow type definitions
pub mod types;

// Connection compatibility rules
pub mod compat;

// Node templates the user picks from
pub mod library;

// Graph editing operations on Workflow
pub mod builder;

// Live workflow sessions keyed by id
pub mod registry;

// Re-export commonly used types
pub use types::{DataType, Edge, Node, NodeConfig, NodeKind, Payload, Workflow};
