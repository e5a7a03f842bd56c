//! UI components.

pub mod hobby_graph;
