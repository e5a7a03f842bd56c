//! Expandable force-directed hobby graph.
//!
//! A center node, one topic node per hobby, and achievement children that
//! appear when a topic is activated:
//! - [`GraphController`] owns the model and the expand/collapse state machine
//! - [`ForceSimulation`] lays nodes out behind the [`LayoutEngine`] trait
//! - [`ContentLoader`] fetches and parses each topic's document
//! - [`HobbyGraphCanvas`] renders everything on a canvas with enter/exit
//!   transitions, hover highlighting, drag, pan and zoom
//!
//! # Example
//!
//! ```ignore
//! use hobby_graph::{HobbyData, HobbyGraphCanvas};
//!
//! let data = HobbyData::default();
//! view! { <HobbyGraphCanvas data=data content_root="content" fullscreen=true /> }
//! ```

mod component;
pub mod config;
pub mod content;
pub mod controller;
pub mod data;
pub mod highlight;
mod render;
pub mod simulation;
mod state;
pub mod theme;
pub mod transition;
pub mod types;

pub use component::HobbyGraphCanvas;
pub use config::{ControllerConfig, GraphSettings};
pub use content::{ContentLoader, parse_document};
pub use controller::{ContentRequest, GraphController, Tooltip};
pub use data::HobbyData;
pub use simulation::{ForceParameters, ForceSimulation, LayoutEngine};
pub use theme::Theme;
pub use types::{Achievement, GraphLink, GraphNode, NodeKind, TopicContent};
