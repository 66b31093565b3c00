//! Client-side graph assembly and submission-document preparation: assemble
//! a [`graph::Graph`] of tasks and task groups, then hand it to
//! [`dumper::GraphDumper`] to decompose, cycle-check, lower dependencies, and
//! serialize to the [`wire::SubmissionWire`] shape the dispatcher accepts.

pub mod decompose;
pub mod dumper;
pub mod graph;
pub mod wire;

pub use dumper::GraphDumper;
pub use graph::{BuilderCommand, BuilderTask, BuilderTaskGroup, Graph, GraphNode};
pub use wire::{CommandWire, NodeKindWire, NodeWire, SubmissionWire, WireDependency};
