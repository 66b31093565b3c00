//! The `POST /graphs/` wire format, shared between the client serializer
//! ([`super::dumper`]) and the server decoder (`crate::submission`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One dependency edge as it appears on the wire: `[targetIndex, [statusInt,...]]`.
pub type WireDependency = (usize, Vec<u8>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionWire {
    pub name: String,
    #[serde(default)]
    pub meta: HashMap<String, String>,
    pub user: String,
    #[serde(rename = "poolName")]
    pub pool_name: String,
    #[serde(rename = "maxRN")]
    pub max_rn: i32,
    pub root: usize,
    pub tasks: Vec<NodeWire>,
}

/// A single entry in `tasks[]`. `type` discriminates Task vs TaskGroup; the
/// Task-only and TaskGroup-only fields are `None`/empty on the other kind,
/// a loose single-shape JSON object rather than a tagged union.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeWire {
    #[serde(rename = "type")]
    pub kind: NodeKindWire,
    pub name: String,
    /// The name this node is known by under its parent's named child slots,
    /// independent of its own display `name`. `None` if the node was never
    /// given one.
    #[serde(default)]
    pub rule: Option<String>,
    #[serde(default)]
    pub arguments: HashMap<String, String>,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    #[serde(default)]
    pub requirements: HashMap<String, String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub dependencies: Vec<WireDependency>,
    #[serde(rename = "maxRN", default)]
    pub max_rn: i32,
    #[serde(default)]
    pub priority: i32,
    #[serde(rename = "dispatchKey", default)]
    pub dispatch_key: f64,

    // Task-only.
    #[serde(default)]
    pub runner: Option<String>,
    #[serde(rename = "validationExpression", default)]
    pub validation_expression: Option<String>,
    #[serde(rename = "minNbCores", default)]
    pub min_nb_cores: Option<u32>,
    #[serde(rename = "maxNbCores", default)]
    pub max_nb_cores: Option<u32>,
    #[serde(rename = "ramUse", default)]
    pub ram_use: Option<u64>,
    #[serde(default)]
    pub licence: Option<String>,
    #[serde(default)]
    pub timer: Option<f64>,
    #[serde(rename = "maxAttempt", default)]
    pub max_attempt: Option<u32>,
    #[serde(default)]
    pub commands: Option<Vec<CommandWire>>,

    // TaskGroup-only.
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(rename = "tasks", default)]
    pub children: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKindWire {
    Task,
    TaskGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandWire {
    pub description: String,
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}
