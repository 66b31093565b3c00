//! Execution templates: `Task` (one Command-producing unit) and `TaskGroup`
//! (hierarchical container of Tasks/TaskGroups).

use std::collections::HashMap;

use super::command::Command;
use super::Id;

/// Key-op-value predicate conjunction evaluated against a render node's
/// characteristics, core count and ram during assignment eligibility
/// matching.
pub type Requirements = HashMap<String, String>;

/// The execution template owned by exactly one TaskNode.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: Id,
    pub name: String,
    pub runner: String,
    pub arguments: HashMap<String, String>,
    pub environment: HashMap<String, String>,
    pub requirements: Requirements,
    pub min_nb_cores: u32,
    pub max_nb_cores: u32,
    pub ram_use: u64,
    pub licence: Option<String>,
    pub tags: HashMap<String, String>,
    pub validation_expression: Option<String>,
    pub max_attempt: u32,
    pub timer: Option<f64>,
    /// Empty until `decomposed == true`: a task has commands iff decomposed.
    pub commands: Vec<Command>,
    pub decomposed: bool,
}

impl Task {
    pub fn new(id: Id, name: impl Into<String>, runner: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            runner: runner.into(),
            arguments: HashMap::new(),
            environment: HashMap::new(),
            requirements: HashMap::new(),
            min_nb_cores: 1,
            max_nb_cores: 1,
            ram_use: 0,
            licence: None,
            tags: HashMap::new(),
            validation_expression: None,
            max_attempt: 1,
            timer: None,
            commands: Vec::new(),
            decomposed: false,
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_environment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_max_attempt(mut self, max_attempt: u32) -> Self {
        self.max_attempt = max_attempt;
        self
    }

    pub fn with_licence(mut self, licence: impl Into<String>) -> Self {
        self.licence = Some(licence.into());
        self
    }

    /// Argument lookup with the HierarchicalDict fallback: own map first,
    /// then the given ancestor map (the TaskGroup's arguments). Mirrors
    /// `model::HierarchicalDict::get` for a single inheritance hop.
    pub fn resolve_argument(&self, key: &str, ancestor: &HashMap<String, String>) -> Option<String> {
        self.arguments
            .get(key)
            .or_else(|| ancestor.get(key))
            .cloned()
    }
}

/// Pluggable ordering policy over a folder's children during assignment.
/// Only the enumerated set is accepted from the wire; anything else is a
/// ValidationError (see `submission`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Strategy {
    Fifo,
    RoundRobin,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIFO" | "Fifo" => Ok(Strategy::Fifo),
            "RoundRobin" => Ok(Strategy::RoundRobin),
            other => Err(format!("unknown strategy {other}")),
        }
    }
}

/// Hierarchical container of Tasks and nested TaskGroups; carries
/// arguments/environment inherited by descendants.
#[derive(Debug, Clone)]
pub struct TaskGroup {
    pub id: Id,
    pub name: String,
    pub arguments: HashMap<String, String>,
    pub environment: HashMap<String, String>,
    pub requirements: Requirements,
    pub tags: HashMap<String, String>,
    pub strategy: Strategy,
}

impl TaskGroup {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            arguments: HashMap::new(),
            environment: HashMap::new(),
            requirements: HashMap::new(),
            tags: HashMap::new(),
            strategy: Strategy::Fifo,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_argument_overlays_ancestor_map() {
        let task = Task::new(1, "render", "maya_batch").with_argument("scene", "shot010.ma");
        let ancestor = HashMap::from([
            ("scene".to_string(), "default.ma".to_string()),
            ("renderer".to_string(), "arnold".to_string()),
        ]);
        assert_eq!(
            task.resolve_argument("scene", &ancestor).as_deref(),
            Some("shot010.ma")
        );
        assert_eq!(
            task.resolve_argument("renderer", &ancestor).as_deref(),
            Some("arnold")
        );
        assert_eq!(task.resolve_argument("missing", &ancestor), None);
    }

    #[test]
    fn strategy_parses_only_the_enumerated_set() {
        assert_eq!("FIFO".parse::<Strategy>(), Ok(Strategy::Fifo));
        assert_eq!("RoundRobin".parse::<Strategy>(), Ok(Strategy::RoundRobin));
        assert!("Bogus".parse::<Strategy>().is_err());
    }

    #[test]
    fn new_task_is_not_decomposed() {
        let task = Task::new(1, "render", "maya_batch");
        assert!(!task.decomposed);
        assert!(task.commands.is_empty());
    }
}
