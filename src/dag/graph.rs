// src/dag/graph.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::engine::TaskName;
use crate::errors::{AssetdagError, Result};
use crate::exec::TaskWork;

/// A registered task: its name, declared prerequisites and unit of work.
#[derive(Clone)]
pub struct TaskDef {
    pub name: TaskName,
    /// Direct prerequisites, in declaration order.
    pub deps: Vec<TaskName>,
    pub work: Arc<dyn TaskWork>,
}

impl fmt::Debug for TaskDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDef")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

/// Explicitly constructed task registry keyed by task name.
///
/// Prerequisites may name tasks that are registered later; they are
/// resolved (and checked for cycles) when a run asks for a closure.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskName, TaskDef>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Fails with [`AssetdagError::DuplicateTask`] if the name
    /// is already taken.
    pub fn register<N>(
        &mut self,
        name: N,
        prerequisites: Vec<TaskName>,
        work: Arc<dyn TaskWork>,
    ) -> Result<()>
    where
        N: Into<TaskName>,
    {
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(AssetdagError::DuplicateTask(name));
        }

        debug!(task = %name, deps = ?prerequisites, "registering task");
        self.tasks.insert(
            name.clone(),
            TaskDef {
                name,
                deps: prerequisites,
                work,
            },
        );
        Ok(())
    }

    /// Return all task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&TaskDef> {
        self.tasks.get(name)
    }

    /// Immediate prerequisites of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.tasks
            .get(name)
            .map(|t| t.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task (tasks that list it as a prerequisite).
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.tasks
            .values()
            .filter(|t| t.deps.iter().any(|d| d == name))
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Resolve `target` and all of its transitive prerequisites.
    ///
    /// The result is in a topological order: every task appears after all
    /// of its prerequisites, and `target` comes last.
    pub fn closure(&self, target: &str) -> Result<Vec<TaskName>> {
        if !self.tasks.contains_key(target) {
            return Err(AssetdagError::UnknownTask(target.to_string()));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![target];

        while let Some(name) = stack.pop() {
            if !seen.insert(name) {
                continue;
            }
            for dep in self.dependencies_of(name) {
                if !self.tasks.contains_key(dep) {
                    return Err(AssetdagError::UnknownDependency {
                        task: name.to_string(),
                        dependency: dep.clone(),
                    });
                }
                stack.push(dep.as_str());
            }
        }

        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        let mut nodes: Vec<&str> = seen.into_iter().collect();
        nodes.sort_unstable();
        for name in &nodes {
            graph.add_node(*name);
        }
        for name in &nodes {
            for dep in self.dependencies_of(name) {
                graph.add_edge(dep.as_str(), *name, ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
            Err(cycle) => Err(AssetdagError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Group the closure of `target` into dependency levels.
    ///
    /// Level 0 holds tasks without prerequisites; every other task sits one
    /// level above its deepest prerequisite. Tasks in the same level never
    /// depend on each other and may run concurrently.
    pub fn plan(&self, target: &str) -> Result<Vec<Vec<TaskName>>> {
        let order = self.closure(target)?;
        let mut level_of: HashMap<&str, usize> = HashMap::new();
        let mut levels: Vec<Vec<TaskName>> = Vec::new();

        for name in &order {
            let level = self
                .dependencies_of(name)
                .iter()
                .filter_map(|d| level_of.get(d.as_str()))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level_of.insert(name.as_str(), level);

            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(name.clone());
        }

        for level in levels.iter_mut() {
            level.sort();
        }
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::noop;

    fn graph(edges: &[(&str, &[&str])]) -> TaskGraph {
        let mut g = TaskGraph::new();
        for (name, deps) in edges {
            g.register(*name, deps.iter().map(|d| d.to_string()).collect(), noop())
                .unwrap();
        }
        g
    }

    #[test]
    fn closure_orders_prerequisites_first() {
        let g = graph(&[
            ("build", &["scripts", "styles"]),
            ("clean", &[]),
            ("scripts", &["clean"]),
            ("styles", &["clean"]),
            ("unrelated", &[]),
        ]);

        let order = g.closure("build").unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(order.first().map(String::as_str), Some("clean"));
        assert_eq!(order.last().map(String::as_str), Some("build"));
        assert!(!order.iter().any(|t| t == "unrelated"));
    }

    #[test]
    fn forward_references_are_resolved_at_closure_time() {
        let mut g = TaskGraph::new();
        g.register("b", vec!["a".into()], noop()).unwrap();
        g.register("a", vec![], noop()).unwrap();
        assert_eq!(g.closure("b").unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut g = TaskGraph::new();
        g.register("a", vec![], noop()).unwrap();
        let err = g.register("a", vec![], noop()).unwrap_err();
        assert!(matches!(err, AssetdagError::DuplicateTask(ref n) if n == "a"));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn unknown_dependency_is_reported_with_owner() {
        let g = graph(&[("a", &["ghost"])]);
        match g.closure("a") {
            Err(AssetdagError::UnknownDependency { task, dependency }) => {
                assert_eq!(task, "a");
                assert_eq!(dependency, "ghost");
            }
            other => panic!("expected UnknownDependency, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let g = graph(&[("a", &["a"])]);
        assert!(matches!(g.closure("a"), Err(AssetdagError::DagCycle(_))));
    }

    #[test]
    fn cycle_outside_closure_does_not_matter() {
        let g = graph(&[("a", &[]), ("x", &["y"]), ("y", &["x"])]);
        assert_eq!(g.closure("a").unwrap(), vec!["a".to_string()]);
        assert!(matches!(g.closure("x"), Err(AssetdagError::DagCycle(_))));
    }

    #[test]
    fn plan_groups_into_levels() {
        let g = graph(&[
            ("build", &["scripts", "styles"]),
            ("clean", &[]),
            ("default", &["build"]),
            ("scripts", &["clean"]),
            ("styles", &["clean"]),
        ]);

        let plan = g.plan("default").unwrap();
        assert_eq!(
            plan,
            vec![
                vec!["clean".to_string()],
                vec!["scripts".to_string(), "styles".to_string()],
                vec!["build".to_string()],
                vec!["default".to_string()],
            ]
        );
        assert_eq!(g.dependents_of("clean"), vec!["scripts", "styles"]);
    }
}
