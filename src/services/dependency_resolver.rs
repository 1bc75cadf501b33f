use std::collections::{HashMap, HashSet};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AgentTemplate;

/// A node in a dependency graph: an id and the ids it waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    pub id: String,
    pub depends_on: Vec<String>,
}

impl DependencyNode {
    pub fn new<I, S>(id: impl Into<String>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&AgentTemplate> for DependencyNode {
    fn from(template: &AgentTemplate) -> Self {
        Self::new(template.id.clone(), template.depends_on.iter().cloned())
    }
}

/// Service for ordering nodes into dependency stages
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver;

impl DependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Group nodes into stages with Kahn's algorithm.
    ///
    /// Dependencies on ids outside `nodes` are ignored. Stage 0 keeps the
    /// input order; later stages are sorted by id. Every node lands in
    /// exactly one stage, after all of its in-set dependencies.
    pub fn execution_stages(&self, nodes: &[DependencyNode]) -> DomainResult<Vec<Vec<String>>> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), i).is_some() {
                return Err(DomainError::ValidationFailed(format!(
                    "Duplicate template id: {}",
                    node.id
                )));
            }
        }

        // Arena adjacency: successors[dep] lists the nodes waiting on dep.
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut in_degree: Vec<usize> = vec![0; nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            let deps: HashSet<usize> = node
                .depends_on
                .iter()
                .filter_map(|dep| index.get(dep.as_str()).copied())
                .collect();
            for dep in deps {
                successors[dep].push(i);
                in_degree[i] += 1;
            }
        }

        let mut stages: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut covered = 0;

        while !current.is_empty() {
            covered += current.len();
            let mut next = Vec::new();
            for &done in &current {
                for &succ in &successors[done] {
                    in_degree[succ] -= 1;
                    if in_degree[succ] == 0 {
                        next.push(succ);
                    }
                }
            }
            next.sort_by(|&a, &b| nodes[a].id.cmp(&nodes[b].id));
            stages.push(std::mem::replace(&mut current, next));
        }

        if covered < nodes.len() {
            let stuck: Vec<String> = nodes
                .iter()
                .enumerate()
                .filter(|&(i, _)| in_degree[i] > 0)
                .map(|(_, n)| n.id.clone())
                .collect();
            return Err(DomainError::CircularDependency(stuck));
        }

        Ok(stages
            .into_iter()
            .map(|stage| stage.into_iter().map(|i| nodes[i].id.clone()).collect())
            .collect())
    }

    /// Stages flattened into a single valid execution order.
    pub fn topological_order(&self, nodes: &[DependencyNode]) -> DomainResult<Vec<String>> {
        Ok(self.execution_stages(nodes)?.into_iter().flatten().collect())
    }
}
