//! Immutable registry of migration edges and shortest-path search over them.

use std::collections::{HashMap, HashSet, VecDeque};

use super::errors::MigrationError;
use super::steps::MigrationStep;
use crate::tree::Tree;

pub(crate) type Check = fn(&Tree) -> Result<(), String>;
pub(crate) type Transform = fn(&mut Tree) -> Result<(), String>;

/// A directed edge between two exact schema versions.
#[derive(Debug, Clone)]
pub struct Migration {
    pub(crate) from: &'static str,
    pub(crate) to: &'static str,
    pub(crate) description: &'static str,
    pub(crate) validate: Check,
    pub(crate) apply: Transform,
    pub(crate) rollback: Transform,
}

impl Migration {
    pub fn from_version(&self) -> &str {
        self.from
    }

    pub fn to_version(&self) -> &str {
        self.to
    }

    pub fn description(&self) -> &str {
        self.description
    }
}

#[derive(Debug, Clone)]
pub struct MigrationRegistry {
    migrations: Vec<Migration>,
}

impl MigrationRegistry {
    /// Registry of every built-in step.
    pub fn builtin() -> Self {
        Self {
            migrations: MigrationStep::all().iter().map(|s| s.migration()).collect(),
        }
    }

    /// Build a registry, rejecting a second edge for the same version pair.
    pub(crate) fn new(migrations: Vec<Migration>) -> Result<Self, MigrationError> {
        let mut seen = HashSet::new();
        for m in &migrations {
            if !seen.insert((m.from, m.to)) {
                return Err(MigrationError::DuplicateEdge {
                    from: m.from.to_string(),
                    to: m.to.to_string(),
                });
            }
        }
        Ok(Self { migrations })
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Every version that appears on either end of an edge, sorted.
    pub fn versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = self
            .migrations
            .iter()
            .flat_map(|m| [m.from.to_string(), m.to.to_string()])
            .collect();
        versions.sort();
        versions.dedup();
        versions
    }

    /// Fewest-hop sequence of edges from `from` to `to`.
    ///
    /// Breadth-first; neighbours are expanded in registration order, so among
    /// equal-length paths the one found first in that order wins. An empty
    /// path means the versions are equal.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Vec<&Migration>, MigrationError> {
        if from == to {
            return Ok(Vec::new());
        }

        let mut came_from: HashMap<&str, usize> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<&str> = VecDeque::from([from]);

        while let Some(version) = queue.pop_front() {
            for (index, edge) in self.migrations.iter().enumerate() {
                if edge.from != version || !visited.insert(edge.to) {
                    continue;
                }
                came_from.insert(edge.to, index);

                if edge.to == to {
                    return Ok(self.unwind(&came_from, from, to));
                }
                queue.push_back(edge.to);
            }
        }

        Err(MigrationError::NoPath {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    fn unwind(&self, came_from: &HashMap<&str, usize>, from: &str, to: &str) -> Vec<&Migration> {
        let mut path = Vec::new();
        let mut cursor = to;
        while cursor != from {
            let Some(&index) = came_from.get(cursor) else {
                break;
            };
            let edge = &self.migrations[index];
            path.push(edge);
            cursor = edge.from;
        }
        path.reverse();
        path
    }
}
