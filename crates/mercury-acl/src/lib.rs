//! The ACL/cost table that maps a pipeline name to a required group and a
//! quota cost. Loaded once at startup from YAML.

use std::collections::HashMap;
use std::path::Path;

use mercury_core::MercuryError;
use serde::Deserialize;

#[derive(Clone, Deserialize)]
struct PipelinePolicy {
    group: String,
    #[serde(default)]
    cost: i64,
}

#[derive(Clone, Deserialize)]
struct RawPolicyTable {
    default_group: String,
    #[serde(default)]
    default_cost: i64,
    #[serde(default)]
    pipelines: HashMap<String, PipelinePolicy>,
}

/// Result of looking up a pipeline: the group a caller must belong to, and
/// the number of quota credits the bind will cost that group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Policy {
    pub group: String,
    pub cost: i64,
}

/// The loaded ACL table. `lookup` is total: a pipeline absent from the table
/// falls back to `(default_group, default_cost)`.
pub struct PolicyTable {
    default_group: String,
    default_cost: i64,
    pipelines: HashMap<String, PipelinePolicy>,
}

impl PolicyTable {
    /// An empty, fully permissive table — used when no ACL file is
    /// configured, a documented default-open posture rather than a refusal
    /// to start.
    pub fn permissive() -> Self {
        Self {
            default_group: String::new(),
            default_cost: 1,
            pipelines: HashMap::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, MercuryError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MercuryError::Config(format!("reading {}: {e}", path.display())))?;
        let raw: RawPolicyTable = serde_yaml::from_str(&text)
            .map_err(|e| MercuryError::Config(format!("parsing {}: {e}", path.display())))?;
        Ok(Self {
            default_group: raw.default_group,
            default_cost: normalize_cost(raw.default_cost),
            pipelines: raw.pipelines,
        })
    }

    /// Look up the group/cost for `pipeline`. Always returns a result — an
    /// unlisted pipeline falls back to the table's default group/cost, and a
    /// listed pipeline with a non-positive cost inherits `default_cost`
    /// rather than some fixed floor.
    pub fn lookup(&self, pipeline: &str) -> Policy {
        match self.pipelines.get(pipeline) {
            Some(p) if !p.group.is_empty() => Policy {
                group: p.group.clone(),
                cost: if p.cost > 0 { p.cost } else { self.default_cost },
            },
            _ => Policy {
                group: self.default_group.clone(),
                cost: self.default_cost,
            },
        }
    }
}

/// `default_cost` itself has nothing to inherit from, so a non-positive
/// value in the file floors to 1 rather than to some other default.
fn normalize_cost(cost: i64) -> i64 {
    if cost <= 0 {
        1
    } else {
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PolicyTable {
        PolicyTable {
            default_group: "general".to_string(),
            default_cost: 1,
            pipelines: HashMap::from([
                (
                    "nightly-export".to_string(),
                    PipelinePolicy { group: "export-pipelines".to_string(), cost: 5 },
                ),
                (
                    "salary".to_string(),
                    PipelinePolicy { group: "finance".to_string(), cost: 0 },
                ),
            ]),
        }
    }

    #[test]
    fn listed_pipeline_uses_its_policy() {
        let p = table().lookup("nightly-export");
        assert_eq!(p.group, "export-pipelines");
        assert_eq!(p.cost, 5);
    }

    #[test]
    fn unlisted_pipeline_falls_back_to_default() {
        let p = table().lookup("unknown-pipeline");
        assert_eq!(p.group, "general");
        assert_eq!(p.cost, 1);
    }

    #[test]
    fn non_positive_default_cost_normalizes_to_one() {
        assert_eq!(normalize_cost(0), 1);
        assert_eq!(normalize_cost(-5), 1);
        assert_eq!(normalize_cost(3), 3);
    }

    #[test]
    fn listed_pipeline_with_non_positive_cost_inherits_default_cost() {
        let mut t = table();
        t.default_cost = 7;
        let p = t.lookup("salary");
        assert_eq!(p.group, "finance");
        assert_eq!(p.cost, 7);
    }

    #[test]
    fn permissive_table_allows_everything_cheaply() {
        let p = PolicyTable::permissive().lookup("anything");
        assert_eq!(p.group, "");
        assert_eq!(p.cost, 1);
    }
}
