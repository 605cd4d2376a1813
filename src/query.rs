//! Parameter queries over a project's experiments.
//!
//! A query is an ordered list of clauses: logical OR across clauses, logical
//! AND within a clause. Values compare as strings, matching how the service
//! stores parameters, so a clause value of `200` matches a stored `"200"`.

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::client::CometClient;
use crate::error::Result;

/// One conjunction of required parameter values.
pub type Clause = HashMap<String, Value>;

/// A parameter query: one clause, or an ordered OR of clauses.
#[derive(Debug, Clone)]
pub struct ParamQuery {
    clauses: Vec<Clause>,
}

impl ParamQuery {
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
}

impl From<Clause> for ParamQuery {
    fn from(clause: Clause) -> Self {
        Self {
            clauses: vec![clause],
        }
    }
}

impl From<Vec<Clause>> for ParamQuery {
    fn from(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }
}

/// Where the query layer gets experiment keys and their parameters.
///
/// [`CometClient`] is the real source; tests substitute in-memory fakes.
#[async_trait]
pub trait ExperimentSource {
    /// Keys of all experiments in a project, in service order.
    async fn experiment_keys(&self, project_id: &str) -> Result<Vec<String>>;

    /// Parameter name → current value for one experiment.
    async fn experiment_params(&self, experiment_key: &str)
        -> Result<HashMap<String, String>>;
}

#[async_trait]
impl ExperimentSource for CometClient {
    async fn experiment_keys(&self, project_id: &str) -> Result<Vec<String>> {
        let experiments = self.get_experiments(project_id).await?;
        Ok(experiments.into_iter().map(|e| e.experiment_key).collect())
    }

    async fn experiment_params(
        &self,
        experiment_key: &str,
    ) -> Result<HashMap<String, String>> {
        self.get_params(experiment_key).await
    }
}

/// Render a clause value to the string form the service stores.
fn query_value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// True iff every pair of `clause` is present in `params` with an equal
/// string value. An empty clause is vacuously true.
fn clause_matches(params: &HashMap<String, String>, clause: &Clause) -> bool {
    clause.iter().all(|(name, value)| match params.get(name) {
        Some(stored) => *stored == query_value_string(value),
        None => false,
    })
}

/// Keys of the experiments in `project_id` whose parameters satisfy at
/// least one clause of `query`.
///
/// Fetches the experiment list once, then one parameter fetch per
/// experiment. The first matching clause (in input order) includes the
/// experiment and short-circuits the rest, so a key appears at most once,
/// in the order the service returned the experiments. An empty clause list
/// matches nothing.
pub async fn find_matching<S>(
    source: &S,
    project_id: &str,
    query: impl Into<ParamQuery>,
) -> Result<Vec<String>>
where
    S: ExperimentSource + Sync,
{
    let query = query.into();
    let keys = source.experiment_keys(project_id).await?;
    let mut matched = Vec::new();

    for key in keys {
        let params = source.experiment_params(&key).await?;
        for clause in query.clauses() {
            if clause_matches(&params, clause) {
                matched.push(key);
                break;
            }
        }
    }

    info!(
        project_id = %project_id,
        matched = matched.len(),
        clauses = query.clauses().len(),
        "parameter query finished"
    );
    Ok(matched)
}

/// Partition the experiment keys of `project_id` by the string value of
/// `group_param`.
///
/// Experiments lacking the parameter land in no group. Group keys keep
/// first-encounter order; members keep service order. Groups are created
/// lazily, so none is empty.
pub async fn group_by<S>(
    source: &S,
    project_id: &str,
    group_param: &str,
) -> Result<IndexMap<String, Vec<String>>>
where
    S: ExperimentSource + Sync,
{
    let keys = source.experiment_keys(project_id).await?;
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();

    for key in keys {
        let mut params = source.experiment_params(&key).await?;
        match params.remove(group_param) {
            Some(value) => groups.entry(value).or_default().push(key),
            None => debug!(experiment_key = %key, group_param, "parameter absent, skipping"),
        }
    }
    Ok(groups)
}

impl CometClient {
    /// See [`find_matching`].
    pub async fn find_matching(
        &self,
        project_id: &str,
        query: impl Into<ParamQuery>,
    ) -> Result<Vec<String>> {
        find_matching(self, project_id, query).await
    }

    /// See [`group_by`].
    pub async fn group_by(
        &self,
        project_id: &str,
        group_param: &str,
    ) -> Result<IndexMap<String, Vec<String>>> {
        group_by(self, project_id, group_param).await
    }
}
