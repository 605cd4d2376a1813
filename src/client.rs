//! The REST client and the wire types it decodes.
//!
//! Every fetcher is a stateless one-shot GET: build the endpoint URL, attach
//! the query pairs, send the API key in the `Authorization` header, and
//! unwrap one named field from the JSON body. Nothing is cached or retried.

use std::collections::HashMap;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config;
use crate::error::{CometError, Result};

/// Endpoint root of the hosted service.
pub const DEFAULT_BASE_URL: &str = "https://www.comet.ml/api/rest/v1";

/// One project inside a workspace.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub project_name: String,
    pub project_id: String,
}

/// One tracked run, identified by an opaque key.
#[derive(Debug, Clone, Deserialize)]
pub struct Experiment {
    pub experiment_key: String,
}

/// A logged name/value record, used by both the params and log-other
/// endpoints. `value_min`/`value_max` track the extremes the service has
/// seen; most callers only want `value_current`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRecord {
    pub name: String,
    pub value_current: String,
    #[serde(default)]
    pub value_min: Option<String>,
    #[serde(default)]
    pub value_max: Option<String>,
}

/// One raw metric observation. The service reports `metricValue` as a
/// string; plain JSON numbers are tolerated and coerced later.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPoint {
    pub metric_name: String,
    pub metric_value: Value,
    #[serde(default)]
    pub step: Option<i64>,
    pub timestamp: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
struct WorkspacesResponse {
    workspaces: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
struct ExperimentsResponse {
    experiments: Vec<Experiment>,
}

#[derive(Debug, Deserialize)]
struct ParamsResponse {
    results: Vec<ValueRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogOtherResponse {
    log_other_list: Vec<ValueRecord>,
}

#[derive(Debug, Deserialize)]
struct HtmlResponse {
    html: String,
}

#[derive(Debug, Deserialize)]
struct CodeResponse {
    code: String,
}

#[derive(Debug, Deserialize)]
struct StdoutResponse {
    output: String,
}

#[derive(Debug, Deserialize)]
struct PackagesResponse {
    packages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GraphResponse {
    graph: Value,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    images: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawMetricsResponse {
    metrics: Vec<MetricPoint>,
}

#[derive(Debug, Deserialize)]
struct MetricSummariesResponse {
    results: Vec<Value>,
}

/// Client for the experiment-tracking REST service.
///
/// The API key lives in the client value, so distinct clients can carry
/// distinct tokens. Construct with [`CometClient::new`] or pick the key up
/// from the per-user key file with [`CometClient::from_key_file`].
pub struct CometClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CometClient {
    /// Create a client with an explicit API key against the hosted service.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Create a client with the key from `$HOME/.comet_rest_key`.
    ///
    /// A missing or unreadable key file yields a client with an empty key;
    /// the service then rejects its calls with an authorization error.
    pub fn from_key_file() -> Self {
        Self::new(config::load_api_key())
    }

    /// Point the client at a different endpoint root (trailing `/` trimmed).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the API key. Takes effect on the next request.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET an endpoint and decode the JSON body.
    ///
    /// The raw API key goes in the `Authorization` header (no `Bearer`
    /// prefix). A non-2xx status becomes [`CometError::Http`] carrying the
    /// status and the full response body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .query(query)
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CometError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Workspace names visible to the API key.
    pub async fn get_workspaces(&self) -> Result<Vec<String>> {
        let resp: WorkspacesResponse = self.get_json("workspaces", &[]).await?;
        Ok(resp.workspaces)
    }

    /// All projects in a workspace.
    pub async fn get_projects(&self, workspace: &str) -> Result<Vec<Project>> {
        let resp: ProjectsResponse = self.get_json("projects", &[("workspace", workspace)]).await?;
        Ok(resp.projects)
    }

    /// Project names in a workspace.
    pub async fn get_project_names(&self, workspace: &str) -> Result<Vec<String>> {
        let projects = self.get_projects(workspace).await?;
        Ok(projects.into_iter().map(|p| p.project_name).collect())
    }

    /// Project name → project id for a workspace.
    pub async fn get_project_names_and_ids(&self, workspace: &str) -> Result<HashMap<String, String>> {
        let projects = self.get_projects(workspace).await?;
        Ok(projects
            .into_iter()
            .map(|p| (p.project_name, p.project_id))
            .collect())
    }

    /// All experiments in a project, in service order.
    pub async fn get_experiments(&self, project_id: &str) -> Result<Vec<Experiment>> {
        let resp: ExperimentsResponse = self
            .get_json("experiments", &[("projectId", project_id)])
            .await?;
        Ok(resp.experiments)
    }

    /// Raw parameter records for an experiment.
    pub async fn get_raw_params(&self, experiment_key: &str) -> Result<Vec<ValueRecord>> {
        let resp: ParamsResponse = self
            .get_json("experiment/params", &[("experimentKey", experiment_key)])
            .await?;
        Ok(resp.results)
    }

    /// Parameter name → current value for an experiment.
    pub async fn get_params(&self, experiment_key: &str) -> Result<HashMap<String, String>> {
        let raw = self.get_raw_params(experiment_key).await?;
        Ok(raw.into_iter().map(|r| (r.name, r.value_current)).collect())
    }

    /// Raw logged-other records for an experiment.
    pub async fn get_raw_others(&self, experiment_key: &str) -> Result<Vec<ValueRecord>> {
        let resp: LogOtherResponse = self
            .get_json("experiment/log-other", &[("experimentKey", experiment_key)])
            .await?;
        Ok(resp.log_other_list)
    }

    /// Logged-other name → current value for an experiment.
    pub async fn get_others(&self, experiment_key: &str) -> Result<HashMap<String, String>> {
        let raw = self.get_raw_others(experiment_key).await?;
        Ok(raw.into_iter().map(|r| (r.name, r.value_current)).collect())
    }

    /// Rendered HTML report of an experiment.
    pub async fn get_html(&self, experiment_key: &str) -> Result<String> {
        let resp: HtmlResponse = self
            .get_json("experiment/html", &[("experimentKey", experiment_key)])
            .await?;
        Ok(resp.html)
    }

    /// Source code captured for an experiment.
    pub async fn get_code(&self, experiment_key: &str) -> Result<String> {
        let resp: CodeResponse = self
            .get_json("experiment/code", &[("experimentKey", experiment_key)])
            .await?;
        Ok(resp.code)
    }

    /// Captured stdout of an experiment.
    pub async fn get_stdout(&self, experiment_key: &str) -> Result<String> {
        let resp: StdoutResponse = self
            .get_json("experiment/stdout", &[("experimentKey", experiment_key)])
            .await?;
        Ok(resp.output)
    }

    /// Packages installed in the experiment's environment.
    pub async fn get_installed_packages(&self, experiment_key: &str) -> Result<Vec<String>> {
        let resp: PackagesResponse = self
            .get_json(
                "experiment/installed-packages",
                &[("experimentKey", experiment_key)],
            )
            .await?;
        Ok(resp.packages)
    }

    /// Dependency graph of an experiment. The upstream format is
    /// undocumented, so the payload is passed through untouched.
    pub async fn get_graph(&self, experiment_key: &str) -> Result<Value> {
        let resp: GraphResponse = self
            .get_json("experiment/graph", &[("experimentKey", experiment_key)])
            .await?;
        Ok(resp.graph)
    }

    /// Metadata records of the images logged by an experiment, untouched.
    pub async fn get_image_data(&self, experiment_key: &str) -> Result<Vec<Value>> {
        let resp: ImagesResponse = self
            .get_json("experiment/images", &[("experimentKey", experiment_key)])
            .await?;
        Ok(resp.images)
    }

    /// Raw metric points of an experiment, in service order.
    pub async fn get_raw_metrics(&self, experiment_key: &str) -> Result<Vec<MetricPoint>> {
        let resp: RawMetricsResponse = self
            .get_json("experiment/metrics-raw", &[("experimentKey", experiment_key)])
            .await?;
        Ok(resp.metrics)
    }

    /// Per-metric summary records of an experiment, untouched.
    pub async fn get_raw_metric_summaries(&self, experiment_key: &str) -> Result<Vec<Value>> {
        let resp: MetricSummariesResponse = self
            .get_json("experiment/metrics", &[("experimentKey", experiment_key)])
            .await?;
        Ok(resp.results)
    }
}
