//! The fetch resolution engine: breadth-first expansion over generations of
//! fetch tasks, with per-generation bounded concurrency.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::debug;

use tributary_core::address::resolve_address;
use tributary_core::types::{EmittedRecord, IntegrationPlan};

use crate::transport::{Transport, TransportRequest};

use super::error::ResolveError;
use super::expand::{instantiate, FetchTask, ParamSet};
use super::extract::extract_bindings;
use super::request::{build_url, merge_headers};
use super::subtable::subtable_records;
use super::types::ResolverConfig;

pub struct Resolver {
    config: ResolverConfig,
    transport: Arc<dyn Transport>,
}

impl Resolver {
    pub fn new(config: ResolverConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Resolves the whole plan and returns every emitted record, parents
    /// before their dependents.
    ///
    /// Tasks within one generation are independent and run concurrently,
    /// bounded by [`ResolverConfig::max_concurrency`]. The first fatal error
    /// aborts the run: in-flight siblings drain, no further generations are
    /// scheduled, and no records are returned.
    pub async fn resolve(
        &self,
        plan: &IntegrationPlan,
    ) -> Result<Vec<EmittedRecord>, ResolveError> {
        let limit = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut frontier: Vec<FetchTask> = plan
            .roots
            .iter()
            .flat_map(|root| instantiate(&root.id, root, &[], &ParamSet::new()))
            .collect();
        let mut records = Vec::new();
        let mut generation = 0usize;

        while !frontier.is_empty() {
            debug!(generation, tasks = frontier.len(), "dispatching generation");

            let mut handles = Vec::with_capacity(frontier.len());
            for task in frontier.drain(..) {
                let transport = self.transport.clone();
                let limit = limit.clone();
                let base_url = plan.base_url.clone();
                let default_headers = plan.default_headers.clone();
                handles.push(tokio::spawn(async move {
                    // Semaphore acquire only fails if the semaphore is closed,
                    // which never happens here.
                    let _permit = limit.acquire_owned().await.unwrap_or_else(|_| {
                        panic!("concurrency semaphore closed unexpectedly. This is a bug - please report it.");
                    });
                    resolve_task(transport.as_ref(), &base_url, &default_headers, task).await
                }));
            }

            // Drain every sibling before deciding the generation's fate, so
            // a failure never leaves tasks running unsupervised.
            let mut first_error = None;
            let mut next = Vec::new();
            for handle in handles {
                match handle.await {
                    Ok(Ok((record, children))) => {
                        records.push(record);
                        next.extend(children);
                    }
                    Ok(Err(e)) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(ResolveError::TaskJoin(e.to_string()));
                        }
                    }
                }
            }
            if let Some(e) = first_error {
                return Err(e);
            }

            frontier = next;
            generation += 1;
        }

        Ok(records)
    }
}

/// Resolves one concrete fetch task: build and send the request, unwrap the
/// payload, promote subtables, extract child bindings, and instantiate the
/// next-generation tasks.
async fn resolve_task(
    transport: &dyn Transport,
    base_url: &str,
    default_headers: &BTreeMap<String, String>,
    task: FetchTask,
) -> Result<(EmittedRecord, Vec<FetchTask>), ResolveError> {
    let node = &task.node;
    let url = build_url(base_url, &node.id, &task.params)?;

    debug!(id = %node.id, url = %url, "fetching node");
    let resp = transport
        .send(TransportRequest {
            method: node.request.method,
            url,
            headers: merge_headers(&node.request.headers, default_headers),
            query: node.request.query.clone(),
            body: node.request.body.clone(),
        })
        .await
        .map_err(|source| ResolveError::Transport {
            id: node.id.clone(),
            source,
        })?;

    if resp.status != 200 {
        return Err(ResolveError::FetchFailed {
            id: node.id.clone(),
            status: resp.status,
            reason: resp.reason.unwrap_or_else(|| "unexpected status".to_string()),
        });
    }

    let body: Value =
        serde_json::from_slice(&resp.body).map_err(|source| ResolveError::InvalidBody {
            id: node.id.clone(),
            source,
        })?;
    let payload = match &node.top_level_data_address {
        Some(address) => resolve_address(&body, address)
            .map_err(|source| ResolveError::Address {
                id: node.id.clone(),
                source,
            })?
            .clone(),
        None => body,
    };

    let sub_records = subtable_records(&node.id, &payload, &node.subtables)?;

    let bindings = extract_bindings(&payload, &node.extraction_specs).map_err(|source| {
        ResolveError::Extraction {
            id: node.id.clone(),
            source,
        }
    })?;

    for child_id in bindings.keys() {
        if !node.dependent_templates.contains_key(child_id) {
            return Err(ResolveError::UnknownChild {
                id: node.id.clone(),
                child: child_id.clone(),
            });
        }
    }

    let mut children = Vec::new();
    for (child_id, template) in &node.dependent_templates {
        match bindings.get(child_id) {
            // Extraction ran and found no records: nothing to fan out to.
            Some(param_sets) if param_sets.is_empty() => continue,
            Some(param_sets) => {
                children.extend(instantiate(child_id, template, param_sets, &task.params));
            }
            // No extraction feeds this child; its static boundParameters
            // (and inherited values) drive the fan-out.
            None => children.extend(instantiate(child_id, template, &[], &task.params)),
        }
    }
    debug!(id = %node.id, children = children.len(), "node resolved");

    let record = EmittedRecord {
        target_table: node.table().to_string(),
        payload,
        sub_records,
    };
    Ok((record, children))
}
