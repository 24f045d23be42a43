// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Metadata store backed by a JSON document API.
//!
//! The API exposes one collection:
//! `GET {base}/{collection}` returns every record, `GET` and `DELETE` on
//! `{base}/{collection}/{id}` address a single document, and `PATCH` applies
//! a JSON merge patch to it (creating it when absent) and answers with the
//! merged document. Fields missing from the patch are left alone and `null`
//! clears a field, so two clients editing different fields never overwrite
//! each other. The server stamps `createdAt` when it creates a document.
//! The API has no push channel, so changes made by other clients are
//! discovered by polling.

use super::error::StoreError;
use super::path::document_id_for;
use super::record::{MetaInput, MetaRecord, sort_by_recency};
use super::store::{ChangeFeed, MetaStore, StoreChange};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct RemoteStoreSettings {
    pub base_url: String,
    pub collection: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

#[derive(Clone)]
struct RemoteEndpoint {
    client: reqwest::Client,
    collection_url: String,
}

impl RemoteEndpoint {
    fn document_url(&self, document_id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url,
            urlencoding::encode(document_id)
        )
    }

    async fn list(&self) -> Result<Vec<MetaRecord>, StoreError> {
        let response = self
            .client
            .get(&self.collection_url)
            .send()
            .await
            .map_err(|err| request_error("list", err))?;
        let response = expect_success(response, "list")?;
        let documents = response
            .json::<Vec<Value>>()
            .await
            .map_err(|err| StoreError::new(format!("Invalid metadata listing: {}", err)))?;
        documents.into_iter().map(parse_document).collect()
    }
}

pub struct RemoteMetaStore {
    endpoint: RemoteEndpoint,
    poll_interval: Duration,
    feed: ChangeFeed,
    polling: Arc<AtomicBool>,
}

impl RemoteMetaStore {
    pub fn new(settings: &RemoteStoreSettings) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| StoreError::new(format!("Failed to build HTTP client: {}", err)))?;
        let collection_url = format!(
            "{}/{}",
            settings.base_url.trim_end_matches('/'),
            urlencoding::encode(&settings.collection)
        );
        Ok(Self {
            endpoint: RemoteEndpoint {
                client,
                collection_url,
            },
            poll_interval: settings.poll_interval,
            feed: ChangeFeed::new(),
            polling: Arc::new(AtomicBool::new(false)),
        })
    }

    fn ensure_poller(&self, initial: Vec<MetaRecord>) {
        if self.polling.swap(true, Ordering::SeqCst) {
            return;
        }

        let endpoint = self.endpoint.clone();
        let feed = self.feed.clone();
        let polling = self.polling.clone();
        let interval = self.poll_interval;

        tokio::spawn(async move {
            let mut known = fingerprint(&initial);
            log::debug!(
                "Remote metadata poller started for {}",
                endpoint.collection_url
            );
            loop {
                tokio::time::sleep(interval).await;
                if should_stop(&feed, &polling) {
                    break;
                }
                match endpoint.list().await {
                    Ok(records) => {
                        let current = fingerprint(&records);
                        for document_id in changed_documents(&known, &current) {
                            feed.publish(&document_id);
                        }
                        known = current;
                    }
                    Err(err) => {
                        log::warn!("Remote metadata poll failed: {}", err);
                    }
                }
            }
            log::debug!(
                "Remote metadata poller stopped for {}",
                endpoint.collection_url
            );
        });
    }
}

#[async_trait]
impl MetaStore for RemoteMetaStore {
    async fn list(&self) -> Result<Vec<MetaRecord>, StoreError> {
        let mut records = self.endpoint.list().await?;
        sort_by_recency(&mut records);
        Ok(records)
    }

    async fn get(&self, document_id: &str) -> Result<Option<MetaRecord>, StoreError> {
        let response = self
            .endpoint
            .client
            .get(self.endpoint.document_url(document_id))
            .send()
            .await
            .map_err(|err| request_error("get", err))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = expect_success(response, "get")?;
        let document = response.json::<Value>().await.map_err(|err| {
            StoreError::new(format!("Invalid metadata document {}: {}", document_id, err))
        })?;
        parse_document(document).map(Some)
    }

    async fn merge(
        &self,
        document_id: &str,
        page_path: &str,
        input: &MetaInput,
        now: DateTime<Utc>,
    ) -> Result<MetaRecord, StoreError> {
        let response = self
            .endpoint
            .client
            .patch(self.endpoint.document_url(document_id))
            .header(reqwest::header::CONTENT_TYPE, "application/merge-patch+json")
            .body(merge_patch(page_path, input, now).to_string())
            .send()
            .await
            .map_err(|err| request_error("merge", err))?;
        let response = expect_success(response, "merge")?;
        let document = response.json::<Value>().await.map_err(|err| {
            StoreError::new(format!("Invalid metadata document {}: {}", document_id, err))
        })?;
        let record = parse_document(document)?;
        self.feed.publish(document_id);
        Ok(record)
    }

    async fn remove(&self, document_id: &str) -> Result<(), StoreError> {
        let response = self
            .endpoint
            .client
            .delete(self.endpoint.document_url(document_id))
            .send()
            .await
            .map_err(|err| request_error("delete", err))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        expect_success(response, "delete")?;
        self.feed.publish(document_id);
        Ok(())
    }

    async fn watch(&self) -> Result<broadcast::Receiver<StoreChange>, StoreError> {
        // List first so an unreachable store fails the subscription up front.
        let initial = self.endpoint.list().await?;
        let receiver = self.feed.subscribe();
        self.ensure_poller(initial);
        Ok(receiver)
    }

    fn describe(&self) -> String {
        format!("remote:{}", self.endpoint.collection_url)
    }
}

fn request_error(operation: &str, err: reqwest::Error) -> StoreError {
    StoreError::new(format!("Metadata store {} request failed: {}", operation, err))
}

fn expect_success(
    response: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StoreError::new(format!(
            "Metadata store {} returned HTTP {}",
            operation, status
        )))
    }
}

/// Merge patch for an upsert. Absent input fields are left out, blank ones
/// become `null`.
fn merge_patch(page_path: &str, input: &MetaInput, now: DateTime<Utc>) -> Value {
    let mut patch = Map::new();
    patch.insert("pagePath".to_string(), Value::from(page_path));
    let fields = [
        ("title", &input.title),
        ("description", &input.description),
        ("keywords", &input.keywords),
        ("ogTitle", &input.og_title),
        ("ogDescription", &input.og_description),
        ("ogImage", &input.og_image),
        ("canonicalUrl", &input.canonical_url),
    ];
    for (name, value) in fields {
        match value {
            Some(value) if value.trim().is_empty() => {
                patch.insert(name.to_string(), Value::Null);
            }
            Some(value) => {
                patch.insert(name.to_string(), Value::from(value.as_str()));
            }
            None => {}
        }
    }
    if let Some(robots) = input.robots {
        patch.insert("robots".to_string(), Value::from(robots.as_str()));
    }
    patch.insert("updatedAt".to_string(), Value::from(now.to_rfc3339()));
    Value::Object(patch)
}

fn parse_document(document: Value) -> Result<MetaRecord, StoreError> {
    let label = document
        .get("pagePath")
        .and_then(Value::as_str)
        .unwrap_or("<no pagePath>")
        .to_string();
    serde_json::from_value(document)
        .map_err(|err| StoreError::new(format!("Invalid metadata document {}: {}", label, err)))
}

/// Decides whether an idle poller exits. Clears the running flag first, then
/// takes it back if a watcher subscribed in between, since that watcher saw
/// the flag still set and started no poller of its own.
fn should_stop(feed: &ChangeFeed, polling: &AtomicBool) -> bool {
    if feed.receiver_count() > 0 {
        return false;
    }
    polling.store(false, Ordering::SeqCst);
    if feed.receiver_count() > 0 && !polling.swap(true, Ordering::SeqCst) {
        return false;
    }
    true
}

fn fingerprint(records: &[MetaRecord]) -> HashMap<String, DateTime<Utc>> {
    records
        .iter()
        .map(|record| (document_id_for(&record.page_path), record.updated_at))
        .collect()
}

fn changed_documents(
    previous: &HashMap<String, DateTime<Utc>>,
    current: &HashMap<String, DateTime<Utc>>,
) -> Vec<String> {
    let mut changed: Vec<String> = current
        .iter()
        .filter(|(id, updated_at)| previous.get(*id) != Some(*updated_at))
        .map(|(id, _)| id.clone())
        .collect();
    changed.extend(
        previous
            .keys()
            .filter(|id| !current.contains_key(*id))
            .cloned(),
    );
    changed.sort();
    changed
}
