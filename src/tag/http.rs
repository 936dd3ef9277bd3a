//! SystemLink tag service client (`/nitag/v2`)

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ureq::Body;
use ureq::http::Response;

use super::{
    Connection, DataType, ReadResult, StoreError, TagData, TagStore, TagValue, TagWrite,
    format_timestamp,
};

const API_ROOT: &str = "nitag/v2";
const API_KEY_HEADER: &str = "x-ni-api-key";
const QUERY_PAGE_SIZE: usize = 1000;

/// Characters kept as-is when a tag path is used as a URL path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTag {
    path: String,
    #[serde(rename = "type")]
    data_type: DataType,
    #[serde(default)]
    properties: BTreeMap<String, String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    collect_aggregates: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireValue {
    #[serde(rename = "type")]
    data_type: DataType,
    value: String,
}

#[derive(Debug, Deserialize)]
struct WireCurrent {
    value: WireValue,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct WireUpdate {
    value: WireValue,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct WirePathUpdates<'a> {
    path: &'a str,
    updates: Vec<WireUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTagPage {
    #[serde(default)]
    tags: Vec<WireTag>,
    #[serde(default)]
    total_count: Option<usize>,
}

pub(crate) struct HttpTagStore {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTagStore {
    pub(crate) fn connect(connection: &Connection) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(connection.request_timeout))
            .http_status_as_error(false)
            .build()
            .into();
        tracing::debug!(url = %connection.base_url, "connecting to tag service");
        Self {
            agent,
            base_url: connection.base_url.clone(),
            api_key: connection.api_key.clone(),
        }
    }

    fn tag_url(&self, path: &str, suffix: &str) -> String {
        format!(
            "{}/{API_ROOT}/tags/{}{suffix}",
            self.base_url,
            utf8_percent_encode(path, PATH_SEGMENT)
        )
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        let request = request.header("Accept", "application/json");
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key.as_str()),
            None => request,
        }
    }

    fn get(&self, url: &str) -> Result<Option<Response<Body>>, StoreError> {
        check(url, self.authorize(self.agent.get(url)).call())
    }

    fn get_page(&self, pattern: &str, skip: usize) -> Result<WireTagPage, StoreError> {
        let url = format!("{}/{API_ROOT}/tags", self.base_url);
        let result = self
            .authorize(self.agent.get(&url))
            .query("path", pattern)
            .query("skip", skip.to_string())
            .query("take", QUERY_PAGE_SIZE.to_string())
            .call();
        match check(&url, result)? {
            Some(response) => decode(&url, response),
            None => Ok(WireTagPage {
                tags: Vec::new(),
                total_count: Some(0),
            }),
        }
    }
}

fn check(
    url: &str,
    result: Result<Response<Body>, ureq::Error>,
) -> Result<Option<Response<Body>>, StoreError> {
    let mut response = result.map_err(|e| StoreError::Transport {
        url: url.to_string(),
        source: Box::new(e),
    })?;
    let status = response.status().as_u16();
    tracing::debug!(url, status, "tag service response");
    if status == 404 {
        return Ok(None);
    }
    if !(200..300).contains(&status) {
        let body = response.body_mut().read_to_string().unwrap_or_default();
        return Err(StoreError::Status {
            status,
            url: url.to_string(),
            body: body.trim().to_string(),
        });
    }
    Ok(Some(response))
}

fn decode<T: DeserializeOwned>(url: &str, response: Response<Body>) -> Result<T, StoreError> {
    let mut body = response.into_body();
    serde_json::from_reader(body.as_reader()).map_err(|e| StoreError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn missing_endpoint(url: &str) -> StoreError {
    StoreError::Status {
        status: 404,
        url: url.to_string(),
        body: String::new(),
    }
}

/// Group writes into per-path update lists, keeping first-seen path order
fn group_updates(writes: &[TagWrite]) -> Vec<WirePathUpdates<'_>> {
    let mut grouped: Vec<WirePathUpdates<'_>> = Vec::new();
    for write in writes {
        let update = WireUpdate {
            value: WireValue {
                data_type: write.value.data_type(),
                value: write.value.to_wire(),
            },
            timestamp: format_timestamp(write.timestamp),
        };
        match grouped.iter_mut().find(|g| g.path == write.path) {
            Some(group) => group.updates.push(update),
            None => grouped.push(WirePathUpdates {
                path: &write.path,
                updates: vec![update],
            }),
        }
    }
    grouped
}

impl TagStore for HttpTagStore {
    fn open(&self, path: &str, data_type: DataType, create: bool) -> Result<TagData, StoreError> {
        let url = self.tag_url(path, "");
        if let Some(response) = self.get(&url)? {
            let tag: WireTag = decode(&url, response)?;
            if tag.data_type != data_type {
                return Err(StoreError::TypeMismatch {
                    path: path.to_string(),
                    expected: data_type,
                    actual: tag.data_type,
                });
            }
            return Ok(TagData::new(path, data_type));
        }
        if !create {
            return Err(StoreError::NotFound {
                path: path.to_string(),
            });
        }

        let body = WireTag {
            path: path.to_string(),
            data_type,
            properties: BTreeMap::new(),
            keywords: Vec::new(),
            collect_aggregates: false,
        };
        tracing::info!(path, %data_type, "creating tag");
        let result = self.authorize(self.agent.put(&url)).send_json(&body);
        check(&url, result)?.ok_or_else(|| missing_endpoint(&url))?;
        Ok(TagData::new(path, data_type))
    }

    fn query(&self, patterns: &[String]) -> Result<Vec<TagData>, StoreError> {
        let mut found = Vec::new();
        for pattern in patterns {
            let mut skip = 0;
            loop {
                let page = self.get_page(pattern, skip)?;
                let received = page.tags.len();
                skip += received;
                found.extend(
                    page.tags
                        .into_iter()
                        .map(|t| TagData::new(t.path, t.data_type)),
                );
                let exhausted = match page.total_count {
                    Some(total) => skip >= total,
                    None => received < QUERY_PAGE_SIZE,
                };
                if received == 0 || exhausted {
                    break;
                }
            }
        }
        Ok(found)
    }

    fn read(&self, path: &str) -> Result<Option<ReadResult>, StoreError> {
        let url = self.tag_url(path, "/values/current");
        let Some(response) = self.get(&url)? else {
            return Ok(None);
        };
        let current: WireCurrent = decode(&url, response)?;
        Ok(Some(ReadResult {
            value: TagValue::parse(current.value.data_type, &current.value.value)?,
            timestamp: current.timestamp,
        }))
    }

    fn write_batch(&self, writes: &[TagWrite]) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }
        let url = format!("{}/{API_ROOT}/update-current-values", self.base_url);
        let body = group_updates(writes);
        let result = self.authorize(self.agent.post(&url)).send_json(&body);
        check(&url, result)?.ok_or_else(|| missing_endpoint(&url))?;
        Ok(())
    }
}
