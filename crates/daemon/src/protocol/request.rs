// SPDX-License-Identifier: MIT

//! Request envelope (spec.md §6 "Swarm wire protocol"): `{method, id,
//! params}`, one JSON object per frame. `params` is decoded per-method
//! into the structs below rather than a tagged enum, matching the wire
//! shape the spec describes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Method {
    Do,
    Kill,
    Tail,
    Logs,
    List,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    pub id: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn new(method: Method, id: impl Into<String>, params: Value) -> Self {
        Self { method, id: id.into(), params }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoParams {
    pub todo_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobIdParams {
    pub job_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub include_all: bool,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
