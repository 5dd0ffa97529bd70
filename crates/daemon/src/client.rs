// SPDX-License-Identifier: MIT

//! A client for the swarm RPC server: one TCP connection per call, mirroring
//! how the CLI invokes it (spec.md §6 "CLI surface").

use crate::error::{DaemonError, Result};
use crate::protocol::{self, DoParams, JobIdParams, ListParams, Method, Request, Response, TailFrame};
use incrementum_core::{Event, Job};
use std::net::SocketAddr;
use tokio::net::TcpStream;

pub struct Client {
    addr: SocketAddr,
}

impl Client {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub async fn do_todo(&self, todo_id: impl Into<String>) -> Result<String> {
        let params = serde_json::to_value(DoParams { todo_id: todo_id.into() })?;
        let value = ok_result(self.call(Method::Do, params).await?)?;
        Ok(value.get("job_id").and_then(|v| v.as_str()).unwrap_or_default().to_string())
    }

    pub async fn kill(&self, job_id: impl Into<String>) -> Result<()> {
        let params = serde_json::to_value(JobIdParams { job_id: job_id.into() })?;
        ok_result(self.call(Method::Kill, params).await?)?;
        Ok(())
    }

    pub async fn logs(&self, job_id: impl Into<String>) -> Result<Vec<Event>> {
        let params = serde_json::to_value(JobIdParams { job_id: job_id.into() })?;
        let value = ok_result(self.call(Method::Logs, params).await?)?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn list(&self, include_all: bool) -> Result<Vec<Job>> {
        let params = serde_json::to_value(ListParams { include_all })?;
        let value = ok_result(self.call(Method::List, params).await?)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Streams frames until the terminal marker, invoking `on_event` for
    /// each event in arrival order.
    pub async fn tail(&self, job_id: impl Into<String>, mut on_event: impl FnMut(Event)) -> Result<()> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut stream = TcpStream::connect(self.addr).await?;
        let request = Request::new(Method::Tail, id, serde_json::to_value(JobIdParams { job_id: job_id.into() })?);
        protocol::write_request(&mut stream, &request).await?;

        loop {
            let bytes = protocol::read_message(&mut stream).await?;
            if let Ok(frame) = protocol::decode::<TailFrame>(&bytes) {
                if let Some(event) = frame.event {
                    on_event(event);
                    continue;
                }
                if frame.done == Some(true) {
                    return Ok(());
                }
                continue;
            }
            let response: Response = protocol::decode(&bytes)?;
            ok_result(response)?;
            return Ok(());
        }
    }

    async fn call(&self, method: Method, params: serde_json::Value) -> Result<Response> {
        let mut stream = TcpStream::connect(self.addr).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let request = Request::new(method, id, params);
        protocol::write_request(&mut stream, &request).await?;
        Ok(protocol::read_response(&mut stream).await?)
    }
}

fn ok_result(response: Response) -> Result<serde_json::Value> {
    if let Some(error) = response.error {
        return Err(DaemonError::Rpc(error));
    }
    Ok(response.result.unwrap_or(serde_json::Value::Null))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
