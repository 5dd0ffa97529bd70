// SPDX-License-Identifier: MIT

//! Swarm wire protocol (spec.md §4.7, §6): length-delimited JSON frames
//! carrying `{method, id, params}` requests and `{id, result|error}`
//! responses, with Tail pushing `{id, event}` frames until a terminal
//! `{id, done: true}`.

mod request;
mod response;
mod wire;

pub use request::{DoParams, JobIdParams, ListParams, Method, Request};
pub use response::{Response, RpcError, TailFrame};
pub use wire::{
    decode, encode, read_message, read_request, read_response, read_tail_frame, write_message, write_request, write_response, write_tail_frame, ProtocolError, MAX_FRAME_BYTES,
};
