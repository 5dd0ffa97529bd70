// SPDX-License-Identifier: MIT

//! A minimal Server-Sent Events decoder for the agent's `/event` stream
//! (spec.md §4.2, §6). Agents are expected to speak a small subset of the
//! SSE wire format: `id`/`event`/`data` fields, `:`-prefixed comment lines
//! used as keepalives, and records separated by a blank line.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    pub id: Option<String>,
    pub event: Option<String>,
    pub data: String,
}

/// Incremental decoder: feed it raw bytes as they arrive off the wire and
/// drain complete frames; an incomplete trailing record is held until more
/// bytes complete it.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the stream, returning any frames that became
    /// complete as a result (a chunk boundary need not align with a frame
    /// boundary).
    pub fn push(&mut self, chunk: &str) -> Vec<SseFrame> {
        self.buffer.push_str(chunk);
        let mut frames = Vec::new();

        loop {
            let Some(sep_at) = find_record_separator(&self.buffer) else { break };
            let (record, sep_len) = sep_at;
            let raw: String = self.buffer.drain(..record + sep_len).collect();
            let record_text = &raw[..record];
            if let Some(frame) = parse_record(record_text) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Emits a frame for a non-empty, incomplete trailing record left in
    /// the buffer (spec.md §4.2 "Incomplete trailing records at EOF are
    /// still emitted if non-empty"). Call once, when the upstream stream
    /// ends; the decoder is empty afterward.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if self.buffer.is_empty() {
            return None;
        }
        let record = std::mem::take(&mut self.buffer);
        parse_record(&record)
    }
}

/// Find the byte offset of a blank-line record separator (`\n\n` or
/// `\r\n\r\n`) and how many bytes it spans, skipping CR so mixed
/// line-ending streams still decode.
fn find_record_separator(buf: &str) -> Option<(usize, usize)> {
    let bytes = buf.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\n' && bytes[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if bytes[i] == b'\n' && i + 3 < bytes.len() && bytes[i + 1] == b'\r' && bytes[i + 2] == b'\n' {
            return Some((i, 3));
        }
        i += 1;
    }
    None
}

fn parse_record(record: &str) -> Option<SseFrame> {
    let mut frame = SseFrame::default();
    let mut data_lines: Vec<&str> = Vec::new();
    let mut saw_field = false;

    for line in record.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        saw_field = true;
        match field {
            "id" => frame.id = Some(value.to_string()),
            "event" => frame.event = Some(value.to_string()),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if !saw_field {
        return None;
    }
    frame.data = data_lines.join("\n");
    Some(frame)
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
