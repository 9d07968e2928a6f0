// src/modules/docker/logs.rs

//! Container log decoding.
//!
//! Without a TTY the daemon multiplexes stdout and stderr into frames: one
//! byte of stream type, three zero bytes, a big-endian u32 payload length,
//! then the payload. Containers started with a TTY send plain text instead.

use crate::core::error::Result;
use crate::modules::docker::client::DaemonClient;
use crate::modules::docker::normalize;
use chrono::DateTime;
use serde::Serialize;

const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdin,
    Stdout,
    Stderr,
}

impl LogStream {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(LogStream::Stdin),
            1 => Some(LogStream::Stdout),
            2 => Some(LogStream::Stderr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub stream: LogStream,
    pub timestamp: Option<String>,
    pub message: String,
}

fn is_frame_header(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN
        && LogStream::from_byte(bytes[0]).is_some()
        && bytes[1..4] == [0, 0, 0]
}

/// Splits a raw log body into per-stream chunks.
pub fn demux(raw: &[u8]) -> Vec<(LogStream, &[u8])> {
    if !is_frame_header(raw) {
        return if raw.is_empty() {
            Vec::new()
        } else {
            vec![(LogStream::Stdout, raw)]
        };
    }

    let mut chunks = Vec::new();
    let mut rest = raw;
    while is_frame_header(rest) {
        let Some(stream) = LogStream::from_byte(rest[0]) else {
            break;
        };
        let len = u32::from_be_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        let end = (HEADER_LEN + len).min(rest.len());
        chunks.push((stream, &rest[HEADER_LEN..end]));
        rest = &rest[end..];
    }
    chunks
}

// "2024-05-01T12:00:00.123456789Z message" when timestamps were requested.
fn split_timestamp(line: &str) -> (Option<String>, String) {
    if let Some((head, tail)) = line.split_once(' ') {
        if DateTime::parse_from_rfc3339(head).is_ok() {
            return (Some(normalize::format_rfc3339(head)), tail.to_string());
        }
    }
    (None, line.to_string())
}

/// Decodes a raw log body into lines, keeping the stream each came from.
pub fn parse(raw: &[u8]) -> Vec<LogLine> {
    demux(raw)
        .into_iter()
        .flat_map(|(stream, payload)| {
            String::from_utf8_lossy(payload)
                .lines()
                .filter(|line| !line.is_empty())
                .map(|line| {
                    let (timestamp, message) = split_timestamp(line.trim_end_matches('\r'));
                    LogLine {
                        stream,
                        timestamp,
                        message,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn fetch(client: &dyn DaemonClient, id: &str, tail: Option<u32>) -> Result<Vec<LogLine>> {
    let raw = client.container_logs(id, tail).await?;
    Ok(parse(&raw))
}

#[cfg(test)]
pub(crate) fn frame(stream: u8, payload: &str) -> Vec<u8> {
    let mut out = vec![stream, 0, 0, 0];
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload.as_bytes());
    out
}
