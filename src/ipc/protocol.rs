//! Tagged messages exchanged between client and server.
//!
//! Every frame body is a JSON object `{"tag": "<TAG>", "payload": <value>}`.
//! The client sends one [`Request`] per tag and finishes a search request
//! with `RUN`; the server answers each `RUN` with exactly one [`Response`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MotionSpec, PathRequest, ResolvedMotion, View};

/// Client → server messages, in the order the client sends them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    Start(View),
    Target(View),
    Motions(Vec<MotionSpec>),
    Scrolloff(usize),
    /// Window text width and height.
    Size(usize, usize),
    Buffer(Vec<String>),
    Run,
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    Result(Vec<ResolvedMotion>),
    Error(String),
}

/// Message types whose tags are known up front, so an unknown tag can be
/// told apart from a malformed payload.
pub trait Tagged {
    const TAGS: &'static [&'static str];
}

impl Tagged for Request {
    const TAGS: &'static [&'static str] = &[
        "START",
        "TARGET",
        "MOTIONS",
        "SCROLLOFF",
        "SIZE",
        "BUFFER",
        "RUN",
    ];
}

impl Tagged for Response {
    const TAGS: &'static [&'static str] = &["RESULT", "ERROR"];
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The peer sent a tag this side does not understand.
    #[error("unexpected message tag '{0}'")]
    UnknownTag(String),

    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Just the tag, to validate before decoding the payload.
#[derive(Deserialize)]
struct Envelope {
    tag: String,
}

pub fn encode<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode<T: DeserializeOwned + Tagged>(body: &str) -> Result<T, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if !T::TAGS.contains(&envelope.tag.as_str()) {
        return Err(ProtocolError::UnknownTag(envelope.tag));
    }
    Ok(serde_json::from_str(body)?)
}

/// The message sequence for one search request.
pub fn request_messages(request: &PathRequest) -> [Request; 7] {
    [
        Request::Start(request.start),
        Request::Target(request.target),
        Request::Motions(request.motions.clone()),
        Request::Scrolloff(request.scrolloff),
        Request::Size(request.size.0, request.size.1),
        Request::Buffer(request.buffer.clone()),
        Request::Run,
    ]
}

/// Collects request fields on the server until `RUN` arrives.
#[derive(Debug, Default)]
pub struct RequestAssembler {
    start: Option<View>,
    target: Option<View>,
    motions: Option<Vec<MotionSpec>>,
    scrolloff: Option<usize>,
    size: Option<(usize, usize)>,
    buffer: Option<Vec<String>>,
}

impl RequestAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one message. On `RUN`, returns the assembled request (or the
    /// first missing tag) and starts over.
    pub fn accept(&mut self, message: Request) -> Option<Result<PathRequest, &'static str>> {
        match message {
            Request::Start(view) => self.start = Some(view),
            Request::Target(view) => self.target = Some(view),
            Request::Motions(motions) => self.motions = Some(motions),
            Request::Scrolloff(n) => self.scrolloff = Some(n),
            Request::Size(width, height) => self.size = Some((width, height)),
            Request::Buffer(lines) => self.buffer = Some(lines),
            Request::Run => return Some(std::mem::take(self).finish()),
        }
        None
    }

    fn finish(self) -> Result<PathRequest, &'static str> {
        Ok(PathRequest {
            start: self.start.ok_or("START")?,
            target: self.target.ok_or("TARGET")?,
            motions: self.motions.ok_or("MOTIONS")?,
            scrolloff: self.scrolloff.ok_or("SCROLLOFF")?,
            size: self.size.ok_or("SIZE")?,
            buffer: self.buffer.ok_or("BUFFER")?,
        })
    }
}
