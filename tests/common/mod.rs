#![allow(dead_code)]

use base64::prelude::{Engine as _, BASE64_STANDARD};
use mate::engine::{RuleSource, RuleStream};
use mate::error::RefreshError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

#[derive(Clone)]
pub enum Response {
    Body(Vec<u8>),
    Status(u16, &'static str),
    StreamError,
}

/// Plays back queued responses, then repeats `fallback` forever.
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Response>>,
    fallback: Response,
    calls: AtomicUsize,
    notify: Option<mpsc::UnboundedSender<usize>>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Response>, fallback: Response) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback,
            calls: AtomicUsize::new(0),
            notify: None,
        }
    }

    /// Also reports the call number on the returned channel for every download.
    pub fn with_notify(
        responses: Vec<Response>,
        fallback: Response,
    ) -> (Self, mpsc::UnboundedReceiver<usize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut source = Self::new(responses, fallback);
        source.notify = Some(tx);
        (source, rx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RuleSource for ScriptedSource {
    async fn download(&self) -> Result<RuleStream, RefreshError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(tx) = &self.notify {
            let _ = tx.send(call);
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match response {
            Response::Body(body) => Ok(Box::new(std::io::Cursor::new(body))),
            Response::Status(status, body) => Err(RefreshError::UpstreamStatus {
                status,
                body: body.to_string(),
            }),
            Response::StreamError => Err(RefreshError::Stream(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Base64 body wrapped at 64 columns like the upstream list.
pub fn encoded(text: &str) -> Vec<u8> {
    let encoded = BASE64_STANDARD.encode(text);
    let mut out = Vec::new();
    for chunk in encoded.as_bytes().chunks(64) {
        out.extend_from_slice(chunk);
        out.push(b'\n');
    }
    out
}

pub fn body(text: &str) -> Response {
    Response::Body(encoded(text))
}
