// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Scripted in-memory transport

use parking_lot::Mutex;

use super::{
    deliver_body, deliver_header, PreparedRequest, ReceiveSink, Transport, TransportError,
};

/// What a `MockTransport` does when asked to perform
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Stream a canned response
    Respond {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    },
    /// Fail with a transport error
    Fail(TransportError),
    /// Panic on the calling thread
    Panic(String),
}

/// Transport that never touches the network
///
/// Every prepared request is recorded so callers can inspect exactly what
/// would have gone on the wire.
#[derive(Debug)]
pub struct MockTransport {
    outcome: MockOutcome,
    chunk_size: usize,
    requests: Mutex<Vec<PreparedRequest>>,
}

impl MockTransport {
    /// Transport answering every request with `status` and `body`
    pub fn respond(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(MockOutcome::Respond {
            status,
            headers: Vec::new(),
            body: body.into(),
        })
    }

    /// Transport failing every request with `error`
    pub fn failing(error: TransportError) -> Self {
        Self::new(MockOutcome::Fail(error))
    }

    /// Transport panicking on every request
    pub fn panicking(message: impl Into<String>) -> Self {
        Self::new(MockOutcome::Panic(message.into()))
    }

    /// Transport with an explicit outcome
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            chunk_size: 1024,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Add a response header to a canned response
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let MockOutcome::Respond { headers, .. } = &mut self.outcome {
            headers.push((name.into(), value.into()));
        }
        self
    }

    /// Split the canned body into chunks of this size
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// All requests performed so far
    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.requests.lock().clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<PreparedRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of performed requests
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Transport for MockTransport {
    fn perform(
        &self,
        request: &PreparedRequest,
        sink: &mut dyn ReceiveSink,
    ) -> Result<u16, TransportError> {
        self.requests.lock().push(request.clone());

        match &self.outcome {
            MockOutcome::Respond {
                status,
                headers,
                body,
            } => {
                deliver_header(sink, format!("HTTP/1.1 {}\r\n", status).as_bytes())?;
                for (name, value) in headers {
                    deliver_header(sink, format!("{}: {}\r\n", name, value).as_bytes())?;
                }
                deliver_header(sink, b"\r\n")?;
                for chunk in body.chunks(self.chunk_size) {
                    deliver_body(sink, chunk)?;
                }
                Ok(*status)
            }
            MockOutcome::Fail(error) => Err(error.clone()),
            MockOutcome::Panic(message) => panic!("{}", message),
        }
    }
}
