//! Shared test support: a scripted transport for driving the engines
//! without a network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::Semaphore;

use cachet_client::error;
use cachet_client::{Error, StatusCode, Transport, TransportRequest, TransportResponse};

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// 200 with the value as a JSON body
    Json(Value),
    /// Response with the given status and an empty body
    Status(u16),
    /// The call itself fails
    FailTransport,
    /// 200 with an empty body
    Empty,
    /// 200 with raw (non-JSON) text
    Text(&'static str),
}

/// Scripted transport: pops one step per call, falling back to a fixed step
/// once the script is exhausted. Optionally gated on a semaphore so tests
/// can observe in-flight states before letting a call finish.
pub struct MockTransport {
    calls: AtomicUsize,
    targets: Mutex<Vec<String>>,
    script: Mutex<VecDeque<MockStep>>,
    fallback: MockStep,
    gate: Option<Arc<Semaphore>>,
}

impl MockTransport {
    /// Every call answers 200 with `value`.
    pub fn json(value: Value) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            fallback: MockStep::Json(value),
            gate: None,
        })
    }

    /// Answers follow `steps`, then empty 200s.
    pub fn sequence(steps: Vec<MockStep>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::from(steps)),
            fallback: MockStep::Empty,
            gate: None,
        })
    }

    /// Like [`sequence`](MockTransport::sequence), but every call waits for
    /// one semaphore permit before answering.
    pub fn gated(steps: Vec<MockStep>) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Arc::new(Self {
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::from(steps)),
            fallback: MockStep::Empty,
            gate: Some(Arc::clone(&gate)),
        });
        (transport, gate)
    }

    /// Number of calls the engines actually issued.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Targets of every issued call, in order.
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().expect("targets lock").clone()
    }
}

impl Transport for MockTransport {
    fn perform(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, Error>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets
            .lock()
            .expect("targets lock")
            .push(request.target.clone());

        let step = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let gate = self.gate.clone();

        async move {
            if let Some(gate) = gate {
                let permit = gate
                    .acquire()
                    .await
                    .map_err(|closed| error::transport(closed))?;
                permit.forget();
            }

            match step {
                MockStep::Json(value) => {
                    let body = serde_json::to_vec(&value).expect("mock body serializes");
                    Ok(TransportResponse::new(StatusCode::OK).with_body(body))
                }
                MockStep::Status(code) => Ok(TransportResponse::new(
                    StatusCode::from_u16(code).expect("valid mock status"),
                )),
                MockStep::FailTransport => {
                    Err(error::transport(std::io::Error::other("connection refused")))
                }
                MockStep::Empty => Ok(TransportResponse::new(StatusCode::OK)),
                MockStep::Text(text) => {
                    Ok(TransportResponse::new(StatusCode::OK).with_body(text.as_bytes().to_vec()))
                }
            }
        }
        .boxed()
    }
}

/// Drive background tasks far enough to observe intermediate states.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
