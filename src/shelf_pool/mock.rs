//! # Mock Shelf Pool
//!
//! Utilities for testing pool consumers (courier, reconciler, pipeline stages)
//! without a running [`ShelfPoolActor`](super::ShelfPoolActor).
//!
//! Use [`create_mock_pool`] to get a client and the receiving end of its
//! mailbox, then the `expect_*` helpers to take each request and answer it.
//! [`MockPool`] answers from a queue of canned responses instead.

use super::{Placement, PoolError, PoolRequest, Reclamation, Response, Retrieval};
use crate::clients::ShelfPoolClient;
use crate::decay::ExpiryNotice;
use crate::model::{Order, OrderId, ShelfLabel};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Creates a pool client whose requests arrive on the returned receiver.
pub fn create_mock_pool(buffer_size: usize) -> (ShelfPoolClient, mpsc::Receiver<PoolRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ShelfPoolClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Place request
pub async fn expect_place(
    receiver: &mut mpsc::Receiver<PoolRequest>,
) -> Option<(Arc<Order>, Response<Placement>)> {
    match receiver.recv().await {
        Some(PoolRequest::Place { order, respond_to }) => Some((order, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Retrieve request
pub async fn expect_retrieve(
    receiver: &mut mpsc::Receiver<PoolRequest>,
) -> Option<(OrderId, Response<Retrieval>)> {
    match receiver.recv().await {
        Some(PoolRequest::Retrieve { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a ReclaimExpired request
pub async fn expect_reclaim(
    receiver: &mut mpsc::Receiver<PoolRequest>,
) -> Option<(ExpiryNotice, Response<Reclamation>)> {
    match receiver.recv().await {
        Some(PoolRequest::ReclaimExpired { notice, respond_to }) => Some((notice, respond_to)),
        _ => None,
    }
}

/// Builds the retrieval a real pool would return for `order` taken from `shelf[0]`.
pub fn retrieval_of(order: Arc<Order>, shelf: ShelfLabel) -> Retrieval {
    Retrieval {
        order,
        shelf,
        index: 0,
        promoted: None,
    }
}

enum Expectation {
    Place(Result<Placement, PoolError>),
    Retrieve(Result<Retrieval, PoolError>),
    Reclaim(Result<Reclamation, PoolError>),
}

/// A mock pool that answers requests from a queue of expectations.
///
/// # Example
/// ```ignore
/// let mock = MockPool::new();
/// mock.expect_retrieve(Ok(retrieval_of(order, ShelfLabel::Hot)));
///
/// let courier = Courier::new(Some(mock.client()), Some(config), tracker);
/// // ...
/// mock.verify();
/// ```
pub struct MockPool {
    client: ShelfPoolClient,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockPool {
    pub fn new() -> Self {
        let (client, mut receiver) = create_mock_pool(100);
        let expectations = Arc::new(Mutex::new(VecDeque::new()));
        let queued = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = queued.lock().pop_front();
                match (request, expectation) {
                    (PoolRequest::Place { respond_to, .. }, Some(Expectation::Place(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (PoolRequest::Retrieve { respond_to, .. }, Some(Expectation::Retrieve(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        PoolRequest::ReclaimExpired { respond_to, .. },
                        Some(Expectation::Reclaim(response)),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (request, _) => panic!("Unexpected request or expectation mismatch: {request:?}"),
                }
            }
        });

        Self {
            client,
            expectations,
            _handle: handle,
        }
    }

    pub fn client(&self) -> ShelfPoolClient {
        self.client.clone()
    }

    pub fn expect_place(&self, response: Result<Placement, PoolError>) {
        self.expectations.lock().push_back(Expectation::Place(response));
    }

    pub fn expect_retrieve(&self, response: Result<Retrieval, PoolError>) {
        self.expectations.lock().push_back(Expectation::Retrieve(response));
    }

    pub fn expect_reclaim(&self, response: Result<Reclamation, PoolError>) {
        self.expectations.lock().push_back(Expectation::Reclaim(response));
    }

    /// Panics if any expectation is still queued.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().len();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

impl Default for MockPool {
    fn default() -> Self {
        Self::new()
    }
}
