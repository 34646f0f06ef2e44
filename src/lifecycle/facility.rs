use super::FacilityError;
use crate::clients::ShelfPoolClient;
use crate::config::{ConfigError, ShelfCapacities, SimulationConfig};
use crate::courier::Courier;
use crate::decay::{shelf_decay_value, DecaySpawner, DecayValueFn, EXPIRY_CHANNEL_CAPACITY};
use crate::model::{
    FacilityComponent, Order, OrderCompletion, OrderId, OrderOutcome, OrderRequest, PoolSnapshot,
};
use crate::pipeline::{DispatchStage, IntakeStage, Pipeline, StagingStage, StorageStage};
use crate::reconciler::DecayReconciler;
use crate::shelf_pool::{self, Placement};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Capacity of the pool-changed signal channel and of the observer broadcast.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// The running holding facility.
///
/// `Facility` owns every long-lived task of one simulation run:
/// - **Shelf pool actor**: the only owner of the shelves.
/// - **Decay reconciler**: turns expiry notices into reclaim requests.
/// - **Event relay**: forwards pool-changed signals to observers.
/// - **Task tracker**: one decay process per stored order, one task per courier.
///
/// Dropping a `Facility` cancels the reconciler, after which the pool actor and
/// relay exit on their own. Use [`drain`](Self::drain) or
/// [`shutdown`](Self::shutdown) to wait for them and get the final snapshot.
///
/// # Example
///
/// ```ignore
/// let facility = Facility::new(SimulationConfig::from_env())?;
/// let receipt = facility.submit(OrderRequest::new("Banana Split", 0.63, 20.0, "frozen")).await?;
/// facility.pickup(&receipt.id).await?;
/// facility.drain().await?;
/// ```
pub struct Facility {
    config: Arc<SimulationConfig>,
    pipeline: Pipeline,
    pool: ShelfPoolClient,
    courier: Courier,
    events: broadcast::Sender<FacilityComponent>,
    rejected_at_intake: AtomicU64,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    reconciler: JoinHandle<u64>,
    handles: Vec<JoinHandle<()>>,
    // Cancels the reconciler if the facility is dropped without stopping.
    _cancel_on_drop: DropGuard,
}

/// Handed to the submitter of an accepted order.
#[derive(Debug)]
pub struct OrderReceipt {
    pub id: OrderId,
    pub placement: Placement,
    completion: OrderCompletion,
}

impl OrderReceipt {
    /// Waits until the order is picked up or expires.
    pub async fn wait(self) -> OrderOutcome {
        self.completion.wait().await
    }
}

pub struct FacilityBuilder {
    config: Option<SimulationConfig>,
    capacities: ShelfCapacities,
    decay_value: DecayValueFn,
    event_capacity: usize,
}

impl Default for FacilityBuilder {
    fn default() -> Self {
        Self {
            config: None,
            capacities: ShelfCapacities::default(),
            decay_value: shelf_decay_value,
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl FacilityBuilder {
    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn capacities(mut self, capacities: ShelfCapacities) -> Self {
        self.capacities = capacities;
        self
    }

    pub fn decay_value(mut self, decay_value: DecayValueFn) -> Self {
        self.decay_value = decay_value;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Wires the pool, reconciler, relay, courier and pipeline, and starts their tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Facility, FacilityError> {
        let config = self.config.ok_or(ConfigError::MissingSimulationConfig)?;
        config.validate()?;
        let config = Arc::new(config);

        let tracker = TaskTracker::new();
        let shutdown = CancellationToken::new();
        let (expiry_sender, expiry_receiver) = mpsc::channel(EXPIRY_CHANNEL_CAPACITY);
        let (signal_sender, signal_receiver) = mpsc::channel(self.event_capacity);
        let (events, _) = broadcast::channel(self.event_capacity);

        // 1. Pool actor; it starts a decay process for every placed order
        let decay = DecaySpawner::new(
            tracker.clone(),
            config.tick_interval(),
            self.decay_value,
            expiry_sender,
        );
        let (pool_actor, pool) = shelf_pool::new(self.capacities, decay, Some(signal_sender));
        let pool_handle = tokio::spawn(pool_actor.run());

        // 2. Reconciler and event relay
        let reconciler = DecayReconciler::new(expiry_receiver, pool.clone(), shutdown.clone());
        let reconciler_handle = tokio::spawn(reconciler.run());
        let relay_handle = tokio::spawn(relay(signal_receiver, events.clone()));

        // 3. Courier and pipeline
        let courier = Courier::new(Some(pool.clone()), Some(config.clone()), tracker.clone());
        let pipeline = Pipeline::builder()
            .stage(IntakeStage)
            .stage(StagingStage)
            .stage(DispatchStage::new(courier.clone(), config.dispatch_couriers))
            .stage(StorageStage::new(pool.clone()))
            .build();

        info!(
            capacities = ?self.capacities,
            tick = ?config.tick_interval(),
            stages = ?pipeline.stage_names(),
            "Facility started"
        );

        Ok(Facility {
            config,
            pipeline,
            pool,
            courier,
            events,
            rejected_at_intake: AtomicU64::new(0),
            tracker,
            shutdown: shutdown.clone(),
            reconciler: reconciler_handle,
            handles: vec![pool_handle, relay_handle],
            _cancel_on_drop: shutdown.clone().drop_guard(),
        })
    }
}

impl Facility {
    pub fn builder() -> FacilityBuilder {
        FacilityBuilder::default()
    }

    /// Starts a facility with default shelf capacities.
    pub fn new(config: SimulationConfig) -> Result<Self, FacilityError> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn courier(&self) -> &Courier {
        &self.courier
    }

    /// Validates an intake payload and sends the order down the pipeline.
    ///
    /// Rejections (unknown temperature, invalid numbers, no space) are returned
    /// here; the reason is the error's `Display`.
    pub async fn submit(&self, request: OrderRequest) -> Result<OrderReceipt, FacilityError> {
        let (order, completion) = Order::from_request(request).map_err(|e| {
            self.rejected_at_intake.fetch_add(1, Ordering::Relaxed);
            warn!(error = %e, "Order rejected at intake");
            e
        })?;
        let order = Arc::new(order);
        let id = order.id().clone();

        let placement = self.pipeline.run(order).await?;
        Ok(OrderReceipt {
            id,
            placement,
            completion,
        })
    }

    /// Retrieves an order directly, without sending a courier.
    pub async fn pickup(&self, id: &OrderId) -> Result<Arc<Order>, FacilityError> {
        let retrieval = self.pool.retrieve(id.clone()).await?;
        Ok(retrieval.order)
    }

    pub async fn snapshot(&self) -> Result<PoolSnapshot, FacilityError> {
        Ok(self.pool.snapshot().await?)
    }

    /// Pool-changed signals. Pull a [`snapshot`](Self::snapshot) on receipt.
    ///
    /// Delivery is best-effort: a lagging receiver loses the oldest signals.
    pub fn subscribe(&self) -> broadcast::Receiver<FacilityComponent> {
        self.events.subscribe()
    }

    /// Orders rejected before placement because the payload was invalid.
    pub fn rejected_at_intake(&self) -> u64 {
        self.rejected_at_intake.load(Ordering::Relaxed)
    }

    /// Lets every decay process and courier finish with the reconciler still
    /// running, then stops the remaining tasks.
    ///
    /// Returns the pool as it stood once everything settled.
    pub async fn drain(self) -> Result<PoolSnapshot, FacilityError> {
        info!(tasks = self.tracker.len(), "Draining facility...");
        self.tracker.close();
        self.tracker.wait().await;
        self.shutdown.cancel();
        self.stop().await
    }

    /// Stops the reconciler first, then waits for in-flight decay processes and
    /// couriers. Expiries after this point are not reclaimed.
    ///
    /// The returned snapshot may therefore still list residents whose health
    /// is at or below zero.
    pub async fn shutdown(self) -> Result<PoolSnapshot, FacilityError> {
        info!(tasks = self.tracker.len(), "Shutting down facility...");
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        self.stop().await
    }

    async fn stop(self) -> Result<PoolSnapshot, FacilityError> {
        let reconciled = self.reconciler.await.map_err(|e| {
            error!("Reconciler task failed: {:?}", e);
            FacilityError::TaskFailed(e.to_string())
        })?;
        let snapshot = self.pool.snapshot().await?;

        // Dropping every pool client closes the actor's mailbox; the relay ends
        // with the actor.
        drop(self.pipeline);
        drop(self.courier);
        drop(self.pool);
        drop(self.events);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Facility task failed: {:?}", e);
                return Err(FacilityError::TaskFailed(e.to_string()));
            }
        }

        info!(
            reconciled,
            lost_to_expiry = snapshot.lost_to_expiry,
            rejected_for_space = snapshot.rejected_for_space,
            "Facility stopped."
        );
        Ok(snapshot)
    }
}

/// Forwards pool signals to the observer broadcast until the pool stops.
pub async fn relay(
    mut signals: mpsc::Receiver<FacilityComponent>,
    events: broadcast::Sender<FacilityComponent>,
) {
    while let Some(component) = signals.recv().await {
        // No subscribers is fine.
        let _ = events.send(component);
    }
}
