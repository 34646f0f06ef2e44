//! The facility's standard stages: intake, staging, dispatch, storage.

use super::{Next, OrderStage};
use crate::clients::ShelfPoolClient;
use crate::courier::Courier;
use crate::lifecycle::FacilityError;
use crate::model::Order;
use crate::shelf_pool::Placement;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Entry point of the chain.
pub struct IntakeStage;

#[async_trait]
impl OrderStage for IntakeStage {
    fn name(&self) -> &'static str {
        "intake"
    }

    async fn handle(&self, order: Arc<Order>, next: Next<'_>) -> Result<Placement, FacilityError> {
        debug!(
            order_id = %order.id(),
            name = order.name(),
            temperature = %order.temperature(),
            shelf_life = order.shelf_life(),
            decay_rate = order.original_decay_rate(),
            "Intake"
        );
        next.run(order).await
    }
}

pub struct StagingStage;

#[async_trait]
impl OrderStage for StagingStage {
    fn name(&self) -> &'static str {
        "staging"
    }

    async fn handle(&self, order: Arc<Order>, next: Next<'_>) -> Result<Placement, FacilityError> {
        next.run(order).await
    }
}

/// Sends a courier once the rest of the chain has stored the order.
pub struct DispatchStage {
    courier: Courier,
    enabled: bool,
}

impl DispatchStage {
    pub fn new(courier: Courier, enabled: bool) -> Self {
        Self { courier, enabled }
    }
}

#[async_trait]
impl OrderStage for DispatchStage {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    async fn handle(&self, order: Arc<Order>, next: Next<'_>) -> Result<Placement, FacilityError> {
        let order_id = order.id().clone();
        let placement = next.run(order).await?;
        if self.enabled {
            debug!(%order_id, "Dispatching courier");
            self.courier.dispatch(order_id);
        }
        Ok(placement)
    }
}

/// Terminal stage: places the order on the shelves.
pub struct StorageStage {
    pool: ShelfPoolClient,
}

impl StorageStage {
    pub fn new(pool: ShelfPoolClient) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStage for StorageStage {
    fn name(&self) -> &'static str {
        "storage"
    }

    async fn handle(&self, order: Arc<Order>, _next: Next<'_>) -> Result<Placement, FacilityError> {
        Ok(self.pool.place(order).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::model::{ShelfLabel, Temperature};
    use crate::pipeline::Pipeline;
    use crate::shelf_pool::mock::{create_mock_pool, expect_place, expect_retrieve};
    use crate::shelf_pool::PoolError;
    use std::time::Duration;
    use tokio_util::task::TaskTracker;

    fn order() -> Arc<Order> {
        let (order, _completion) = Order::new("Curry", Temperature::Hot, 80.0, 0.4).unwrap();
        Arc::new(order)
    }

    fn standard(pool: ShelfPoolClient, tracker: TaskTracker) -> Pipeline {
        let config = SimulationConfig::default()
            .with_tick_interval(Duration::from_millis(10))
            .with_courier_delays(1, 0);
        let courier = Courier::new(Some(pool.clone()), Some(Arc::new(config)), tracker);
        Pipeline::builder()
            .stage(IntakeStage)
            .stage(StagingStage)
            .stage(DispatchStage::new(courier, true))
            .stage(StorageStage::new(pool))
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_courier_dispatched_after_storage() {
        let (pool, mut requests) = create_mock_pool(4);
        let tracker = TaskTracker::new();
        let pipeline = standard(pool, tracker.clone());
        let curry = order();

        let submitted = curry.clone();
        let task = tokio::spawn(async move { pipeline.run(submitted).await });

        let (placed, responder) = expect_place(&mut requests).await.expect("Expected Place");
        assert_eq!(placed.id(), curry.id());
        assert!(tracker.is_empty(), "no courier before storage succeeds");
        responder
            .send(Ok(Placement {
                shelf: ShelfLabel::Hot,
                index: 0,
                displaced: None,
            }))
            .unwrap();
        assert_eq!(task.await.unwrap().unwrap().shelf, ShelfLabel::Hot);

        let (requested, _responder) = expect_retrieve(&mut requests).await.expect("Expected Retrieve");
        assert_eq!(&requested, curry.id());
    }

    #[tokio::test]
    async fn test_no_courier_when_storage_fails() {
        let (pool, mut requests) = create_mock_pool(4);
        let tracker = TaskTracker::new();
        let pipeline = standard(pool, tracker.clone());

        let task = tokio::spawn(async move { pipeline.run(order()).await });
        let (_, responder) = expect_place(&mut requests).await.expect("Expected Place");
        responder.send(Err(PoolError::NoSpace)).unwrap();

        assert_eq!(
            task.await.unwrap().unwrap_err(),
            FacilityError::Pool(PoolError::NoSpace)
        );
        assert!(tracker.is_empty());
    }
}
