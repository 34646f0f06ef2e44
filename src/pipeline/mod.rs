//! # Fulfillment Pipeline
//!
//! An ordered list of [`OrderStage`]s assembled once with [`Pipeline::builder`].
//! Each stage receives the order plus a [`Next`] handle for the remainder of the
//! chain and decides whether, and when, to call it. The last stage stores the
//! order; a stage that calls `next` when nothing follows it gets
//! [`FacilityError::PipelineNotWired`].

pub mod stages;

pub use stages::*;

use crate::lifecycle::FacilityError;
use crate::model::Order;
use crate::shelf_pool::Placement;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait OrderStage: Send + Sync {
    /// Short name used in logs and wiring errors.
    fn name(&self) -> &'static str;

    async fn handle(&self, order: Arc<Order>, next: Next<'_>) -> Result<Placement, FacilityError>;
}

/// The stages after the current one.
pub struct Next<'a> {
    stages: &'a [Box<dyn OrderStage>],
    caller: &'static str,
}

impl Next<'_> {
    pub async fn run(self, order: Arc<Order>) -> Result<Placement, FacilityError> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    caller: stage.name(),
                };
                stage.handle(order, next).await
            }
            None => Err(FacilityError::PipelineNotWired(self.caller)),
        }
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn OrderStage>>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder { stages: Vec::new() }
    }

    /// Passes `order` through every stage in order.
    pub async fn run(&self, order: Arc<Order>) -> Result<Placement, FacilityError> {
        Next {
            stages: &self.stages,
            caller: "pipeline",
        }
        .run(order)
        .await
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}

pub struct PipelineBuilder {
    stages: Vec<Box<dyn OrderStage>>,
}

impl PipelineBuilder {
    pub fn stage(mut self, stage: impl OrderStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
