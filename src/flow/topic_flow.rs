use crate::config::FlowConfig;
use crate::flow::partition_flow::{FlowCollaborators, FlowError, PartitionFlow};
use crate::flow::recovery::RecoveryError;
use crate::kafka::{ConsumerRecord, FlowScope, TopicPartition};
use std::collections::HashMap;

/// Routes assigned partitions to their partition flows.
///
/// The external dispatcher owns the consumer lifecycle and calls in here on
/// assignment, revocation, every polled batch, and on its timer cadence.
/// Partition flows never reference each other; all shared machinery arrives
/// through the collaborators handed over at construction.
pub struct TopicFlow<S> {
    scope: FlowScope,
    config: FlowConfig,
    collaborators: FlowCollaborators<S>,
    flows: HashMap<TopicPartition, PartitionFlow<S>>,
}

impl<S> TopicFlow<S> {
    /// Creates the topic flow with no assigned partitions.
    pub fn new(scope: FlowScope, config: FlowConfig, collaborators: FlowCollaborators<S>) -> Self {
        Self {
            scope,
            config,
            collaborators,
            flows: HashMap::new(),
        }
    }

    /// Builds the flow for a newly assigned partition, running eager
    /// recovery first. A re-assignment replaces the previous flow; the
    /// dispatcher is expected to revoke before re-assigning.
    pub fn assign(
        &mut self,
        partition: TopicPartition,
        assigned_at_offset: u64,
        now_ms: u64,
    ) -> Result<(), RecoveryError> {
        let flow = PartitionFlow::assign(
            self.scope.clone(),
            partition.clone(),
            assigned_at_offset,
            self.config.clone(),
            self.collaborators.clone(),
            now_ms,
        )?;
        self.flows.insert(partition, flow);
        Ok(())
    }

    /// Runs the revoke protocol for a partition and releases its flow.
    /// Returns false when the partition was not assigned.
    pub fn revoke(&mut self, partition: &TopicPartition, now_ms: u64) -> bool {
        match self.flows.remove(partition) {
            Some(flow) => {
                flow.revoke(now_ms);
                true
            }
            None => false,
        }
    }

    /// Hands a batch to the owning partition flow.
    pub fn apply(
        &mut self,
        partition: &TopicPartition,
        records: &[ConsumerRecord],
        now_ms: u64,
    ) -> Result<(), FlowError> {
        match self.flows.get_mut(partition) {
            Some(flow) => flow.apply(records, now_ms),
            None => Err(FlowError::NotAssigned {
                partition: partition.clone(),
            }),
        }
    }

    /// Drives timers, persists, and commit evaluation across every assigned
    /// partition in deterministic order.
    pub fn tick(&mut self, now_ms: u64) -> Result<(), FlowError> {
        let mut partitions: Vec<TopicPartition> = self.flows.keys().cloned().collect();
        partitions.sort();
        for partition in partitions {
            if let Some(flow) = self.flows.get_mut(&partition) {
                flow.tick(now_ms)?;
            }
        }
        Ok(())
    }

    /// Flow owning a partition, if assigned.
    pub fn flow(&self, partition: &TopicPartition) -> Option<&PartitionFlow<S>> {
        self.flows.get(partition)
    }

    /// True when the partition is currently assigned.
    pub fn is_assigned(&self, partition: &TopicPartition) -> bool {
        self.flows.contains_key(partition)
    }

    /// Currently assigned partitions in deterministic order.
    pub fn assigned_partitions(&self) -> Vec<TopicPartition> {
        let mut partitions: Vec<TopicPartition> = self.flows.keys().cloned().collect();
        partitions.sort();
        partitions
    }
}
