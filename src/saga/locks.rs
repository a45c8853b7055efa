//! Per-instance mutual exclusion for concurrent pollers.

use crate::models::ProcessInstanceRef;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per in-flight [`ProcessInstanceRef`]. Entries disappear once
/// the last holder or waiter is gone.
#[derive(Debug, Default)]
pub struct InstanceLocks {
    locks: DashMap<ProcessInstanceRef, Arc<Mutex<()>>>,
}

impl InstanceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, instance: &ProcessInstanceRef) -> InstanceGuard<'_> {
        let lock = self
            .locks
            .entry(instance.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;
        InstanceGuard {
            locks: &self.locks,
            instance: instance.clone(),
            guard: Some(guard),
        }
    }

    /// Number of instances currently locked or awaited
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

pub struct InstanceGuard<'a> {
    locks: &'a DashMap<ProcessInstanceRef, Arc<Mutex<()>>>,
    instance: ProcessInstanceRef,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for InstanceGuard<'_> {
    fn drop(&mut self) {
        // Release first so the map's Arc is the only one left when nobody waits
        self.guard.take();
        self.locks
            .remove_if(&self.instance, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn instance(id: &str) -> ProcessInstanceRef {
        ProcessInstanceRef::new("creditacoes", id, "creditacao-final-step")
    }

    #[tokio::test]
    async fn test_entries_are_pruned_after_release() {
        let locks = InstanceLocks::new();
        {
            let _guard = locks.acquire(&instance("t-1")).await;
            assert_eq!(locks.in_flight(), 1);
        }
        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_same_instance_is_serialized() {
        let locks = Arc::new(InstanceLocks::new());
        let guard = locks.acquire(&instance("t-1")).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&instance("t-1")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_different_instances_do_not_block() {
        let locks = InstanceLocks::new();
        let _first = locks.acquire(&instance("t-1")).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&instance("t-2"))).await;
        assert!(second.is_ok());
    }
}
