use crate::error::Error;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Notify;

/// A known Worker: its dense id, its textual address, and its most
/// recently reported CPU utilization in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Worker {
    pub id: u32,
    pub address: String,
    pub utilization: f64,
}

struct Inner {
    workers: Vec<Worker>,
    capacity: usize,
}

/// The Registry is the only shared mutable state in the Master: an
/// ordered, dense-id table of known Workers guarded by a single lock, so
/// every read and write appears atomic to concurrent callers (spec §3/§5).
pub struct Registry {
    inner: RwLock<Inner>,
    /// Notified every time a Worker is registered, so a Dispatcher waiting
    /// for the first `optimal()` Worker suspends instead of busy-waiting
    /// (spec §9's redesign of the original's `while (list->size <= 0);`).
    pub on_register: Notify,
}

impl Registry {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Registry {
            inner: RwLock::new(Inner {
                workers: Vec::new(),
                capacity,
            }),
            on_register: Notify::new(),
        })
    }

    /// Appends a Worker with the next dense id. Workers start at
    /// `utilization = 1.0` ("fully busy") until their first UTIL report.
    pub fn register(&self, address: String) -> Result<u32, Error> {
        let mut inner = self.inner.write();
        if inner.workers.len() >= inner.capacity {
            return Err(Error::Capacity);
        }
        let id = inner.workers.len() as u32;
        inner.workers.push(Worker {
            id,
            address,
            utilization: 1.0,
        });
        drop(inner);
        self.on_register.notify_waiters();
        Ok(id)
    }

    /// Updates a Worker's utilization. Fails with `Validation` if `id` is
    /// out of range or `util` is negative.
    pub fn update(&self, id: u32, util: f64) -> Result<(), Error> {
        if util < 0.0 {
            return Err(Error::Validation(format!(
                "utilization must be >= 0, got {}",
                util
            )));
        }
        let mut inner = self.inner.write();
        let idx = id as usize;
        if idx >= inner.workers.len() {
            return Err(Error::Validation(format!(
                "unknown worker id {} (registry size {})",
                id,
                inner.workers.len()
            )));
        }
        inner.workers[idx].utilization = util;
        Ok(())
    }

    /// The Worker with the minimum utilization, ties broken by lowest id.
    /// A pure derived query over the live table — never a cached field
    /// that could point at a stale entry if the pool shrank (spec §9).
    pub fn optimal(&self) -> Option<Worker> {
        let inner = self.inner.read();
        inner
            .workers
            .iter()
            .min_by(|a, b| {
                a.utilization
                    .partial_cmp(&b.utilization)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            })
            .cloned()
    }

    /// Waits until at least one Worker is registered, then returns the
    /// current optimal Worker. Used by the Dispatcher before its first
    /// attempt and after every transport-error retry.
    pub async fn wait_for_optimal(&self) -> Worker {
        loop {
            if let Some(worker) = self.optimal() {
                return worker;
            }
            self.on_register.notified().await;
        }
    }

    pub fn snapshot(&self) -> Vec<Worker> {
        self.inner.read().workers.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_dense_ids() {
        let registry = Registry::new(10);
        assert_eq!(registry.register("10.0.0.1".into()).unwrap(), 0);
        assert_eq!(registry.register("10.0.0.2".into()).unwrap(), 1);
        assert_eq!(registry.register("10.0.0.3".into()).unwrap(), 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn rejects_registration_past_capacity() {
        let registry = Registry::new(1);
        registry.register("10.0.0.1".into()).unwrap();
        assert!(matches!(
            registry.register("10.0.0.2".into()),
            Err(Error::Capacity)
        ));
    }

    #[test]
    fn optimal_picks_minimum_utilization_tie_break_by_id() {
        let registry = Registry::new(10);
        registry.register("w0".into()).unwrap();
        registry.register("w1".into()).unwrap();
        registry.update(0, 0.5).unwrap();
        registry.update(1, 0.5).unwrap();
        assert_eq!(registry.optimal().unwrap().id, 0);

        registry.update(1, 0.1).unwrap();
        assert_eq!(registry.optimal().unwrap().id, 1);
    }

    #[test]
    fn update_rejects_unknown_id_and_negative_utilization() {
        let registry = Registry::new(10);
        registry.register("w0".into()).unwrap();
        assert!(registry.update(5, 0.5).is_err());
        assert!(registry.update(0, -0.1).is_err());
        assert_eq!(registry.optimal().unwrap().utilization, 1.0);
    }

    #[test]
    fn idempotent_util_update() {
        let registry = Registry::new(10);
        registry.register("w0".into()).unwrap();
        registry.update(0, 0.3).unwrap();
        registry.update(0, 0.3).unwrap();
        assert_eq!(registry.optimal().unwrap().utilization, 0.3);
    }

    #[tokio::test]
    async fn wait_for_optimal_unblocks_on_register() {
        let registry = Registry::new(10);
        let registry2 = registry.clone();
        let handle = tokio::spawn(async move { registry2.wait_for_optimal().await });

        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        registry.register("w0".into()).unwrap();

        let worker = tokio::time::timeout(
            tokio::time::Duration::from_secs(1),
            handle,
        )
        .await
        .expect("should not time out")
        .expect("task should not panic");
        assert_eq!(worker.id, 0);
    }
}
