use crate::{registration, submission, utilization};
use dispatch_core::{wire, Config, Registry, Shutdown};
use std::sync::Arc;
use tracing::info;

/// Owns the Registry, starts the three listeners, and propagates shutdown
/// to all of them (spec §2/§4.9/§9).
pub struct Supervisor {
    pub registry: Arc<Registry>,
    pub config: Arc<Config>,
    pub shutdown: Shutdown,
}

impl Supervisor {
    pub fn new(config: Config) -> Self {
        let registry = Registry::new(config.registry_capacity);
        Supervisor {
            registry,
            config: Arc::new(config),
            shutdown: Shutdown::new(),
        }
    }

    /// Binds all three listeners then spawns their accept loops, returning
    /// the join handles so a caller (tests, or `main`) can await them
    /// alongside a shutdown trigger.
    pub async fn start(&self) -> Result<Vec<tokio::task::JoinHandle<()>>, dispatch_core::Error> {
        let reg_listener = wire::listen(("0.0.0.0", self.config.reg_port), 5).await?;
        let util_listener = wire::listen(("0.0.0.0", self.config.util_port), 5).await?;
        let sub_listener = wire::listen(("0.0.0.0", self.config.sub_port), 5).await?;

        info!("master listening: REG={} SUB={} UTIL={}", self.config.reg_port, self.config.sub_port, self.config.util_port);

        let registration = tokio::spawn(registration::run(
            reg_listener,
            self.registry.clone(),
            self.shutdown.clone(),
        ));
        let utilization = tokio::spawn(utilization::run(
            util_listener,
            self.registry.clone(),
            self.shutdown.clone(),
        ));
        let submission = tokio::spawn(submission::run(
            sub_listener,
            self.registry.clone(),
            self.config.clone(),
            self.shutdown.clone(),
        ));

        Ok(vec![registration, utilization, submission])
    }

    pub fn shutdown(&self) {
        self.shutdown.signal();
    }
}
