//! Long-running workers registered by modules and started once the host runs.

use crate::domain::config::BackgroundFailurePolicy;
use crate::error::ModuleError;
use crate::hosting::lifecycle::Lifecycle;
use std::borrow::Cow;
use std::fmt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Spawns the worker on the current runtime.
type ServiceFactory = Box<dyn FnOnce(Lifecycle) -> JoinHandle<Result<(), ModuleError>> + Send>;

struct HostedService {
    owner: Cow<'static, str>,
    name: Cow<'static, str>,
    factory: ServiceFactory,
}

/// Pending background services, in registration order.
#[derive(Default)]
pub struct HostedServices {
    services: Vec<HostedService>,
}

impl fmt::Debug for HostedServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.services.iter().map(|s| format!("{}/{}", s.owner, s.name)))
            .finish()
    }
}

impl HostedServices {
    /// Queues a worker. `factory` receives the host [`Lifecycle`] so the worker can
    /// stop cooperatively on shutdown.
    pub fn add<F, Fut>(
        &mut self,
        owner: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) where
        F: FnOnce(Lifecycle) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ModuleError>> + Send + 'static,
    {
        self.services.push(HostedService {
            owner: owner.into(),
            name: name.into(),
            factory: Box::new(move |lifecycle| tokio::spawn(factory(lifecycle))),
        });
    }

    pub fn append(&mut self, other: &mut Self) {
        self.services.append(&mut other.services);
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Spawns every worker together with a supervisor that reports how it ended.
    ///
    /// A worker that returns an error or panics is logged; with
    /// [`BackgroundFailurePolicy::StopHost`] it also requests host shutdown.
    /// The returned handles belong to the supervisors.
    pub fn start(self, policy: BackgroundFailurePolicy, lifecycle: &Lifecycle) -> Vec<JoinHandle<()>> {
        self.services
            .into_iter()
            .map(|service| {
                let HostedService { owner, name, factory } = service;
                let worker = factory(lifecycle.clone());
                let lifecycle = lifecycle.clone();

                info!(module = %owner, service = %name, "Hosted service started");

                tokio::spawn(async move {
                    let failure = match worker.await {
                        Ok(Ok(())) => {
                            debug!(module = %owner, service = %name, "Hosted service finished");
                            return;
                        },
                        Ok(Err(e)) => e.to_string(),
                        Err(e) if e.is_panic() => format!("panicked: {e}"),
                        Err(_) => return,
                    };

                    error!(module = %owner, service = %name, error = %failure, "Hosted service failed");

                    if policy == BackgroundFailurePolicy::StopHost && lifecycle.stop() {
                        warn!(module = %owner, service = %name, "Stopping host after background failure");
                    }
                })
            })
            .collect()
    }
}
