use crate::domain::config::Configuration;
use crate::domain::environment::HostEnvironment;
use crate::error::{StartupError, StartupErrorExt};
use crate::hosting::background::HostedServices;
use crate::module::contract::{Migrate, ModuleContext, ModuleStartup};
use crate::module::descriptor::{ModuleDescriptor, ModuleOrigin};
use fxhash::FxHashMap;
use std::any::TypeId;
use std::sync::Arc;
use tracing::{debug, info};

/// Host-owned services every module registration can read from.
#[derive(Debug)]
pub struct HostServices {
    pub config: Configuration,
    pub environment: HostEnvironment,
    pub hosted: HostedServices,
}

impl HostServices {
    #[must_use]
    pub fn new(config: Configuration, environment: HostEnvironment) -> Self {
        Self { config, environment, hosted: HostedServices::default() }
    }
}

/// Ordered set of registered modules, indexed by origin and by route prefix.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
    by_origin: FxHashMap<TypeId, usize>,
    by_prefix: FxHashMap<String, usize>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module without a migration step.
    ///
    /// The prefix and origin are validated before `factory` runs; on any error the
    /// registry is left unchanged.
    ///
    /// # Errors
    /// * [`StartupError::InvalidPrefix`] for an empty or non URL-safe prefix.
    /// * [`StartupError::DuplicateModule`] when `T` is already registered.
    /// * [`StartupError::DuplicatePrefix`] when another module owns the prefix.
    /// * [`StartupError::Module`] when the module's service registration fails.
    pub fn register<T, F>(
        &mut self,
        route_prefix: impl Into<String>,
        factory: F,
        services: &mut HostServices,
    ) -> Result<&ModuleDescriptor, StartupError>
    where
        T: ModuleStartup,
        F: FnOnce() -> T,
    {
        let (prefix, module) = self.build(route_prefix.into(), factory, services)?;
        Ok(self.insert(ModuleDescriptor::new(prefix, ModuleOrigin::of::<T>(), module, None)))
    }

    /// Registers a module that also runs a migration at startup.
    ///
    /// # Errors
    /// Same as [`register`](Self::register).
    pub fn register_migratable<T, F>(
        &mut self,
        route_prefix: impl Into<String>,
        factory: F,
        services: &mut HostServices,
    ) -> Result<&ModuleDescriptor, StartupError>
    where
        T: ModuleStartup + Migrate,
        F: FnOnce() -> T,
    {
        let (prefix, module) = self.build(route_prefix.into(), factory, services)?;
        let migrator: Arc<dyn Migrate> = module.clone();
        Ok(self.insert(ModuleDescriptor::new(
            prefix,
            ModuleOrigin::of::<T>(),
            module,
            Some(migrator),
        )))
    }

    fn build<T, F>(
        &self,
        prefix: String,
        factory: F,
        services: &mut HostServices,
    ) -> Result<(String, Arc<T>), StartupError>
    where
        T: ModuleStartup,
        F: FnOnce() -> T,
    {
        validate_prefix(&prefix)?;

        let origin = ModuleOrigin::of::<T>();
        if self.by_origin.contains_key(&origin.id()) {
            return Err(StartupError::DuplicateModule { module: origin.name(), context: None });
        }
        if let Some(&index) = self.by_prefix.get(&prefix) {
            return Err(StartupError::DuplicatePrefix {
                prefix: prefix.into(),
                owner: self.modules[index].origin().name(),
                context: None,
            });
        }

        let mut module = factory();

        // Stage hosted services so a failing module leaves nothing behind.
        let mut staged = HostedServices::default();
        let mut ctx =
            ModuleContext::new(&prefix, &services.config, &services.environment, &mut staged);

        module
            .configure_services(&mut ctx)
            .map_err(|source| StartupError::Module {
                module: prefix.clone().into(),
                source,
                context: None,
            })
            .context("Failed to register module services")?;

        debug!(module = %prefix, hosted = staged.len(), "Module services registered");
        services.hosted.append(&mut staged);

        Ok((prefix, Arc::new(module)))
    }

    fn insert(&mut self, descriptor: ModuleDescriptor) -> &ModuleDescriptor {
        let index = self.modules.len();
        self.by_origin.insert(descriptor.origin().id(), index);
        self.by_prefix.insert(descriptor.route_prefix().to_owned(), index);

        info!(
            module = %descriptor.route_prefix(),
            origin = descriptor.origin().name(),
            migratable = descriptor.migrator().is_some(),
            "Module registered"
        );

        self.modules.push(descriptor);
        &self.modules[index]
    }

    /// Looks up the module declared by `origin`.
    #[must_use]
    pub fn get(&self, origin: ModuleOrigin) -> Option<&ModuleDescriptor> {
        self.by_origin.get(&origin.id()).map(|&index| &self.modules[index])
    }

    #[must_use]
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&ModuleDescriptor> {
        self.by_prefix.get(prefix).map(|&index| &self.modules[index])
    }

    /// Modules in registration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ModuleDescriptor> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// A prefix is one non-empty URL path segment made of unreserved characters.
fn validate_prefix(prefix: &str) -> Result<(), StartupError> {
    let valid = !prefix.is_empty()
        && prefix != "."
        && prefix != ".."
        && prefix.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'));

    if valid {
        Ok(())
    } else {
        Err(StartupError::InvalidPrefix { prefix: prefix.to_owned().into(), context: None })
    }
}
