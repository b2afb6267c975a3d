use crate::module::contract::{Migrate, ModuleStartup};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Identity of a module's startup type. Endpoints carry it so the host can map them
/// back to the module that declared them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleOrigin {
    id: TypeId,
    name: &'static str,
}

impl ModuleOrigin {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { id: TypeId::of::<T>(), name: std::any::type_name::<T>() }
    }

    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ModuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A registered module. Created once during registration and never mutated.
#[derive(Clone)]
pub struct ModuleDescriptor {
    route_prefix: String,
    origin: ModuleOrigin,
    startup: Arc<dyn ModuleStartup>,
    migrator: Option<Arc<dyn Migrate>>,
}

impl ModuleDescriptor {
    pub(crate) fn new(
        route_prefix: String,
        origin: ModuleOrigin,
        startup: Arc<dyn ModuleStartup>,
        migrator: Option<Arc<dyn Migrate>>,
    ) -> Self {
        Self { route_prefix, origin, startup, migrator }
    }

    #[must_use]
    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    #[must_use]
    pub const fn origin(&self) -> ModuleOrigin {
        self.origin
    }

    #[must_use]
    pub fn startup(&self) -> &dyn ModuleStartup {
        self.startup.as_ref()
    }

    /// The migration capability, when the module declared one.
    #[must_use]
    pub fn migrator(&self) -> Option<&dyn Migrate> {
        self.migrator.as_deref()
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("route_prefix", &self.route_prefix)
            .field("origin", &self.origin.name)
            .field("startup", &self.startup)
            .field("migratable", &self.migrator.is_some())
            .finish()
    }
}
