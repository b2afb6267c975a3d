use crate::domain::constants::MODULE_ROUTE_KEY;
use crate::module::descriptor::ModuleOrigin;
use crate::module::registry::ModuleRegistry;
use crate::routing::endpoint::Endpoint;
use fxhash::FxHashMap;

/// Gives every module endpoint the route value `module = <route prefix>`.
///
/// The owner is found by the endpoint's origin. Host endpoints have no owning module
/// and are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ModuleRoutingConvention {
    prefixes: FxHashMap<ModuleOrigin, String>,
}

impl ModuleRoutingConvention {
    #[must_use]
    pub fn new(registry: &ModuleRegistry) -> Self {
        let prefixes = registry
            .iter()
            .map(|descriptor| (descriptor.origin(), descriptor.route_prefix().to_owned()))
            .collect();
        Self { prefixes }
    }

    /// Returns whether the endpoint belongs to a registered module.
    pub fn apply(&self, endpoint: &mut Endpoint) -> bool {
        match self.prefixes.get(&endpoint.origin()) {
            Some(prefix) => {
                endpoint.set_route_value(MODULE_ROUTE_KEY, prefix.clone());
                true
            },
            None => false,
        }
    }

    #[must_use]
    pub fn prefix_of(&self, origin: ModuleOrigin) -> Option<&str> {
        self.prefixes.get(&origin).map(String::as_str)
    }
}
