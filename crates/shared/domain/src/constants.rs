/// Human-readable application name, reported in logs and the `OpenAPI` document.
pub const APP_NAME: &str = "ModularMonolith";

/// Prefix for every application-defined environment variable (`MONOLITH_PORT`, ...).
pub const ENV_PREFIX: &str = "MONOLITH";

/// Base name of the optional configuration file (`monolith.toml`, `monolith.json`, ...).
pub const CONFIG_FILE: &str = "monolith";

/// Local development file that seeds environment variables before binding.
pub const DOTENV_FILE: &str = ".env";

/// Route value key stamped on every module endpoint; templates consume it as `{module}`.
pub const MODULE_ROUTE_KEY: &str = "module";

/// `OpenAPI` tag for endpoints owned by the Host itself.
pub const SYSTEM_TAG: &str = "System";

/// Environment name that enables developer diagnostics.
pub const DEVELOPMENT: &str = "Development";

/// Environment name used when none is configured.
pub const PRODUCTION: &str = "Production";
