use super::{ConfigError, ConfigErrorExt};
use std::path::Path;

/// Result of seeding the process environment from a `.env` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvOutcome {
    /// No file at the given path.
    Missing,
    /// File was read. Both lists keep file order.
    Loaded {
        /// Variables the file set, with the length of their value.
        applied: Vec<(String, usize)>,
        /// Variables already present in the process environment, left untouched.
        skipped: Vec<String>,
    },
}

impl DotenvOutcome {
    /// Logs the outcome. Values are never printed, only their lengths.
    pub fn log(&self, path: &Path) {
        match self {
            Self::Missing => {
                tracing::info!(path = %path.display(), "No dotenv file found, using process environment");
            },
            Self::Loaded { applied, skipped } => {
                for (key, len) in applied {
                    tracing::debug!(%key, value = %format_args!("<redacted {len} chars>"), "Dotenv variable applied");
                }
                for key in skipped {
                    tracing::debug!(%key, "Dotenv variable skipped, already set in the environment");
                }
                tracing::info!(
                    path = %path.display(),
                    applied = applied.len(),
                    skipped = skipped.len(),
                    "Environment seeded from dotenv file"
                );
            },
        }
    }
}

/// Seeds the process environment from `path` before configuration is bound.
///
/// A missing file is not an error. Existing variables are never overridden, so the real
/// environment always wins over the file.
///
/// # Errors
/// Returns [`ConfigError::Dotenv`] when the file exists but cannot be read or parsed.
pub fn seed_from_dotenv(path: impl AsRef<Path>) -> Result<DotenvOutcome, ConfigError> {
    let path = path.as_ref();

    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(DotenvOutcome::Missing);
        },
        Err(err) => return Err(ConfigError::from(err)).context("Failed to open dotenv file"),
    };

    let entries = iter
        .collect::<Result<Vec<_>, _>>()
        .map_err(ConfigError::from)
        .context("Failed to parse dotenv file")?;

    let (present, absent): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(|(key, _)| std::env::var_os(key).is_some());

    dotenvy::from_path(path).map_err(ConfigError::from).context("Failed to load dotenv file")?;

    Ok(DotenvOutcome::Loaded {
        applied: absent.into_iter().map(|(key, value)| (key, value.len())).collect(),
        skipped: present.into_iter().map(|(key, _)| key).collect(),
    })
}
