use std::path::PathBuf;

// Unset and blank values are both `None`.
fn get_env_var_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads an optional environment variable holding a filesystem path.
///
/// Returns `None` when the variable is unset or blank.
pub fn get_env_path(name: &str) -> Option<PathBuf> {
    get_env_var_opt(name).map(PathBuf::from)
}
