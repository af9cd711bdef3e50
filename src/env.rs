use std::env as stdenv;

/// Name of the compose project, injected into every `docker-compose`
/// invocation as `-p <name>`.
pub const PROJECT_VAR: &str = "DEVC_NAME";

/// When truthy, interactive runs echo the resolved command line before
/// launching it.
pub const VERBOSE_VAR: &str = "DEVC_VERBOSE";

/// Check whether an environment variable holds a truthy value.
///
/// Accepted spellings are `1`, `true`, `yes` and `on`, ignoring ASCII case
/// and surrounding whitespace. An unset variable is false.
pub fn is_true(key: &str) -> bool {
    match stdenv::var(key) {
        Ok(val) => matches!(
            val.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

/// Current compose project name, read from [`PROJECT_VAR`] at call time.
///
/// Unset resolves to the empty string rather than an error; compose itself
/// rejects an empty `-p` argument with a usable message.
pub fn project_name() -> String {
    stdenv::var(PROJECT_VAR).unwrap_or_default()
}
