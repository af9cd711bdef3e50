use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// True when the executable is named by filesystem path rather than by a
/// bare command name: `./`-relative or `/`-absolute.
///
/// Such invocations go straight to the OS loader; the launcher performs no
/// PATH validation for them and keeps no record of them.
pub(crate) fn is_path_invocation(exe: &str) -> bool {
    exe.starts_with("./") || exe.starts_with('/')
}

/// Resolve a bare command name against the current `PATH`.
pub(crate) fn find_on_path(exe: &str) -> Option<PathBuf> {
    let search_paths = std::env::var_os("PATH")?;
    find_in_path(&search_paths, OsStr::new(exe))
}

/// Search each directory of a PATH-like string for an executable file.
///
/// Behavior:
/// - Directories are tried in order; the first match wins.
/// - A candidate must be a regular file, and on Unix must carry at least
///   one executable permission bit; a non-executable file of the right
///   name does not stop the search.
/// - No match in any directory: returns `None`.
pub(crate) fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let candidate = dir.join(cmd);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use std::fs;

    #[cfg(unix)]
    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    #[test]
    #[cfg(unix)]
    fn finds_sh_in_bin() {
        let res = find_in_path(osstr("/bin"), OsStr::new("sh"));
        let found = res.expect("Expected to find 'sh' in /bin");
        assert!(found.ends_with("sh"), "found {:?}", found);
        assert!(found.starts_with("/bin"), "found {:?}", found);
    }

    #[test]
    #[cfg(unix)]
    fn first_matching_directory_wins() {
        let res = find_in_path(osstr("/nonexisting-dir:/bin"), OsStr::new("sh"));
        let found = res.expect("Expected to find 'sh' via second PATH entry");
        assert!(found.starts_with("/bin"), "found {:?}", found);
    }

    #[test]
    #[cfg(unix)]
    fn unknown_name_not_found() {
        let res = find_in_path(osstr("/bin"), OsStr::new("nonexisting-cmd-9f2c"));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn non_executable_file_is_skipped() {
        // Create a temp dir holding a plain (mode 644) file named like a command
        let tmp_base = std::env::temp_dir().join(format!("lookup_tests_{}", std::process::id()));
        let _ = fs::remove_dir_all(&tmp_base);
        fs::create_dir_all(&tmp_base).expect("create temp dir");
        let file_path = tmp_base.join("plainfile");
        fs::write(&file_path, "not a program").expect("write plainfile");

        let res = find_in_path(tmp_base.as_os_str(), OsStr::new("plainfile"));
        assert!(res.is_none(), "mode 644 file should not resolve, got {:?}", res);

        let _ = fs::remove_dir_all(tmp_base);
    }

    #[test]
    #[cfg(unix)]
    fn empty_search_path_is_none() {
        let res = find_in_path(osstr(""), OsStr::new("sh"));
        assert!(res.is_none());
    }

    #[test]
    fn path_invocations_are_classified() {
        assert!(is_path_invocation("./run.sh"));
        assert!(is_path_invocation("/usr/bin/true"));
        assert!(!is_path_invocation("docker-compose"));
        assert!(!is_path_invocation("bin/sh"));
        assert!(!is_path_invocation(""));
    }
}
