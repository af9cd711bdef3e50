use anyhow::{Context, Result};
use std::fs::File;

/// Detect and strip a trailing input redirection, returning the source path.
///
/// Only the last two arguments are inspected: `[..., "<", path]`. A `<`
/// anywhere earlier in the list is an ordinary argument and is left alone,
/// as is any list shorter than two elements.
pub(crate) fn take_trailing(args: &mut Vec<String>) -> Option<String> {
    let n = args.len();
    if n < 2 || args[n - 2] != "<" {
        return None;
    }
    let path = args.pop()?;
    args.truncate(n - 2);
    Some(path)
}

/// Open a redirection source for reading.
pub(crate) fn open_source(path: &str) -> Result<File> {
    File::open(path).with_context(|| format!("cannot open redirection source {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn trailing_redirect_is_stripped() {
        let mut a = args(&["exec", "db", "<", "/tmp/dump.sql"]);
        let path = take_trailing(&mut a);
        assert_eq!(path.as_deref(), Some("/tmp/dump.sql"));
        assert_eq!(a, args(&["exec", "db"]));
    }

    #[test]
    fn redirect_alone_is_recognized() {
        let mut a = args(&["<", "input.txt"]);
        let path = take_trailing(&mut a);
        assert_eq!(path.as_deref(), Some("input.txt"));
        assert!(a.is_empty());
    }

    #[test]
    fn early_marker_is_a_literal_argument() {
        let mut a = args(&["grep", "<", "pattern", "file"]);
        let path = take_trailing(&mut a);
        assert_eq!(path, None);
        assert_eq!(a, args(&["grep", "<", "pattern", "file"]));
    }

    #[test]
    fn short_lists_are_untouched() {
        let mut single = args(&["<"]);
        assert_eq!(take_trailing(&mut single), None);
        assert_eq!(single, args(&["<"]));

        let mut empty: Vec<String> = Vec::new();
        assert_eq!(take_trailing(&mut empty), None);
        assert!(empty.is_empty());
    }

    #[test]
    fn open_missing_source_names_the_path() {
        let err = open_source("/definitely/not/here.txt").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }
}
