//! String path helpers.

/// Split `path` into its parent directory and final component.
///
/// Trailing slashes are ignored. A path without a separator lives in `.`,
/// and a single-component absolute path lives in `/`.
pub fn split(path: &str) -> (String, String) {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        let dir = if path.starts_with('/') { "/" } else { "." };
        return (dir.to_string(), String::new());
    }

    match trimmed.rfind('/') {
        None => (".".to_string(), trimmed.to_string()),
        Some(idx) => {
            let dir = trimmed[..idx].trim_end_matches('/');
            let dir = if dir.is_empty() { "/" } else { dir };
            (dir.to_string(), trimmed[idx + 1..].to_string())
        }
    }
}

/// True if `name` can be stored as a directory entry.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}

/// Join `path` onto `base` unless it is already absolute.
pub fn absolute(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }
}

/// Lexically normalise an absolute path: drop empty and `.` segments and
/// apply `..`, clamping at the root.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(path: &str) -> (String, String) {
        split(path)
    }

    #[test]
    fn test_split() {
        assert_eq!(parts("/a/b"), ("/a".into(), "b".into()));
        assert_eq!(parts("/a"), ("/".into(), "a".into()));
        assert_eq!(parts("a"), (".".into(), "a".into()));
        assert_eq!(parts("a/b/"), ("a".into(), "b".into()));
        assert_eq!(parts("//a"), ("/".into(), "a".into()));
        assert_eq!(parts("/a//b"), ("/a".into(), "b".into()));
        assert_eq!(parts("/"), ("/".into(), "".into()));
        assert_eq!(parts(""), (".".into(), "".into()));
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("file.txt"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("."));
        assert!(!is_valid_name(".."));
        assert!(!is_valid_name("a/b"));
    }

    #[test]
    fn test_absolute_and_normalize() {
        assert_eq!(absolute("/work/", "a"), "/work/a");
        assert_eq!(absolute("/work", "/etc"), "/etc");
        assert_eq!(normalize("/a/./b/../c//"), "/a/c");
        assert_eq!(normalize("/../.."), "/");
    }
}
