use std::path::{Path, PathBuf};
use uzers::os::unix::UserExt;

/// Expand a leading tilde against the operator home directory.
///
/// Supports:
/// - `~` or `~/path` - expands to `home`
/// - `~username/path` - expands to that user's home directory
///
/// Returns `None` when the path is not valid UTF-8 or names an unknown user.
pub fn expand_tilde<P: AsRef<Path>>(path: P, home: &Path) -> Option<PathBuf> {
    let path = path.as_ref();
    let path_str = path.to_str()?;

    let Some(after_tilde) = path_str.strip_prefix('~') else {
        return Some(path.to_path_buf());
    };

    if after_tilde.is_empty() || after_tilde.starts_with('/') {
        return Some(home.join(after_tilde.trim_start_matches('/')));
    }

    let username_end = after_tilde.find('/').unwrap_or(after_tilde.len());
    let username = &after_tilde[..username_end];
    let rest = after_tilde[username_end..].trim_start_matches('/');

    let user = uzers::get_user_by_name(username)?;
    Some(user.home_dir().join(rest))
}

/// Home directory from `$HOME`
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}
