use std::{
    io,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy)]
enum ResolvedPaths {
    Production,
    Development,
}

const ROOT_MARKER: &str = "$ROOT";
const SYSTEM_MARKER: &str = "$SYSTEM";

/// Resolver for the `$ROOT` (user data) and `$SYSTEM` (install root) path
/// markers used in configuration values such as the web document root
#[derive(Clone)]
pub struct Paths {
    mode: ResolvedPaths,
    system_root: PathBuf,
    user_root: PathBuf,
}

impl Paths {
    fn find_dev_root(first_root: &Path) -> Option<PathBuf> {
        let bn = first_root.file_name().and_then(std::ffi::OsStr::to_str);

        if bn == Some("release") || bn == Some("debug") {
            // A Rust target dir?
            let mut current_root = first_root.parent();
            while let Some(root) = current_root {
                if root.file_name().and_then(std::ffi::OsStr::to_str) == Some("target") {
                    // We need the parent of this one
                    return root.parent().map(Path::to_owned);
                } else {
                    // Keep going up
                    current_root = root.parent();
                }
            }
        }

        None
    }

    fn find_bin_root(first_root: &Path) -> Option<PathBuf> {
        let bn = first_root.file_name().and_then(std::ffi::OsStr::to_str);

        if bn == Some("bin") {
            return first_root.parent().map(|path| {
                let mut p = path.to_owned();
                p.push("share");
                p.push("ledvirt");
                p
            });
        }

        None
    }

    fn user_root(user_root: Option<PathBuf>) -> PathBuf {
        if let Some(user_root) = user_root {
            user_root
        } else {
            dirs::config_dir()
                .map(|mut path| {
                    path.push("ledvirt");
                    path
                })
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    pub fn new(user_root: Option<PathBuf>) -> io::Result<Self> {
        // Try to find the current exe
        let proc = std::env::current_exe()?;
        let first_root = proc.parent().unwrap_or_else(|| Path::new("."));

        if let Some(dev_root) = Self::find_dev_root(first_root) {
            debug!(path = %dev_root.display(), "found development root");

            Ok(Self {
                mode: ResolvedPaths::Development,
                system_root: dev_root.clone(),
                user_root: user_root.unwrap_or(dev_root),
            })
        } else if let Some(bin_root) = Self::find_bin_root(first_root) {
            debug!(path = %bin_root.display(), "found production root");

            Ok(Self {
                mode: ResolvedPaths::Production,
                system_root: bin_root,
                user_root: Self::user_root(user_root),
            })
        } else {
            debug!(path = %first_root.display(), "no root found, using binary");

            Ok(Self {
                mode: ResolvedPaths::Production,
                system_root: first_root.to_owned(),
                user_root: Self::user_root(user_root),
            })
        }
    }

    pub fn resolve_path(&self, p: impl Into<PathBuf>) -> PathBuf {
        let p: PathBuf = p.into();

        if p.is_absolute() {
            // Don't transform absolute paths
            trace!(path = %p.display(), "left unchanged");
            p
        } else {
            let mut out_path = PathBuf::new();
            let mut components = p.components().peekable();

            if let Some(component) = components.peek() {
                let component = component.as_os_str().to_str();
                if component == Some(SYSTEM_MARKER) {
                    out_path.extend(&self.system_root);
                    components.next();

                    if let ResolvedPaths::Development = self.mode {
                        if components.peek().and_then(|cmp| cmp.as_os_str().to_str())
                            == Some("frontend")
                        {
                            // Panel bundle lives in the frontend build dir
                            // in development
                            components.next();
                            out_path.extend(&PathBuf::from("frontend/dist"));
                        }
                    }
                } else if component == Some(ROOT_MARKER) {
                    out_path.extend(&self.user_root);
                    components.next();
                }
            }

            out_path.extend(components);

            trace!(src = %p.display(), dst = %out_path.display(), "remapped path");
            out_path
        }
    }
}
