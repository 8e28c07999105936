use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// Locates the path under which a workspace crate is reachable from the
/// crate invoking a derive macro.
///
/// Generated code must name `vc_schema` items whether the user depends on
/// `vc_schema` directly or only on the `vc_mapping` facade, which re-exports
/// it as `vc_mapping::schema`.
///
/// # Example
///
/// ```rust
/// # use vc_macro_utils::Manifest;
/// let path: syn::Path = Manifest::shared(|m| m.get_crate_path("vc_schema"));
/// ```
///
/// Reading the manifest is not cheap, call this once per macro invocation
/// and reuse the result.
///
/// # Resolution rules
///
/// 1. If the requested crate is listed in `dependencies`, return `::crate_name`.
/// 2. If the requested crate name begins with `vc_` and the invoking crate
///    depends on `vc_mapping`, return `::vc_mapping::short_name`
///    (e.g. `vc_schema` -> `::vc_mapping::schema`).
/// 3. Repeat step 1-2 in `dev-dependencies`.
/// 4. Otherwise, fall back to the absolute path `::crate_name`.
///
/// ## Note
///
/// A crate referencing itself cannot name itself with `::crate_name` unless
/// it declares `extern crate self as crate_name;` in its root, which the
/// schema crate does.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Document<Box<str>>,
    pub modified_time: SystemTime,
}

const FACADE_NAME: &str = "vc_mapping";
const WORKSPACE_PREFIX: &str = "vc_";

impl Manifest {
    #[inline(never)]
    fn get_manifest_path() -> PathBuf {
        let dir = env::var_os("CARGO_MANIFEST_DIR")
            .unwrap_or_else(|| panic!("CARGO_MANIFEST_DIR should be defined by cargo."));
        let path = PathBuf::from(dir).join("Cargo.toml");
        assert!(
            path.exists(),
            "Cargo manifest does not exist at path {}",
            path.display(),
        );
        path
    }

    #[inline(never)]
    fn get_manifest_modified_time(path: &Path) -> Result<SystemTime, std::io::Error> {
        std::fs::metadata(path).and_then(|metadata| metadata.modified())
    }

    #[inline(never)]
    fn read_manifest(path: &Path) -> Document<Box<str>> {
        let manifest = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("Unable to read cargo manifest: {}", path.display()))
            .into_boxed_str();
        Document::parse(manifest)
            .unwrap_or_else(|_| panic!("Failed to parse cargo manifest: {}", path.display()))
    }

    #[inline]
    fn parse_path(path: &str) -> syn::Path {
        syn::parse_str(path).unwrap_or_else(|_| panic!("`{path}` is not a valid path"))
    }

    fn find_in_deps(deps: &Table, name: &str) -> Option<syn::Path> {
        if deps.contains_key(name) {
            return Some(Self::parse_path(&format!("::{name}")));
        }
        let module = name.strip_prefix(WORKSPACE_PREFIX)?;
        deps.contains_key(FACADE_NAME)
            .then(|| Self::parse_path(&format!("::{FACADE_NAME}::{module}")))
    }

    /// Returns a [`syn::Path`] for the package named `name` as resolved from
    /// the invoking crate's Cargo.toml, see the type documentation.
    #[inline(never)]
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        for table in ["dependencies", "dev-dependencies"] {
            if let Some(Item::Table(deps)) = self.manifest.get(table)
                && let Some(path) = Self::find_in_deps(deps, name)
            {
                return path;
            }
        }
        Self::parse_path(&format!("::{name}"))
    }

    /// Obtains the [`Manifest`] of the invoking crate.
    ///
    /// Parsed manifests are cached per path and refreshed when the file's
    /// modification time changes.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let manifest_path = Self::get_manifest_path();
        let modified_time = Self::get_manifest_modified_time(&manifest_path)
            .unwrap_or_else(|_| panic!("The Cargo.toml should have a modified time."));

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);

        if let Some(manifest) = manifests.get(&manifest_path)
            && manifest.modified_time == modified_time
        {
            return func(manifest);
        }

        drop(manifests);

        let manifest = Manifest {
            manifest: Self::read_manifest(&manifest_path),
            modified_time,
        };

        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(manifest_path, manifest);

        result
    }
}

#[cfg(test)]
mod tests {
    use toml_edit::{Document, Item};

    use super::Manifest;

    fn resolve(toml: &str, name: &str) -> String {
        let document = Document::parse(toml.to_string()).unwrap();
        let Some(Item::Table(deps)) = document.get("dependencies") else {
            return format!("::{name}");
        };
        let path = Manifest::find_in_deps(deps, name).unwrap_or_else(|| Manifest::parse_path(&format!("::{name}")));
        path.segments
            .iter()
            .map(|segment| format!("::{}", segment.ident))
            .collect()
    }

    #[test]
    fn direct_dependency_wins() {
        let toml = "[dependencies]\nvc_schema = \"0.1\"\nvc_mapping = \"0.1\"\n";
        assert_eq!(resolve(toml, "vc_schema"), "::vc_schema");
    }

    #[test]
    fn facade_dependency() {
        let toml = "[dependencies]\nvc_mapping = \"0.1\"\n";
        assert_eq!(resolve(toml, "vc_schema"), "::vc_mapping::schema");
    }
}
