use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::module::error::ModuleError;

const EXTENSION: &str = "js";
const INDEX_FILE: &str = "index.js";

/// Candidate files for a module path, in lookup order: the path itself, the
/// path with a `.js` extension, then an `index.js` inside it.
pub fn candidates(path: &Path) -> [PathBuf; 3] {
    let mut with_extension = path.as_os_str().to_owned();
    with_extension.push(".");
    with_extension.push(EXTENSION);

    [
        path.to_path_buf(),
        PathBuf::from(with_extension),
        path.join(INDEX_FILE),
    ]
}

/// Finds the file a module path refers to.
pub fn resolve(path: &Path) -> Result<PathBuf, ModuleError> {
    candidates(path)
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| ModuleError::NotFound(Cow::Owned(path.display().to_string())))
}
