use std::fs::File;
use std::path::Path;

use crate::error::EvalError;

pub(crate) fn ensure_not_empty<T>(items: &[T]) -> Result<(), EvalError> {
    if items.is_empty() {
        return Err(EvalError::Empty);
    }
    Ok(())
}

/// Creates the file, and its parent directory when missing.
pub(crate) fn create_output_file(path: impl AsRef<Path>) -> Result<File, EvalError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}
