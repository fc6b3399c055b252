//! Scratch files handed to the invoked process.

use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use super::{InvocationRequest, InvokerError};

const SCHEMA_FILE: &str = "schema.json";
const CONTEXT_FILE: &str = "context.json";

/// Temporary directory holding the schema and context files for one
/// invocation. Removed when dropped.
pub(super) struct ScratchFiles {
    _dir: TempDir,
    pub(super) schema: Option<Utf8PathBuf>,
    pub(super) context: Option<Utf8PathBuf>,
}

impl ScratchFiles {
    /// Writes whichever optional payloads the request carries.
    pub(super) fn prepare(request: &InvocationRequest) -> Result<Self, InvokerError> {
        let temp = tempfile::Builder::new()
            .prefix("beacon-invoke-")
            .tempdir()
            .map_err(|error| io_error("failed to create scratch directory", &error))?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).map_err(|_| {
            InvokerError::Io {
                message: "scratch directory path is not valid UTF-8".to_owned(),
            }
        })?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|error| io_error("failed to open scratch directory", &error))?;

        let schema = request
            .schema
            .as_ref()
            .map(|schema| {
                let contents = serde_json::to_vec_pretty(schema).map_err(|error| {
                    InvokerError::Io {
                        message: format!("failed to serialise schema: {error}"),
                    }
                })?;
                write_file(&dir, &root, SCHEMA_FILE, &contents)
            })
            .transpose()?;
        let context = request
            .context
            .as_deref()
            .map(|context| write_file(&dir, &root, CONTEXT_FILE, context.as_bytes()))
            .transpose()?;

        Ok(Self {
            _dir: temp,
            schema,
            context,
        })
    }
}

fn write_file(
    dir: &Dir,
    root: &Utf8Path,
    name: &str,
    contents: &[u8],
) -> Result<Utf8PathBuf, InvokerError> {
    dir.write(name, contents)
        .map_err(|error| io_error(&format!("failed to write {name}"), &error))?;
    Ok(root.join(name))
}

fn io_error(context: &str, error: &std::io::Error) -> InvokerError {
    InvokerError::Io {
        message: format!("{context}: {error}"),
    }
}
