use super::{Backend, BackendInfo, BackendParams, BackendRegistration};
use crate::{EnvrunError, Result};
use directories::BaseDirs;
use std::fs;
use std::path::PathBuf;

/// Reads the full contents of the file named by the key.
///
/// A leading `~` is expanded to the user's home directory. A file that cannot
/// be read, including one that does not exist, is an error rather than a
/// missing value: there is nowhere to store a prompted value, so prompting
/// would only hide a broken path.
///
/// # Options
///
/// - `trim` (bool): strip trailing whitespace, e.g. the newline most editors
///   append to token files.
pub struct FileBackend {
    params: BackendParams,
    trim: bool,
}

impl FileBackend {
    pub const REGISTRATION: BackendRegistration = BackendRegistration {
        info: BackendInfo {
            name: "file",
            description: "Contents of a file",
            examples: &["[vars.file] TOKEN = \"~/.config/service/token\""],
        },
        factory: |params| Ok(Box::new(FileBackend::new(params)?)),
    };

    pub fn new(params: BackendParams) -> Result<Self> {
        let trim = params.bool_option("trim")?;
        Ok(Self { params, trim })
    }
}

impl Backend for FileBackend {
    fn params(&self) -> &BackendParams {
        &self.params
    }

    fn kind(&self) -> &'static str {
        Self::REGISTRATION.info.name
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = expand_home(key);
        let contents = fs::read_to_string(&path)
            .map_err(|source| EnvrunError::FileRead { path, source })?;

        if self.trim {
            Ok(Some(contents.trim_end().to_string()))
        } else {
            Ok(Some(contents))
        }
    }
}

/// Expands `~` and `~/...` to the home directory. Other paths, including
/// `~user/...`, are returned unchanged.
pub(crate) fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(path),
    };

    match BaseDirs::new() {
        Some(dirs) => {
            let rest = rest.trim_start_matches(['/', '\\']);
            if rest.is_empty() {
                dirs.home_dir().to_path_buf()
            } else {
                dirs.home_dir().join(rest)
            }
        }
        None => PathBuf::from(path),
    }
}
