use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

use crate::config::OutputConfig;
use crate::container::{RuntimeContainer, Snapshot};

use super::{Error, Renderer, Result, filter_containers, remove_blank_lines};

/// Renders templates with minijinja and replaces destination files atomically.
///
/// Templates see two variables: `containers`, the (filtered) snapshot, and `env`, the process
/// environment. Writes to one destination are serialized, so concurrent passes for the same
/// output never interleave.
#[derive(Debug, Default)]
pub struct FileRenderer {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl FileRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, dest: &Path) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(dest.to_path_buf()).or_default().value())
    }

    /// Replaces `dest` with `text` unless it already holds exactly that content.
    fn write_if_changed(&self, dest: &Path, text: &str) -> Result<bool> {
        let lock = self.lock_for(dest);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let permissions = match std::fs::read(dest) {
            Ok(current) if current == text.as_bytes() => return Ok(false),
            Ok(_) => std::fs::metadata(dest).ok().map(|m| m.permissions()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(Error::DestRead {
                    path: dest.to_path_buf(),
                    source,
                });
            }
        };

        let dir = match dest.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let write_err = |source| Error::Write {
            path: dest.to_path_buf(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(text.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        if let Some(permissions) = permissions {
            tmp.as_file().set_permissions(permissions).map_err(write_err)?;
        }
        tmp.persist(dest).map_err(|source| Error::Persist {
            path: dest.to_path_buf(),
            source,
        })?;

        Ok(true)
    }
}

impl Renderer for FileRenderer {
    fn render(&self, output: &OutputConfig, snapshot: &Snapshot) -> Result<bool> {
        let source =
            std::fs::read_to_string(&output.template).map_err(|source| Error::TemplateRead {
                path: output.template.clone(),
                source,
            })?;
        let containers = filter_containers(snapshot, output);
        let mut text = render_template(&source, &containers).map_err(|source| Error::Template {
            path: output.template.clone(),
            source,
        })?;
        if !output.keep_blank_lines {
            text = remove_blank_lines(&text);
        }

        match &output.dest {
            Some(dest) => self.write_if_changed(dest, &text),
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(text.as_bytes())
                    .and_then(|()| stdout.flush())
                    .map_err(|source| Error::Write {
                        path: PathBuf::from("-"),
                        source,
                    })?;
                Ok(true)
            }
        }
    }
}

fn render_template(
    source: &str,
    containers: &[&RuntimeContainer],
) -> std::result::Result<String, minijinja::Error> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let mut jinja = minijinja::Environment::new();
    jinja.set_keep_trailing_newline(true);
    jinja.render_str(
        source,
        minijinja::context! {
            containers => containers,
            env => env,
        },
    )
}
