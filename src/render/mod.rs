//! Turning a snapshot into output files.
mod blank;
mod error;
mod file;

pub use blank::{is_blank, remove_blank_lines};
pub use error::{Error, Result};
pub use file::FileRenderer;

use crate::config::OutputConfig;
use crate::container::{RuntimeContainer, Snapshot};

/// Renders one output from a snapshot.
///
/// Returns whether the destination content changed. Implementations are called from blocking
/// threads and may be invoked concurrently for the same output.
pub trait Renderer: Send + Sync + 'static {
    fn render(&self, output: &OutputConfig, snapshot: &Snapshot) -> Result<bool>;
}

/// Applies the `only_exposed`/`only_published` filters of an output.
pub fn filter_containers<'a>(
    snapshot: &'a Snapshot,
    output: &OutputConfig,
) -> Vec<&'a RuntimeContainer> {
    snapshot
        .iter()
        .filter(|c| !output.only_exposed || !c.addresses.is_empty())
        .filter(|c| !output.only_published || c.published_addresses().next().is_some())
        .collect()
}
