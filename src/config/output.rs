use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::Signal;

/// One configured artifact: a template rendered into a destination file.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub template: PathBuf,
    /// Rendered text goes to stdout when unset.
    pub dest: Option<PathBuf>,
    pub watch: bool,
    pub notify_cmd: String,
    pub notify_containers: BTreeMap<String, Signal>,
    pub only_exposed: bool,
    pub only_published: bool,
    /// Refresh period in seconds, `0` disables periodic regeneration.
    pub interval: u64,
    pub keep_blank_lines: bool,
}

impl OutputConfig {
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        (self.interval > 0).then(|| Duration::from_secs(self.interval))
    }

    /// Human readable name of the destination for log lines.
    pub fn dest_display(&self) -> String {
        match &self.dest {
            Some(dest) => dest.display().to_string(),
            None => "stdout".to_owned(),
        }
    }
}
