use std::path::PathBuf;

use super::buddyinfo::BuddyInfoFormat;
use super::composite::{FailurePolicy, LoggerKind};

/// Configuration for a composite logging session.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Directory for session files. Created on open if missing.
    pub output_dir: PathBuf,
    /// Optional label included in every file name.
    pub label: Option<String>,
    /// Base path of the proc filesystem. Default: `/proc`.
    pub proc_path: String,
    /// Record written by the buddyinfo logger. Default: full snapshot.
    pub buddyinfo_format: BuddyInfoFormat,
    /// What the composite does when a sub-logger fails. Default: propagate.
    pub failure_policy: FailurePolicy,
    /// Sub-loggers to run, in order. Default: all kinds.
    ///
    /// Each kind runs at most once; repeats would share one output file.
    pub kinds: Vec<LoggerKind>,
}

impl LoggerConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            label: None,
            proc_path: "/proc".to_string(),
            buddyinfo_format: BuddyInfoFormat::default(),
            failure_policy: FailurePolicy::default(),
            kinds: LoggerKind::ALL.to_vec(),
        }
    }

    pub fn with_label(mut self, label: Option<impl Into<String>>) -> Self {
        self.label = label.map(Into::into);
        self
    }

    pub fn with_proc_path(mut self, proc_path: impl Into<String>) -> Self {
        self.proc_path = proc_path.into();
        self
    }

    pub fn with_buddyinfo_format(mut self, format: BuddyInfoFormat) -> Self {
        self.buddyinfo_format = format;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the sub-loggers to run. Repeated kinds are dropped, first one wins.
    pub fn with_kinds(mut self, kinds: Vec<LoggerKind>) -> Self {
        self.kinds = kinds;
        self.kinds = self.unique_kinds();
        self
    }

    /// `kinds` without repeats, in first-seen order.
    pub fn unique_kinds(&self) -> Vec<LoggerKind> {
        let mut unique = Vec::with_capacity(self.kinds.len());
        for kind in &self.kinds {
            if !unique.contains(kind) {
                unique.push(*kind);
            }
        }
        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_config_defaults() {
        let config = LoggerConfig::new("/tmp/out");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.label, None);
        assert_eq!(config.proc_path, "/proc");
        assert_eq!(config.buddyinfo_format, BuddyInfoFormat::Snapshot);
        assert_eq!(config.failure_policy, FailurePolicy::Propagate);
        assert_eq!(
            config.kinds,
            vec![LoggerKind::BuddyInfo, LoggerKind::ProcessMemory]
        );
    }

    #[test]
    fn test_logger_config_builders() {
        let config = LoggerConfig::new("out")
            .with_label(Some("run"))
            .with_proc_path("/host/proc")
            .with_buddyinfo_format(BuddyInfoFormat::Measurements)
            .with_failure_policy(FailurePolicy::Isolate)
            .with_kinds(vec![LoggerKind::ProcessMemory]);

        assert_eq!(config.label.as_deref(), Some("run"));
        assert_eq!(config.proc_path, "/host/proc");
        assert_eq!(config.buddyinfo_format, BuddyInfoFormat::Measurements);
        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
        assert_eq!(config.kinds, vec![LoggerKind::ProcessMemory]);
    }

    #[test]
    fn test_with_kinds_drops_repeats() {
        let config = LoggerConfig::new("out").with_kinds(vec![
            LoggerKind::ProcessMemory,
            LoggerKind::BuddyInfo,
            LoggerKind::ProcessMemory,
            LoggerKind::BuddyInfo,
        ]);
        assert_eq!(
            config.kinds,
            vec![LoggerKind::ProcessMemory, LoggerKind::BuddyInfo]
        );
    }

    #[test]
    fn test_unique_kinds_ignores_repeats_set_directly() {
        let mut config = LoggerConfig::new("out");
        config.kinds = vec![LoggerKind::BuddyInfo, LoggerKind::BuddyInfo];
        assert_eq!(config.unique_kinds(), vec![LoggerKind::BuddyInfo]);
    }
}
