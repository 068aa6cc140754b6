//! Load generator API paths and test log parsing.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

pub const TEST_FINISHED_SECTION: &str = "Test finished";
const CURRENT_RPS_PREFIX: &str = "Current rps";

pub fn horizontal_test_path(web_service_dns: &str) -> String {
    format!("/test/horizontal?dns={web_service_dns}")
}

pub fn add_web_service_path(web_service_dns: &str) -> String {
    format!("/test/horizontal/add?dns={web_service_dns}")
}

pub fn warmup_path(load_balancer_dns: &str) -> String {
    format!("/warmup?dns={load_balancer_dns}")
}

pub fn autoscaling_test_path(load_balancer_dns: &str) -> String {
    format!("/autoscaling?dns={load_balancer_dns}")
}

pub fn test_log_path(test_id: &str) -> String {
    format!("/log?name=test.{test_id}.log")
}

/// Pulls the numeric test id out of a test start response.
pub fn extract_test_id(response: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"test\.([0-9]*)\.log").expect("static regex"));
    pattern
        .captures(response)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

/// An INI-shaped test log as served by the load generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestLog {
    sections: Vec<LogSection>,
}

impl TestLog {
    pub fn parse(text: &str) -> Self {
        let mut sections: Vec<LogSection> = Vec::new();
        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                sections.push(LogSection {
                    name: name.trim().to_string(),
                    entries: Vec::new(),
                });
                continue;
            }

            let Some(section) = sections.last_mut() else {
                continue;
            };
            if let Some((key, value)) = line.split_once('=') {
                section
                    .entries
                    .push((key.trim().to_string(), value.trim().to_string()));
            }
        }
        Self { sections }
    }

    pub fn sections(&self) -> &[LogSection] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&LogSection> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn is_finished(&self) -> bool {
        self.section(TEST_FINISHED_SECTION).is_some()
    }

    /// RPS from the last `[Current rps=<value>]` header, 0 when none parse.
    pub fn current_rps(&self) -> f64 {
        self.sections
            .iter()
            .filter(|section| section.name.starts_with(CURRENT_RPS_PREFIX))
            .filter_map(|section| section.name.split_once('='))
            .filter_map(|(_, value)| value.trim().parse::<f64>().ok())
            .last()
            .unwrap_or(0.0)
    }
}

/// Keeps a local copy of each fetched test log as `<dir>/<test_id>.log`.
#[derive(Debug, Clone)]
pub struct LogArchive {
    dir: PathBuf,
}

impl LogArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, test_id: &str) -> PathBuf {
        self.dir.join(format!("{test_id}.log"))
    }

    /// Failures are logged; losing the local copy never stops a test.
    pub fn store(&self, test_id: &str, text: &str) {
        let path = self.path_for(test_id);
        if let Err(error) = write_log(&self.dir, &path, text) {
            warn!(
                event = "log_archive_failed",
                path = %path.display(),
                %error,
                "could not archive test log"
            );
        }
    }
}

fn write_log(dir: &Path, path: &Path, text: &str) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(path, text)
}
