use super::annotation::WalkOptions;
use super::emitter::JsonStyle;
use std::path::PathBuf;

/// Settings of one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Source files converted concurrently. Games within a file stay sequential.
    pub jobs: usize,
    pub walk: WalkOptions,
    pub json: JsonStyle,
}

impl Config {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            jobs: 1,
            walk: WalkOptions::default(),
            json: JsonStyle::default(),
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_evaluations(mut self, evaluations: bool) -> Self {
        self.walk.evaluations = evaluations;
        self
    }

    pub fn with_ascii_escape(mut self, ascii_escape: bool) -> Self {
        self.json.ascii_escape = ascii_escape;
        self
    }
}
