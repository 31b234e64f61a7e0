#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use csv_scrub::{
    CleanConfig, CleanResult, ConfigFile, clean, events::Transcript, source::SliceSource,
};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read temp file")
    }
}

/// Outcome of an in-memory cleaning run.
pub struct Cleaned {
    pub chunks: Vec<String>,
    pub result: CleanResult,
    pub transcript: Transcript,
}

impl Cleaned {
    pub fn text(&self) -> String {
        self.chunks.concat()
    }

    /// Output data rows split on commas. Only for fixtures without quoting.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.text()
            .lines()
            .skip(1)
            .map(|line| line.split(',').map(str::to_string).collect())
            .collect()
    }
}

pub fn clean_str(input: &str, file: ConfigFile) -> Cleaned {
    let config = CleanConfig::try_from(file).expect("valid config");
    let mut chunks: Vec<String> = Vec::new();
    let mut transcript = Transcript::new();
    let result = clean(
        SliceSource::new(input.as_bytes()),
        &config,
        &mut chunks,
        &mut transcript,
    )
    .expect("clean run");
    Cleaned {
        chunks,
        result,
        transcript,
    }
}
