//! Testing utilities for the QA agent workspace
//!
//! Shared fixtures: a scripted build triad, a temporary legacy C++
//! repository, and result constructors.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use qa_core::{Phase, RunResult};
use qa_exec::BuildTriad;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn ok_result(phase: Phase) -> RunResult {
    RunResult::from_exit(phase, 0, format!("{phase} ok"), "")
}

pub fn failed_result(phase: Phase, stdout: &str, stderr: &str) -> RunResult {
    RunResult::from_exit(phase, 1, stdout, stderr)
}

/// A failing CTest run whose summary lists `names`
pub fn ctest_failure(names: &[&str]) -> RunResult {
    let mut stdout = String::from("The following tests FAILED:\n");
    for (i, name) in names.iter().enumerate() {
        stdout.push_str(&format!("\t{:>3} - {name} (Failed)\n", i + 1));
    }
    RunResult::from_exit(Phase::Test, 8, stdout, "Errors while running CTest\n")
}

/// In-memory [`BuildTriad`] replaying scripted results.
///
/// Each phase pops its queue; an empty queue yields a passing result.
/// Every call and every test exclusion list is recorded.
#[derive(Debug, Default)]
pub struct ScriptedTriad {
    configure: Mutex<VecDeque<RunResult>>,
    build: Mutex<VecDeque<RunResult>>,
    test: Mutex<VecDeque<RunResult>>,
    calls: Mutex<Vec<Phase>>,
    excludes: Mutex<Vec<Vec<String>>>,
}

impl ScriptedTriad {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_configure(self, result: RunResult) -> Self {
        self.configure.lock().push_back(result);
        self
    }

    #[must_use]
    pub fn with_build(self, result: RunResult) -> Self {
        self.build.lock().push_back(result);
        self
    }

    #[must_use]
    pub fn with_test(self, result: RunResult) -> Self {
        self.test.lock().push_back(result);
        self
    }

    /// Phases invoked so far, in order
    pub fn calls(&self) -> Vec<Phase> {
        self.calls.lock().clone()
    }

    /// Exclusion list passed to each test invocation, in order
    pub fn test_excludes(&self) -> Vec<Vec<String>> {
        self.excludes.lock().clone()
    }

    fn next(&self, phase: Phase, queue: &Mutex<VecDeque<RunResult>>) -> RunResult {
        self.calls.lock().push(phase);
        queue.lock().pop_front().unwrap_or_else(|| ok_result(phase))
    }
}

#[async_trait]
impl BuildTriad for ScriptedTriad {
    async fn configure(&self) -> RunResult {
        self.next(Phase::Configure, &self.configure)
    }

    async fn build(&self) -> RunResult {
        self.next(Phase::Build, &self.build)
    }

    async fn test(&self, exclude: &[String]) -> RunResult {
        self.excludes.lock().push(exclude.to_vec());
        self.next(Phase::Test, &self.test)
    }
}

pub const SAMPLE_HEADER: &str = r"#pragma once

#include <cstddef>

namespace legacy_sample {

// Copies src into dst.
// Contract:
// - If dst is null or dst_size == 0, returns 0 and does nothing.
// - Always null-terminates when dst_size > 0.
std::size_t copy_cstr(char* dst, std::size_t dst_size, const char* src);

// Contract:
// - If b == 0, returns 0 (legacy behavior; not throwing).
int safe_div(int a, int b);

int classify(int v);

}  // namespace legacy_sample
";

/// Branch keywords in [`sample_source`]
pub const SAMPLE_BRANCH_COUNT: usize = 25;

/// Legacy implementation with a raw copy and exactly
/// [`SAMPLE_BRANCH_COUNT`] branch keywords
pub fn sample_source() -> String {
    let mut text = String::from(
        r#"#include "legacy_sample.h"

#include <cstring>

namespace legacy_sample {

std::size_t copy_cstr(char* dst, std::size_t dst_size, const char* src) {
  if (dst == nullptr || dst_size == 0) return 0;
  if (src == nullptr) { dst[0] = '\0'; return 0; }
  std::size_t n = std::strlen(src);
  if (n >= dst_size) n = dst_size - 1;
  std::strncpy(dst, src, n);
  dst[n] = '\0';
  return n;
}

int safe_div(int a, int b) {
  if (b == 0) return 0;
  return a / b;
}

int classify(int v) {
  switch (v) {
"#,
    );
    for i in 0..20 {
        text.push_str(&format!("    case {i}: return {};\n", i % 3));
    }
    text.push_str("  }\n  return -1;\n}\n\n}  // namespace legacy_sample\n");
    text
}

const SAMPLE_CMAKE: &str = "cmake_minimum_required(VERSION 3.16)
project(legacy_sample CXX)
add_library(legacy_sample src/legacy_sample.cpp)
target_include_directories(legacy_sample PUBLIC include .)
";

/// Temporary repository holding the legacy sample library.
///
/// Layout: `CMakeLists.txt`, `include/legacy_sample.h`,
/// `src/legacy_sample.cpp`.
pub struct SampleRepo {
    dir: TempDir,
}

impl SampleRepo {
    pub fn new() -> Self {
        let repo = Self::empty();
        repo.write("CMakeLists.txt", SAMPLE_CMAKE);
        repo.write("include/legacy_sample.h", SAMPLE_HEADER);
        repo.write("src/legacy_sample.cpp", &sample_source());
        repo
    }

    /// Repository with no files
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `text` at `rel`, creating parent directories
    pub fn write(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.join(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.join(rel).exists()
    }
}

impl Default for SampleRepo {
    fn default() -> Self {
        Self::new()
    }
}
