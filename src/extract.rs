//! Glue around the external structure-extraction tool: builds its command
//! line from a project context, runs it and loads the result blob.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{DecodeError, ParseOutcome, parse_layout};

pub const RESULT_FILE_NAME: &str = "tempResult.slbin";

static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<file>.+):(?P<line>\d+):(?P<col>\d+)$").unwrap());

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unable to scan the given location (exit code {code:?})")]
    ExtractionFailed { code: Option<i32>, log: String },
    #[error("invalid project context: {0}")]
    InvalidContext(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    X86,
    #[default]
    X64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageStandard {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "c++98")]
    Cpp98,
    #[serde(rename = "c++03")]
    Cpp03,
    #[serde(rename = "c++14")]
    Cpp14,
    #[serde(rename = "c++17")]
    Cpp17,
    #[serde(rename = "c++20")]
    Cpp20,
    #[serde(rename = "gnu++98")]
    Gnu98,
    #[serde(rename = "gnu++03")]
    Gnu03,
    #[serde(rename = "gnu++14")]
    Gnu14,
    #[serde(rename = "gnu++17")]
    Gnu17,
    #[serde(rename = "gnu++20")]
    Gnu20,
    #[serde(rename = "latest")]
    Latest,
}

impl LanguageStandard {
    pub fn flag(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Cpp98 => Some("-std=c++98"),
            Self::Cpp03 => Some("-std=c++03"),
            Self::Cpp14 => Some("-std=c++14"),
            Self::Cpp17 => Some("-std=c++17"),
            Self::Cpp20 => Some("-std=c++20"),
            Self::Gnu98 => Some("-std=gnu++98"),
            Self::Gnu03 => Some("-std=gnu++03"),
            Self::Gnu14 => Some("-std=gnu++14"),
            Self::Gnu17 => Some("-std=gnu++17"),
            Self::Gnu20 => Some("-std=gnu++20"),
            Self::Latest => Some("-std=c++2a"),
        }
    }
}

/// Compiler settings for the translation unit being queried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectContext {
    pub include_dirs: Vec<String>,
    pub force_includes: Vec<String>,
    pub defines: Vec<String>,
    pub target: Target,
    pub standard: LanguageStandard,
    pub working_directory: Option<String>,
    pub extra_args: Vec<String>,
    pub show_warnings: bool,
}

impl ProjectContext {
    pub fn load(path: &Path) -> Result<Self, QueryError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| QueryError::InvalidContext(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| QueryError::InvalidContext(format!("{}: {e}", path.display())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl QueryLocation {
    /// Parses `FILE:LINE:COL`; the file part may itself contain colons.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = LOCATION_RE.captures(input.trim())?;
        Some(Self {
            file: PathBuf::from(&caps["file"]),
            line: caps["line"].parse().ok()?,
            column: caps["col"].parse().ok()?,
        })
    }
}

impl std::fmt::Display for QueryLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Arguments for the extraction tool, query part first, then the compiler
/// flags after `--`.
pub fn build_arguments(
    location: &QueryLocation,
    output: &Path,
    ctx: &ProjectContext,
) -> Vec<String> {
    let mut args = vec![
        location.file.display().to_string(),
        format!("-r={}", location.line),
        format!("-c={}", location.column),
        format!("-o={}", output.display()),
        "--".to_string(),
    ];

    let is_c_source = location
        .file
        .extension()
        .is_some_and(|ext| ext == "c");
    if !is_c_source {
        args.push("-x".to_string());
        args.push("c++".to_string());
    }
    args.push(
        match ctx.target {
            Target::X86 => "-m32",
            Target::X64 => "-m64",
        }
        .to_string(),
    );
    if let Some(flag) = ctx.standard.flag() {
        args.push(flag.to_string());
    }
    if !ctx.show_warnings {
        args.push("-w".to_string());
    }
    args.extend(ctx.defines.iter().map(|d| format!("-D{d}")));
    args.extend(ctx.include_dirs.iter().map(|i| format!("-I{i}")));
    for include in &ctx.force_includes {
        args.push("-include".to_string());
        args.push(include.clone());
    }
    if let Some(dir) = ctx.working_directory.as_deref().filter(|d| !d.is_empty()) {
        args.push(format!("-working-directory={dir}"));
    }
    args.extend(ctx.extra_args.iter().cloned());
    args
}

/// Removes the result of an earlier query. A missing file is fine; any
/// other failure would leave that result to be loaded again.
fn clear_stale_result(path: &Path) -> Result<(), QueryError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(QueryError::InvalidContext(format!(
            "unable to remove stale result '{}': {e}",
            path.display()
        ))),
    }
}

/// Runs `tool` for `location` and loads what it wrote into `output_dir`.
pub fn run_query(
    tool: &Path,
    location: &QueryLocation,
    ctx: &ProjectContext,
    output_dir: &Path,
) -> Result<ParseOutcome, QueryError> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        QueryError::InvalidContext(format!(
            "unable to create directory '{}': {e}",
            output_dir.display()
        ))
    })?;
    let output = output_dir.join(RESULT_FILE_NAME);
    clear_stale_result(&output)?;

    let args = build_arguments(location, &output, ctx);
    info!("Looking for structures at {location}...");
    log::debug!("tool arguments: {}", args.join(" "));

    let watch = Instant::now();
    let result = Command::new(tool)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| QueryError::ExtractionFailed {
            code: None,
            log: format!("failed to run `{}`: {e}", tool.display()),
        })?;
    let elapsed = format_duration(watch.elapsed());

    let mut log = String::from_utf8_lossy(&result.stdout).to_string();
    log.push_str(&String::from_utf8_lossy(&result.stderr));

    if !result.status.success() {
        error!("Unable to scan the given location. ({elapsed})");
        return Err(QueryError::ExtractionFailed {
            code: result.status.code(),
            log,
        });
    }
    info!("File parsing completed! ({elapsed})");

    if !output.exists() {
        return Err(QueryError::ExtractionFailed {
            code: result.status.code(),
            log: format!("{log}no result written to {}", output.display()),
        });
    }
    load_parse_result(&output)
}

/// Loads a result blob; a missing file means nothing was found.
pub fn load_parse_result(path: &Path) -> Result<ParseOutcome, QueryError> {
    if !path.exists() {
        info!("No structure found at the given location.");
        return Ok(ParseOutcome::NotFound);
    }
    let bytes = std::fs::read(path)?;
    Ok(parse_layout(&bytes)?)
}

/// Compact elapsed-time text, keeping only the two most significant units.
pub fn format_duration(duration: Duration) -> String {
    let total_us = duration.as_micros();
    let us = total_us % 1000;
    let total_ms = total_us / 1000;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let sec = total_sec % 60;
    let total_min = total_sec / 60;
    let min = total_min % 60;
    let hour = total_min / 60;

    if hour > 0 {
        format!("{hour} h {min} m")
    } else if min > 0 {
        format!("{min} m {sec} s")
    } else if sec > 0 {
        format!("{sec}.{ms:04} s")
    } else if ms > 0 {
        format!("{ms}.{us:04} ms")
    } else if us > 0 {
        format!("{us} μs")
    } else {
        "< 1 μs".to_string()
    }
}
