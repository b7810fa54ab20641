//! Configuration for citeguard paths and thresholds.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CITEGUARD_ROOT, CITEGUARD_KB, LANGSMITH_*)
//! 2. Config file (.citeguard/config.yaml)
//! 3. Defaults (current directory as project root)
//!
//! Config file discovery:
//! - Searches current directory and parents for .citeguard/config.yaml
//! - Paths in config file are relative to the project root (parent of .citeguard/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::matching::{DEFAULT_ANSWER_THRESHOLD, DEFAULT_QUESTION_THRESHOLD};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_LANGSMITH_ENDPOINT: &str = "https://api.smith.langchain.com";
const DEFAULT_DATASET_NAME: &str = "rag-eval-dataset";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub validation: Option<ValidationConfig>,
    #[serde(default)]
    pub langsmith: Option<LangSmithConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Project root (relative to the directory holding .citeguard/)
    pub root: Option<String>,
    /// Knowledge-base directory (relative to root)
    pub kb: Option<String>,
    /// Generator output (relative to root)
    pub output: Option<String>,
    /// Review file (relative to root)
    pub review: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    pub question_threshold: Option<f64>,
    pub answer_threshold: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LangSmithConfig {
    pub endpoint: Option<String>,
    pub dataset_name: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Project root
    pub root: PathBuf,
    /// Knowledge-base directory
    pub kb_dir: PathBuf,
    /// Generator output used to seed the review file
    pub output_jsonl: PathBuf,
    /// Review file
    pub review_jsonl: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Validation thresholds
    pub thresholds: Thresholds,
    /// Dataset upload settings
    pub langsmith: LangSmithSettings,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub question: f64,
    pub answer: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            question: DEFAULT_QUESTION_THRESHOLD,
            answer: DEFAULT_ANSWER_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LangSmithSettings {
    pub endpoint: String,
    /// Only ever read from the environment
    pub api_key: Option<String>,
    pub default_dataset: String,
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".citeguard").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base` or start with `~/`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Resolve configuration from an optional config file and an env lookup
fn resolve_config<F>(cwd: &Path, config_file: Option<PathBuf>, env: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let parsed = match &config_file {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };
    let paths = parsed.as_ref().map(|c| c.paths.clone()).unwrap_or_default();

    // Project base is the parent of .citeguard/, or the working directory
    let base_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap_or(cwd);

    let root = match env("CITEGUARD_ROOT") {
        Some(root) => resolve_path(cwd, &root),
        None => match &paths.root {
            Some(root) => resolve_path(base_dir, root),
            None => base_dir.to_path_buf(),
        },
    };

    let kb_dir = match env("CITEGUARD_KB") {
        Some(kb) => resolve_path(cwd, &kb),
        None => resolve_path(&root, paths.kb.as_deref().unwrap_or("kb")),
    };
    let output_jsonl = resolve_path(&root, paths.output.as_deref().unwrap_or("output.jsonl"));
    let review_jsonl = resolve_path(&root, paths.review.as_deref().unwrap_or("review.jsonl"));

    let validation = parsed.as_ref().and_then(|c| c.validation.as_ref());
    let thresholds = Thresholds {
        question: validation
            .and_then(|v| v.question_threshold)
            .unwrap_or(DEFAULT_QUESTION_THRESHOLD),
        answer: validation
            .and_then(|v| v.answer_threshold)
            .unwrap_or(DEFAULT_ANSWER_THRESHOLD),
    };

    let langsmith = parsed.as_ref().and_then(|c| c.langsmith.as_ref());
    let langsmith = LangSmithSettings {
        endpoint: env("LANGSMITH_ENDPOINT")
            .or_else(|| langsmith.and_then(|l| l.endpoint.clone()))
            .unwrap_or_else(|| DEFAULT_LANGSMITH_ENDPOINT.to_string()),
        api_key: env("LANGSMITH_API_KEY").filter(|k| !k.is_empty()),
        default_dataset: env("LANGSMITH_DATASET_NAME")
            .or_else(|| langsmith.and_then(|l| l.dataset_name.clone()))
            .unwrap_or_else(|| DEFAULT_DATASET_NAME.to_string()),
    };

    Ok(ResolvedConfig {
        root,
        kb_dir,
        output_jsonl,
        review_jsonl,
        config_file,
        thresholds,
        langsmith,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config_file = find_config_file(&cwd);
    resolve_config(&cwd, config_file, |key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let cwd = PathBuf::from("/work/project");
        let config = resolve_config(&cwd, None, no_env).unwrap();

        assert_eq!(config.root, cwd);
        assert_eq!(config.kb_dir, cwd.join("kb"));
        assert_eq!(config.review_jsonl, cwd.join("review.jsonl"));
        assert_eq!(config.output_jsonl, cwd.join("output.jsonl"));
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.langsmith.endpoint, DEFAULT_LANGSMITH_ENDPOINT);
        assert!(config.langsmith.api_key.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".citeguard");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  kb: ./knowledge
  review: data/review.jsonl
validation:
  question_threshold: 0.9
langsmith:
  dataset_name: support-faq
"#
        )
        .unwrap();

        let config = resolve_config(temp.path(), Some(config_path.clone()), no_env).unwrap();

        assert_eq!(config.root, temp.path());
        assert_eq!(config.kb_dir, temp.path().join("./knowledge"));
        assert_eq!(config.review_jsonl, temp.path().join("data/review.jsonl"));
        assert_eq!(config.thresholds.question, 0.9);
        assert_eq!(config.thresholds.answer, DEFAULT_ANSWER_THRESHOLD);
        assert_eq!(config.langsmith.default_dataset, "support-faq");
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("CITEGUARD_KB", "/srv/kb"),
            ("LANGSMITH_API_KEY", "secret"),
            ("LANGSMITH_ENDPOINT", "https://eu.api.smith.langchain.com"),
        ]
        .into_iter()
        .collect();

        let config = resolve_config(Path::new("/work"), None, |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.kb_dir, PathBuf::from("/srv/kb"));
        assert_eq!(config.langsmith.api_key.as_deref(), Some("secret"));
        assert_eq!(config.langsmith.endpoint, "https://eu.api.smith.langchain.com");
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".citeguard");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), "version: \"1.0\"\n").unwrap();

        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config_file(&nested), Some(dir.join("config.yaml")));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
