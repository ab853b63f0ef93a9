//! @ai:module:intent Input formats, pattern expansion into files, and formula-statistics sidecars
//! @ai:module:layer domain
//! @ai:module:public_api Format, InputLoader
//! @ai:module:stateless true

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Logical format of an input formula file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Tptp,
    Ladr,
    Inkresat,
}

impl Format {
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Tptp => "tptp",
            Format::Ladr => "ladr",
            Format::Inkresat => "inkresat",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Expands test-input patterns into concrete files
pub struct InputLoader;

impl InputLoader {
    /// @ai:intent Files matched by one glob pattern or directory, relative to `base`
    /// @ai:effects fs:read
    pub fn expand_pattern(
        pattern: &str,
        base: &Path,
        field: &str,
    ) -> Result<Vec<PathBuf>, ConfigError> {
        let joined = base.join(pattern);

        if joined.is_dir() {
            return Ok(Self::walk_directory(&joined));
        }

        let pattern_str = joined.to_string_lossy();
        let paths = glob::glob(&pattern_str).map_err(|e| ConfigError::InvalidPattern {
            field: field.to_string(),
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let mut files: Vec<PathBuf> = paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Skipping unreadable path while expanding '{}': {}", pattern, e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    /// @ai:intent Union of all patterns, sorted and deduplicated
    /// @ai:post every pattern matched at least one file
    /// @ai:effects fs:read
    pub fn expand_all(
        patterns: &[String],
        base: &Path,
        field: &str,
    ) -> Result<Vec<PathBuf>, Vec<ConfigError>> {
        let mut files = Vec::new();
        let mut errors = Vec::new();

        for pattern in patterns {
            match Self::expand_pattern(pattern, base, field) {
                Ok(matched) if matched.is_empty() => {
                    errors.push(ConfigError::PatternMatchedNothing {
                        field: field.to_string(),
                        pattern: pattern.clone(),
                    });
                }
                Ok(matched) => files.extend(matched),
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// @ai:intent Read the `<file>.json` statistics sidecar, if any
    /// @ai:effects fs:read
    pub fn load_formula_statistics(path: &Path) -> Option<serde_json::Value> {
        let sidecar = Self::sidecar_path(path);
        let content = match std::fs::read_to_string(&sidecar) {
            Ok(content) => content,
            Err(_) => {
                tracing::debug!("No formula statistics for {}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid statistics file {}: {}", sidecar.display(), e);
                None
            }
        }
    }

    fn sidecar_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    }

    /// Sidecar `.json` files are not inputs.
    fn walk_directory(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext != "json")
                    .unwrap_or(true)
            })
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_inputs(dir: &Path) {
        std::fs::create_dir_all(dir.join("tptp/nested")).unwrap();
        std::fs::write(dir.join("tptp/b.p"), "fof(b, axiom, q).").unwrap();
        std::fs::write(dir.join("tptp/a.p"), "fof(a, axiom, p).").unwrap();
        std::fs::write(dir.join("tptp/nested/c.p"), "fof(c, axiom, r).").unwrap();
        std::fs::write(dir.join("tptp/a.p.json"), r#"{"atoms": 1, "depth": 0}"#).unwrap();
    }

    #[test]
    fn test_glob_pattern_is_relative_to_base() {
        let dir = TempDir::new().unwrap();
        create_inputs(dir.path());

        let files = InputLoader::expand_pattern("tptp/*.p", dir.path(), "t").unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("tptp/a.p"), dir.path().join("tptp/b.p")]
        );
    }

    #[test]
    fn test_directory_is_walked_recursively_without_sidecars() {
        let dir = TempDir::new().unwrap();
        create_inputs(dir.path());

        let files = InputLoader::expand_pattern("tptp", dir.path(), "t").unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.extension().unwrap() == "p"));
    }

    #[test]
    fn test_expand_all_deduplicates_and_reports_empty_patterns() {
        let dir = TempDir::new().unwrap();
        create_inputs(dir.path());

        let patterns = vec!["tptp/*.p".to_string(), "tptp/a.p".to_string()];
        let files = InputLoader::expand_all(&patterns, dir.path(), "t").unwrap();
        assert_eq!(files.len(), 2);

        let patterns = vec!["tptp/*.p".to_string(), "missing/*.p".to_string()];
        let errors = InputLoader::expand_all(&patterns, dir.path(), "t").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::PatternMatchedNothing { .. }));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let dir = TempDir::new().unwrap();
        let result = InputLoader::expand_pattern("[", dir.path(), "t");
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_formula_statistics_sidecar() {
        let dir = TempDir::new().unwrap();
        create_inputs(dir.path());

        let stats = InputLoader::load_formula_statistics(&dir.path().join("tptp/a.p")).unwrap();
        assert_eq!(stats["atoms"], 1);
        assert!(InputLoader::load_formula_statistics(&dir.path().join("tptp/b.p")).is_none());
    }

    #[test]
    fn test_format_parses_lowercase() {
        let format: Format = serde_json::from_str("\"ladr\"").unwrap();
        assert_eq!(format, Format::Ladr);
        assert!(serde_json::from_str::<Format>("\"otter\"").is_err());
    }
}
