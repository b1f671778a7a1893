use anyhow::Context;
use phasecore::prelude::{FieldConfig, SolveConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_max_seed_points() -> usize {
    10
}

/// Startup configuration: sampling domain, solver span, and the seed-buffer
/// capacity. Loaded from an optional YAML file; omitted sections keep their
/// built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub solve: SolveConfig,
    #[serde(default = "default_max_seed_points")]
    pub max_seed_points: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            solve: SolveConfig::default(),
            max_seed_points: default_max_seed_points(),
        }
    }
}

impl ExplorerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading explorer config {}", path_ref.display()))?;
        let config: ExplorerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing explorer config {}", path_ref.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_the_interactive_tool() {
        let config = ExplorerConfig::default();
        assert_eq!(config.field.xmin, 0.0);
        assert_eq!(config.field.xmax, 5.0);
        assert_eq!(config.field.steps, 20);
        assert_eq!(config.solve.t_end, 10.0);
        assert_eq!(config.solve.first_step, 0.1);
        assert_eq!(config.max_seed_points, 10);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"field:\n  xmin: 0.0\n  xmax: 8.0\n  ymin: 0.0\n  ymax: 4.0\n  steps: 12\nsolve:\n  t_end: 6.0\n  first_step: 0.05\nmax_seed_points: 5\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let config = ExplorerConfig::load(&path).unwrap();
        assert_eq!(config.field.xmax, 8.0);
        assert_eq!(config.field.steps, 12);
        assert_eq!(config.solve.t_end, 6.0);
        assert_eq!(config.max_seed_points, 5);
    }

    #[test]
    fn omitted_sections_fall_back_to_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"max_seed_points: 3\n").unwrap();
        let path = temp.into_temp_path();
        let config = ExplorerConfig::load(&path).unwrap();
        assert_eq!(config.max_seed_points, 3);
        assert_eq!(config.field.steps, 20);
        assert_eq!(config.solve.t_end, 10.0);
    }
}
