use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Use `dir` when given, otherwise a fresh scratch directory that the engine
/// fills with default config files. The flag tells the caller to clean up.
pub fn config_dir_or_temp(dir: Option<&Path>) -> Result<(PathBuf, bool)> {
    if let Some(dir) = dir {
        return Ok((dir.to_path_buf(), false));
    }
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let scratch = std::env::temp_dir().join(format!("parched-tester-{nanos}"));
    fs::create_dir_all(&scratch)
        .with_context(|| format!("creating scratch config dir {}", scratch.display()))?;
    Ok((scratch, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn explicit_config_dir_is_kept() {
        let (dir, scratch) = config_dir_or_temp(Some(Path::new("target/cfg"))).unwrap();
        assert_eq!(dir, PathBuf::from("target/cfg"));
        assert!(!scratch);

        let (dir, scratch) = config_dir_or_temp(None).unwrap();
        assert!(scratch);
        assert!(dir.exists());
        fs::remove_dir_all(dir).ok();
    }
}
