use std::path::{Path, PathBuf};

/// Where custom numeration systems are looked up.
///
/// A system `msd_x` may be described by the files `msd_x.txt` (its valid
/// representations), `msd_x_addition.txt` and `msd_x_less_than.txt`, or by
/// the same files of `lsd_x`, which are then reversed.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub custom_bases: Option<PathBuf>,
}

impl Config {
    pub fn with_custom_bases<P: Into<PathBuf>>(dir: P) -> Self {
        Config {
            custom_bases: Some(dir.into()),
        }
    }

    /// The path of `file_name` in the custom bases directory, if it exists.
    pub fn custom_base_file(&self, file_name: &str) -> Option<PathBuf> {
        let path = self.custom_bases.as_deref().map(|dir: &Path| dir.join(file_name))?;
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_base_file() {
        assert_eq!(Config::default().custom_base_file("msd_2.txt"), None);
        let dir = std::env::temp_dir().join("numaut-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("msd_x.txt"), "true\n").unwrap();
        let config = Config::with_custom_bases(&dir);
        assert_eq!(config.custom_base_file("msd_x.txt"), Some(dir.join("msd_x.txt")));
        assert_eq!(config.custom_base_file("msd_y.txt"), None);
    }
}
