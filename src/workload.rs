//! Launch of the protected workload: a jar served out of the shared folder.

use std::fs;
use std::path::{Path, PathBuf};

use tokio::process::{Child, Command};
use tracing::info;

use crate::{Error, Result};

pub const DEFAULT_JVM_OPTIONS: &str = "-Xmx3G -Xms2G";

#[derive(Debug, Clone)]
pub struct WorkloadSpec {
    folder: PathBuf,
    jar: PathBuf,
    jvm_options: String,
}

impl WorkloadSpec {
    /// Resolve the workload for `folder`, discovering the jar when none is
    /// named explicitly.
    pub fn resolve(folder: PathBuf, jar: Option<PathBuf>, jvm_options: String) -> Result<Self> {
        let jar = match jar {
            Some(jar) => jar,
            None => find_first_jar(&folder)?,
        };
        Ok(Self {
            folder,
            jar,
            jvm_options,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Start `java <jvm-options> -jar <jar>` in the server folder. The child
    /// inherits stdio so the workload's own console stays usable.
    pub fn spawn(&self) -> Result<Child> {
        info!("Launching {:?} in {:?}", self.jar, self.folder);
        let child = Command::new("java")
            .args(self.jvm_options.split_whitespace())
            .arg("-jar")
            .arg(&self.jar)
            .current_dir(&self.folder)
            .spawn()?;
        Ok(child)
    }
}

/// First jar (by name) in the folder.
pub fn find_first_jar(folder: &Path) -> Result<PathBuf> {
    let mut jars: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
        })
        .collect();
    jars.sort();
    jars.into_iter().next().ok_or(Error::NoJar {
        folder: folder.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_first_jar_picks_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("world.dat"), b"").unwrap();
        fs::write(dir.path().join("server-b.jar"), b"").unwrap();
        fs::write(dir.path().join("server-a.JAR"), b"").unwrap();

        let jar = find_first_jar(dir.path()).unwrap();
        assert_eq!(jar.file_name().unwrap(), "server-a.JAR");
    }

    #[test]
    fn test_find_first_jar_fails_on_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_first_jar(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NoJar { .. }));
    }
}
