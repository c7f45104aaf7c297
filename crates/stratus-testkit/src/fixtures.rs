//! Local fixture files consumed by tests: read-only inputs under
//! `testdata/` and scratch targets for artifacts the service exports.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

#[derive(Debug)]
pub struct Fixtures {
    /// Sample state blob uploaded when creating state versions.
    pub state_path: PathBuf,
    /// Configuration bundle uploaded to configuration versions.
    pub config_tarball_path: PathBuf,
    /// Same configuration as an inline string payload.
    pub config_string: String,
    /// Module bundle published to the private registry.
    pub module_tarball_path: PathBuf,
    /// Policy bundle uploaded to policy sets.
    pub policy_set_tarball_path: PathBuf,
    /// Scratch targets for exported artifacts.
    pub plan_export_path: PathBuf,
    pub plan_json_export_path: PathBuf,
    pub module_version_export_path: PathBuf,
    pub module_latest_export_path: PathBuf,
    scratch: TempDir,
}

impl Fixtures {
    /// Loads fixtures from the crate's own `testdata/` directory.
    pub fn load() -> io::Result<Self> {
        Self::load_from(Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata"))
    }

    pub fn load_from(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        let config_string = fs::read_to_string(root.join("config/sample-main.cfg"))?;
        let scratch = TempDir::new()?;
        let scratch_path = scratch.path().to_path_buf();

        Ok(Fixtures {
            state_path: root.join("state/sample-state.json"),
            config_tarball_path: root.join("config/sample-config.tar.gz"),
            config_string,
            module_tarball_path: root.join("modules/sample-module.tar.gz"),
            policy_set_tarball_path: root.join("policy-sets/sample-policy-set.tar.gz"),
            plan_export_path: scratch_path.join("plan-export.tar.gz"),
            plan_json_export_path: scratch_path.join("plan.json"),
            module_version_export_path: scratch_path.join("module-version-export.tar.gz"),
            module_latest_export_path: scratch_path.join("module-latest-export.tar.gz"),
            scratch,
        })
    }

    /// Directory holding the scratch targets; removed when the fixtures are
    /// dropped.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn read_state(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.state_path)
    }
}
