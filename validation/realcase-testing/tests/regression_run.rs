//! Regression runs with in-process stand-ins for mamba and the notebook
//! runner.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use realcase_testing::pipeline::{Result, ENVIRONMENT_NAME, SOURCE_SUBFOLDER, TARGET_SUBFOLDER};
use realcase_testing::{
    normalize_version, EnvironmentProvisioner, PipelineError, ReferenceGenerator, RegressionRun,
    RunOptions, SaveDir,
};
use refcheck::{Comparator, MemorySink};
use test_utils::{feature_table, notebooks, single_variable, ReferenceTree};

/// Records calls and remembers the installed version.
#[derive(Default)]
struct FakeProvisioner {
    calls: RefCell<Vec<String>>,
    installed: RefCell<String>,
}

impl EnvironmentProvisioner for FakeProvisioner {
    fn create(&self, env: &Path, version: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("create {} {}", env.file_name().unwrap().to_string_lossy(), version));
        *self.installed.borrow_mut() = normalize_version(version).to_string();
        Ok(())
    }

    fn install(&self, _env: &Path, version: &str) -> Result<()> {
        self.calls.borrow_mut().push(format!("install {}", version));
        *self.installed.borrow_mut() = normalize_version(version).to_string();
        Ok(())
    }
}

/// Writes a feature table whose units depend on the installed version.
struct FakeGenerator<'a> {
    provisioner: &'a FakeProvisioner,
    fail_on: Option<&'static str>,
    subfolders: RefCell<Vec<PathBuf>>,
}

impl ReferenceGenerator for FakeGenerator<'_> {
    fn generate(&self, _env: &Path, notebook: &str, save_dir: &Path, subfolder: &str) -> Result<()> {
        if Some(subfolder) == self.fail_on {
            return Err(PipelineError::Timeout {
                notebook: notebook.to_string(),
                timeout: std::time::Duration::from_secs(600),
            });
        }
        let tree = ReferenceTree::new(save_dir.join(subfolder));
        let units = if self.provisioner.installed.borrow().as_str() == "1.5.1" {
            "K"
        } else {
            "C"
        };
        tree.add(notebooks::OLR_TRACKING, "Features.nc", &feature_table());
        tree.add(notebooks::OLR_TRACKING, "Track.nc", &single_variable(units, vec![1.0, 2.0]));
        self.subfolders.borrow_mut().push(save_dir.join(subfolder));
        Ok(())
    }
}

fn options(save_dir: SaveDir, c1: &str, c2: &str, create_env: bool) -> RunOptions {
    RunOptions {
        notebook: notebooks::OLR_TRACKING.to_string(),
        source_version: c1.to_string(),
        target_version: c2.to_string(),
        save_dir,
        create_env,
    }
}

#[test]
fn test_same_version_gives_no_differences() {
    let dir = tempfile::tempdir().unwrap();
    let provisioner = FakeProvisioner::default();
    let generator = FakeGenerator {
        provisioner: &provisioner,
        fail_on: None,
        subfolders: RefCell::new(Vec::new()),
    };
    let run = RegressionRun::new(&provisioner, &generator, Comparator::default());

    let mut sink = MemorySink::new();
    let summary = run
        .execute(
            &options(SaveDir::Path(dir.path().to_path_buf()), "v1.5.1", "v1.5.1", false),
            &mut sink,
        )
        .unwrap();

    assert_eq!(summary.compared, 2);
    assert!(!summary.has_differences());
    assert_eq!(
        provisioner.calls.borrow().as_slice(),
        ["install v1.5.1".to_string(), "install v1.5.1".to_string()]
    );
    assert_eq!(
        generator.subfolders.borrow().as_slice(),
        [dir.path().join(SOURCE_SUBFOLDER), dir.path().join(TARGET_SUBFOLDER)]
    );
}

#[test]
fn test_version_change_is_localized() {
    let provisioner = FakeProvisioner::default();
    let generator = FakeGenerator {
        provisioner: &provisioner,
        fail_on: None,
        subfolders: RefCell::new(Vec::new()),
    };
    let run = RegressionRun::new(&provisioner, &generator, Comparator::default());

    let mut sink = MemorySink::new();
    let summary = run
        .execute(&options(SaveDir::Temporary, "v1.5.1", "v1.5.2", true), &mut sink)
        .unwrap();

    assert_eq!(summary.different, 1);
    assert!(sink
        .lines()
        .contains(&"Attribute 'units' of variable 'v' differs.".to_string()));
    assert_eq!(
        provisioner.calls.borrow()[0],
        format!("create {} v1.5.1", ENVIRONMENT_NAME)
    );

    // The temporary save directory is gone once the run returns
    assert!(!generator.subfolders.borrow()[0].exists());
}

#[test]
fn test_generation_failure_aborts_before_comparison() {
    let dir = tempfile::tempdir().unwrap();
    let provisioner = FakeProvisioner::default();
    let generator = FakeGenerator {
        provisioner: &provisioner,
        fail_on: Some(TARGET_SUBFOLDER),
        subfolders: RefCell::new(Vec::new()),
    };
    let run = RegressionRun::new(&provisioner, &generator, Comparator::default());

    let mut sink = MemorySink::new();
    let err = run
        .execute(
            &options(SaveDir::Path(dir.path().to_path_buf()), "v1.5.1", "v1.5.2", false),
            &mut sink,
        )
        .unwrap_err();

    assert!(matches!(err, PipelineError::Timeout { ref notebook, .. } if notebook == notebooks::OLR_TRACKING));
    assert!(sink.lines().is_empty());
}
