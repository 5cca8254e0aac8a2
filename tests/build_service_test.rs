//! Tests for BuildService

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use applab::application::services::BuildService;
use applab::application::ApplicationError;
use applab::infrastructure::traits::RealFileSystem;

use common::{test_settings, MockCommandRunner};

fn service(temp: &TempDir, cmd: MockCommandRunner) -> (BuildService, Arc<MockCommandRunner>) {
    let cmd = Arc::new(cmd);
    let settings = Arc::new(test_settings(temp.path()));
    let svc = BuildService::new(Arc::new(RealFileSystem), cmd.clone(), settings);
    (svc, cmd)
}

/// Lay out a vendored utility tree with a fake compiled binary.
fn create_utility_tree(temp: &TempDir) {
    let src = temp.path().join("vendor/dnsmasq/src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("dnsmasq"), "ELF").unwrap();
}

// ============================================================
// build() tests
// ============================================================

#[test]
fn given_stale_state_when_build_then_cleans_and_invokes_packager() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_utility_tree(&temp);
    for dir in ["parts", "stage"] {
        std::fs::create_dir_all(temp.path().join(dir)).unwrap();
    }
    let artifact = temp.path().join("build/appliance.snap");
    std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
    std::fs::write(&artifact, "stale").unwrap();
    let (svc, cmd) = service(&temp, MockCommandRunner::new());

    // Act
    svc.build().unwrap();

    // Assert
    assert!(!temp.path().join("parts").exists());
    assert!(!temp.path().join("stage").exists());
    assert!(!artifact.exists(), "stale artifact must be removed");
    assert_eq!(
        cmd.called_programs(),
        vec!["snapcraft", "snapcraft", "make"]
    );
    assert_eq!(cmd.calls()[0].1, vec!["clean".to_string()]);
}

#[test]
fn given_utility_compiled_when_build_then_binary_copied_into_layout() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_utility_tree(&temp);
    let (svc, _) = service(&temp, MockCommandRunner::new());

    // Act
    svc.build().unwrap();

    // Assert
    let dest = temp.path().join("prime/bin/dnsmasq");
    assert_eq!(std::fs::read_to_string(dest).unwrap(), "ELF");
}

#[test]
fn given_failing_packager_when_build_then_error_carries_its_stderr() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_utility_tree(&temp);
    let cmd = MockCommandRunner::new().with_failure("snapcraft", "no snapcraft.yaml found");
    let (svc, cmd) = service(&temp, cmd);

    // Act
    let err = svc.build().unwrap_err();

    // Assert
    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert!(
        err.to_string().contains("no snapcraft.yaml found"),
        "tool stderr must surface in the error: {}",
        err
    );
    assert_eq!(
        cmd.called_programs(),
        vec!["snapcraft"],
        "first failing step must abort the build"
    );
}

#[test]
fn given_missing_utility_dir_when_build_then_path_not_found() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (svc, _) = service(&temp, MockCommandRunner::new());

    // Act / Assert
    assert!(matches!(
        svc.build(),
        Err(ApplicationError::PathNotFound(_))
    ));
}

// ============================================================
// run() tests
// ============================================================

#[test]
fn given_missing_artifact_when_run_then_reports_and_executes_nothing() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (svc, cmd) = service(&temp, MockCommandRunner::new());

    // Act
    let result = svc.run();

    // Assert
    assert!(matches!(result, Err(ApplicationError::ArtifactMissing(_))));
    assert!(cmd.calls().is_empty(), "nothing must be executed");
}

#[test]
fn given_artifact_when_run_then_executes_it_directly() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let artifact = temp.path().join("build/appliance.snap");
    std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
    std::fs::write(&artifact, "bundle").unwrap();
    let (svc, cmd) = service(&temp, MockCommandRunner::new());

    // Act
    let code = svc.run().unwrap();

    // Assert
    assert_eq!(code, 0);
    let (program, args) = &cmd.calls()[0];
    assert!(program.ends_with("build/appliance.snap"));
    assert!(args.is_empty());
}
