//! Tests for VmService

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use applab::application::services::VmService;
use applab::application::ApplicationError;
use applab::domain::{LaunchRecord, VmStatus};
use applab::infrastructure::traits::RealFileSystem;

use common::{test_settings, MockCommandRunner};

fn service(temp: &TempDir, cmd: MockCommandRunner) -> (VmService, Arc<MockCommandRunner>) {
    let cmd = Arc::new(cmd);
    let settings = Arc::new(test_settings(temp.path()));
    let svc = VmService::new(Arc::new(RealFileSystem), cmd.clone(), settings);
    (svc, cmd)
}

/// Make the disk image present so `up` passes its precondition.
fn create_image(temp: &TempDir) {
    let image = temp.path().join(".applab/appliance.img");
    std::fs::create_dir_all(image.parent().unwrap()).unwrap();
    std::fs::write(&image, "disk").unwrap();
}

/// Pre-write a launch record, simulating a running VM.
fn write_record(temp: &TempDir, pid: u32) {
    let pid_file = temp.path().join(".applab/vm.pid");
    std::fs::create_dir_all(pid_file.parent().unwrap()).unwrap();
    std::fs::write(&pid_file, LaunchRecord::new(pid).to_toml().unwrap()).unwrap();
}

// ============================================================
// status() tests
// ============================================================

#[test]
fn given_no_sentinel_when_status_then_not_running() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (svc, _) = service(&temp, MockCommandRunner::new());

    // Act / Assert
    assert_eq!(svc.status().unwrap(), VmStatus::NotRunning);
}

#[test]
fn given_malformed_sentinel_when_status_then_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let pid_file = temp.path().join(".applab/vm.pid");
    std::fs::create_dir_all(pid_file.parent().unwrap()).unwrap();
    std::fs::write(&pid_file, "not a record").unwrap();
    let (svc, _) = service(&temp, MockCommandRunner::new());

    // Act / Assert
    assert!(matches!(
        svc.status(),
        Err(ApplicationError::Domain(_))
    ));
}

// ============================================================
// up() tests
// ============================================================

#[test]
fn given_image_present_when_up_then_spawns_launcher_and_writes_record() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_image(&temp);
    let (svc, cmd) = service(&temp, MockCommandRunner::new().with_available(&["kvm"]).with_pid(777));

    // Act
    let record = svc.up().unwrap();

    // Assert
    assert_eq!(record.pid, 777);
    let (program, args) = &cmd.calls()[0];
    assert_eq!(program, "kvm");
    let netdev = args
        .iter()
        .find(|a| a.starts_with("user,id=net0"))
        .expect("netdev argument");
    assert!(netdev.contains("hostfwd=tcp::8090-:80"));
    assert!(netdev.contains("hostfwd=tcp::8022-:22"));

    let on_disk = std::fs::read_to_string(temp.path().join(".applab/vm.pid")).unwrap();
    assert_eq!(LaunchRecord::from_toml(&on_disk).unwrap().pid, 777);
}

#[test]
fn given_running_vm_when_up_again_then_already_running_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_image(&temp);
    write_record(&temp, 1234);
    let (svc, cmd) = service(&temp, MockCommandRunner::new().with_available(&["kvm"]));

    // Act
    let result = svc.up();

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::VmAlreadyRunning { pid: 1234 })
    ));
    assert!(cmd.calls().is_empty(), "no launcher must be spawned");
}

#[test]
fn given_missing_image_when_up_then_image_missing_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (svc, cmd) = service(&temp, MockCommandRunner::new().with_available(&["kvm"]));

    // Act / Assert
    assert!(matches!(svc.up(), Err(ApplicationError::ImageMissing(_))));
    assert!(cmd.calls().is_empty());
}

#[test]
fn given_missing_launcher_when_up_then_tool_missing_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_image(&temp);
    let (svc, _) = service(&temp, MockCommandRunner::new());

    // Act / Assert
    assert!(matches!(svc.up(), Err(ApplicationError::ToolMissing { .. })));
}

// ============================================================
// down() tests
// ============================================================

#[test]
fn given_no_vm_when_down_then_not_running_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (svc, cmd) = service(&temp, MockCommandRunner::new());

    // Act / Assert
    assert!(matches!(svc.down(), Err(ApplicationError::VmNotRunning)));
    assert!(cmd.calls().is_empty(), "nothing must be killed");
}

#[test]
fn given_running_vm_when_down_then_kills_and_removes_sentinel() {
    // Arrange
    let temp = TempDir::new().unwrap();
    write_record(&temp, 5555);
    let (svc, cmd) = service(&temp, MockCommandRunner::new());

    // Act
    let report = svc.down().unwrap();

    // Assert
    assert_eq!(report.record.pid, 5555);
    assert!(report.killed);
    assert_eq!(
        cmd.calls(),
        vec![("kill".to_string(), vec!["5555".to_string()])]
    );
    assert!(!temp.path().join(".applab/vm.pid").exists());
}

#[test]
fn given_dead_pid_when_down_then_reports_unkilled_and_removes_sentinel() {
    // Arrange: the recorded process is already gone, kill fails
    let temp = TempDir::new().unwrap();
    write_record(&temp, 4711);
    let cmd = MockCommandRunner::new().with_failure("kill", "No such process");
    let (svc, cmd) = service(&temp, cmd);

    // Act
    let report = svc.down().unwrap();

    // Assert
    assert!(!report.killed);
    assert_eq!(report.record.pid, 4711);
    assert_eq!(cmd.called_programs(), vec!["kill"]);
    assert!(
        !temp.path().join(".applab/vm.pid").exists(),
        "stale record must still be cleaned up"
    );
}

// ============================================================
// connect() tests
// ============================================================

#[test]
fn given_no_vm_when_connect_then_not_running_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (svc, cmd) = service(&temp, MockCommandRunner::new());

    // Act / Assert
    assert!(matches!(svc.connect(), Err(ApplicationError::VmNotRunning)));
    assert!(cmd.calls().is_empty(), "no ssh session must be opened");
}

#[test]
fn given_running_vm_when_connect_then_ssh_on_forwarded_port() {
    // Arrange
    let temp = TempDir::new().unwrap();
    write_record(&temp, 99);
    let (svc, cmd) = service(&temp, MockCommandRunner::new());

    // Act
    let code = svc.connect().unwrap();

    // Assert
    assert_eq!(code, 0);
    let (program, args) = &cmd.calls()[0];
    assert_eq!(program, "ssh");
    assert!(args.contains(&"-p".to_string()));
    assert!(args.contains(&"8022".to_string()));
    assert!(args.contains(&"ubuntu@localhost".to_string()));
}
