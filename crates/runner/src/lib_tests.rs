use super::*;

#[tokio::test]
async fn test_zero_exit_is_success() {
    let dir = tempfile::tempdir().unwrap();

    let outcome = ShellCommandRunner::new()
        .run(dir.path(), "true")
        .await
        .unwrap();

    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_non_zero_exit_code_is_reported() {
    let dir = tempfile::tempdir().unwrap();

    let outcome = ShellCommandRunner::new()
        .run(dir.path(), "exit 7")
        .await
        .unwrap();

    assert_eq!(outcome.exit_code, Some(7));
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_command_runs_in_the_working_directory() {
    let dir = tempfile::tempdir().unwrap();

    ShellCommandRunner::new()
        .run(dir.path(), "pwd > where.txt && echo deployed >&2")
        .await
        .unwrap();

    let recorded = std::fs::read_to_string(dir.path().join("where.txt")).unwrap();
    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(
        std::path::Path::new(recorded.trim()).canonicalize().unwrap(),
        expected
    );
}

#[tokio::test]
async fn test_shell_features_are_available() {
    let dir = tempfile::tempdir().unwrap();

    let outcome = ShellCommandRunner::new()
        .run(dir.path(), "false || test -d .")
        .await
        .unwrap();

    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_missing_working_directory_is_a_spawn_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("not-checked-out");

    let err = ShellCommandRunner::new()
        .run(&missing, "true")
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionError::Spawn { working_dir, .. } if working_dir == missing));
}

#[tokio::test]
async fn test_missing_shell_is_a_spawn_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = ShellCommandRunner::with_shell("/definitely/not/a/shell")
        .run(dir.path(), "true")
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionError::Spawn { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn test_signal_termination_has_no_exit_code() {
    let dir = tempfile::tempdir().unwrap();

    let outcome = ShellCommandRunner::new()
        .run(dir.path(), "kill -9 $$")
        .await
        .unwrap();

    assert_eq!(outcome.exit_code, None);
    assert!(!outcome.is_success());
}
