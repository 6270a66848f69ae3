use std::path::Path;
use std::process::{Command, Output};

fn aider_run() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_aider-run"));
    cmd.env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_API_BASE")
        .env_remove("RUST_LOG")
        .env_remove("AIDER_RUN_AIDER_BIN")
        .args(["--color", "never"]);
    cmd
}

fn run_with(cmd: &mut Command, json: &str) -> Output {
    cmd.arg(json).output().expect("failed to run aider-run binary")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn invalid_json_exits_one_with_decode_error() {
    let out = run_with(&mut aider_run(), "{\"prompt\": oops}");

    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("Invalid JSON input"), "stderr: {err}");
    assert!(err.contains("line 1"), "stderr: {err}");
}

#[test]
fn missing_prompt_exits_one() {
    let out = run_with(&mut aider_run(), r#"{"modelName": "gpt-4o"}"#);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("'prompt' is required in the JSON input."));
}

#[test]
fn nonexistent_repo_path_exits_one() {
    let temp = tempfile::TempDir::new().unwrap();
    let json = serde_json::json!({
        "prompt": "x",
        "repoPath": temp.path().join("missing"),
    })
    .to_string();

    let out = run_with(&mut aider_run(), &json);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("repoPath does not exist"));
}

#[test]
fn repo_path_to_file_exits_one() {
    let temp = tempfile::TempDir::new().unwrap();
    let file = temp.path().join("plain.txt");
    std::fs::write(&file, "").unwrap();
    let json = serde_json::json!({"prompt": "x", "repoPath": file}).to_string();

    let out = run_with(&mut aider_run(), &json);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("repoPath is not a directory"));
}

#[test]
fn api_base_without_key_exits_one() {
    let temp = tempfile::TempDir::new().unwrap();
    let json = serde_json::json!({
        "prompt": "x",
        "repoPath": temp.path(),
        "apiBase": "http://127.0.0.1:9/v1",
    })
    .to_string();

    let out = run_with(&mut aider_run(), &json);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("'OPENAI_API_KEY'"));
}

#[test]
fn missing_aider_binary_is_an_initialization_error() {
    let temp = tempfile::TempDir::new().unwrap();
    let json = serde_json::json!({"prompt": "x", "repoPath": temp.path()}).to_string();

    let out = run_with(
        aider_run().args(["--aider-bin", "aider-binary-that-does-not-exist"]),
        &json,
    );

    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(
        err.contains("Error initializing aider: aider-binary-that-does-not-exist not found"),
        "stderr: {err}"
    );
}

#[cfg(unix)]
mod with_fake_aider {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::process::Stdio;
    use tempfile::TempDir;

    /// Stand-in for aider: records argv, cwd and API settings, then exits.
    fn fake_aider(dir: &Path, exit_code: i32) -> PathBuf {
        let script = dir.join("aider");
        let body = format!(
            "#!/bin/sh\n\
             printf '%s\\n' \"$@\" > args.txt\n\
             printf '%s' \"$OPENAI_API_BASE\" > api_base.txt\n\
             printf '%s' \"$OPENAI_API_KEY\" > api_key.txt\n\
             echo 'aider says hi'\n\
             exit {exit_code}\n"
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    fn read(dir: &Path, name: &str) -> String {
        std::fs::read_to_string(dir.join(name)).unwrap()
    }

    #[test]
    fn successful_run_exits_zero_and_forwards_request() {
        let bin = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        std::fs::create_dir(repo.path().join(".git")).unwrap();
        std::fs::write(repo.path().join("hello.txt"), "hello world").unwrap();
        let json = serde_json::json!({
            "prompt": "change hello to goodbye",
            "editableFiles": ["hello.txt"],
            "modelName": "gpt-4o",
            "repoPath": repo.path(),
            "autoCommits": true,
        })
        .to_string();

        let out = run_with(
            aider_run().arg("--aider-bin").arg(fake_aider(bin.path(), 0)),
            &json,
        );

        assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
        assert!(String::from_utf8_lossy(&out.stdout).contains("aider says hi"));
        let err = stderr(&out);
        assert!(err.contains("Running aider with model: gpt-4o"));
        assert!(err.contains("Aider execution finished."));

        let args = read(repo.path(), "args.txt");
        let args: Vec<&str> = args.lines().collect();
        assert!(args.windows(2).any(|w| w == ["--model", "gpt-4o"]));
        assert!(args.windows(2).any(|w| w == ["--file", "hello.txt"]));
        assert!(args.contains(&"--auto-commits"));
        assert!(!args.contains(&"--no-git"));
        assert_eq!(args[args.len() - 2..], ["--message", "change hello to goodbye"]);
    }

    #[test]
    fn repo_without_git_warns_and_still_runs() {
        let bin = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        let json = serde_json::json!({"prompt": "x", "repoPath": repo.path()}).to_string();

        let out = run_with(
            aider_run().arg("--aider-bin").arg(fake_aider(bin.path(), 0)),
            &json,
        );

        assert_eq!(out.status.code(), Some(0));
        assert!(stderr(&out).contains("WARN repoPath"));
        assert!(stderr(&out).contains("is not a git repository"));
        assert!(read(repo.path(), "args.txt").lines().any(|l| l == "--no-git"));
    }

    #[test]
    fn missing_files_are_warnings() {
        let bin = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        let json = serde_json::json!({
            "prompt": "x",
            "repoPath": repo.path(),
            "readOnlyFiles": ["nowhere.md"],
        })
        .to_string();

        let out = run_with(
            aider_run().arg("--aider-bin").arg(fake_aider(bin.path(), 0)),
            &json,
        );

        assert_eq!(out.status.code(), Some(0));
        let err = stderr(&out);
        assert!(err.contains("WARN File not found: nowhere.md"), "stderr: {err}");
    }

    #[test]
    fn api_base_and_key_reach_the_agent_exactly() {
        let bin = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        let json = serde_json::json!({
            "prompt": "x",
            "repoPath": repo.path(),
            "modelName": "openai/gpt-4o-mini",
            "apiBase": "https://openrouter.ai/api/v1",
            "apiKey": "sk-or-test",
        })
        .to_string();

        let out = run_with(
            aider_run().arg("--aider-bin").arg(fake_aider(bin.path(), 0)),
            &json,
        );

        assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
        assert_eq!(read(repo.path(), "api_base.txt"), "https://openrouter.ai/api/v1");
        assert_eq!(read(repo.path(), "api_key.txt"), "sk-or-test");
        assert!(
            read(repo.path(), "args.txt")
                .lines()
                .any(|l| l == "openai/openai/gpt-4o-mini")
        );
    }

    #[test]
    fn inherited_api_key_satisfies_api_base() {
        let bin = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        let json = serde_json::json!({
            "prompt": "x",
            "repoPath": repo.path(),
            "apiBase": "http://127.0.0.1:9/v1",
        })
        .to_string();

        let out = run_with(
            aider_run()
                .env("OPENAI_API_KEY", "sk-from-env")
                .arg("--aider-bin")
                .arg(fake_aider(bin.path(), 0)),
            &json,
        );

        assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
        assert_eq!(read(repo.path(), "api_key.txt"), "sk-from-env");
    }

    #[test]
    fn agent_failure_exits_one() {
        let bin = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        let json = serde_json::json!({"prompt": "x", "repoPath": repo.path()}).to_string();

        let out = run_with(
            aider_run().arg("--aider-bin").arg(fake_aider(bin.path(), 2)),
            &json,
        );

        assert_eq!(out.status.code(), Some(1));
        let err = stderr(&out);
        assert!(
            err.lines()
                .any(|l| l.starts_with("Error during aider execution: ")
                    && l.ends_with("exited with code 2")),
            "stderr: {err}"
        );
    }

    #[test]
    fn request_can_be_read_from_stdin() {
        use std::io::Write;

        let bin = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        let json = serde_json::json!({"prompt": "from stdin", "repoPath": repo.path()}).to_string();

        let mut child = aider_run()
            .arg("--aider-bin")
            .arg(fake_aider(bin.path(), 0))
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        child
            .stdin
            .take()
            .unwrap()
            .write_all(json.as_bytes())
            .unwrap();
        let out = child.wait_with_output().unwrap();

        assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
        assert!(read(repo.path(), "args.txt").lines().any(|l| l == "from stdin"));
    }

    #[test]
    fn dry_run_prints_command_without_running() {
        let bin = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        let json = serde_json::json!({
            "prompt": "x",
            "repoPath": repo.path(),
            "apiBase": "http://127.0.0.1:9/v1",
            "apiKey": "sk-secret",
        })
        .to_string();

        let out = run_with(
            aider_run()
                .arg("--dry-run")
                .arg("--aider-bin")
                .arg(fake_aider(bin.path(), 1)),
            &json,
        );

        assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("--message x"));
        assert!(stdout.contains("OPENAI_API_KEY='<redacted>'"));
        assert!(!stdout.contains("sk-secret"));
        assert!(!repo.path().join("args.txt").exists());
    }
}
