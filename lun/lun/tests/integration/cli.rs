#![cfg(all(not(target_family = "wasm"), feature = "cli"))]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use insta_cmd::assert_cmd_snapshot;
use insta_cmd::get_cargo_bin;

#[test]
fn tree() {
    assert_cmd_snapshot!(lun_command()
        .arg("tree")
        .pass_stdin("answer :: 42;"), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    (source_file (global_def_item name: (identifier) value: (lit_expr (integer_lit))))

    ----- stderr -----
    ");
}

#[test]
fn lex_json() {
    assert_cmd_snapshot!(lun_command()
        .args(["lex", "--format", "json"])
        .pass_stdin("a // b"), @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    [
      {
        "kind": {
          "Ident": "a"
        },
        "span": {
          "start": 0,
          "end": 1
        }
      },
      {
        "kind": {
          "Comment": "// b"
        },
        "span": {
          "start": 2,
          "end": 6
        }
      }
    ]
    ----- stderr -----
    "#);
}

#[test]
fn format_from_env() {
    assert_cmd_snapshot!(lun_command()
        .arg("lex")
        .env("LUN_FORMAT", "json")
        .pass_stdin("a"), @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    [
      {
        "kind": {
          "Ident": "a"
        },
        "span": {
          "start": 0,
          "end": 1
        }
      }
    ]
    ----- stderr -----
    "#);
}

#[test]
fn parse_yaml() {
    assert_cmd_snapshot!(lun_command()
        .arg("parse")
        .pass_stdin("a :: b;"), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    items:
    - kind: !GlobalDef
        name:
          name: a
          span: 1:0-1
        mutable: false
        value:
          kind: !Path
            root: !Ident
              name: b
              span: 1:5-6
            segments: []
          span: 1:5-6
        semicolon: true
      span: 1:0-7
    span: 1:0-7

    ----- stderr -----
    ");
}

#[test]
fn check_project() {
    assert_cmd_snapshot!(lun_command()
        .arg("check")
        .arg(project_path()), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    2 file(s) parsed without errors

    ----- stderr -----
    ");
}

#[test]
fn check_errors() {
    let mut child = lun_command()
        .arg("check")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // stdin is closed once the handle is dropped
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"a :: 1;\nb :: 2")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("[E0002] Error"), "{stderr}");
    assert!(stderr.contains("expected `;` after expression"), "{stderr}");
    // no colors, since we asked for none
    assert!(!stderr.contains('\u{1b}'), "{stderr}");
}

#[test]
fn language() {
    let output = lun_command()
        .args(["language", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["name"], "lun");
    assert_eq!(info["abi_version"], 1);
    assert_eq!(info["node_kinds"][0]["name"], "source_file");
    assert_eq!(info["fields"].as_array().unwrap().len(), 23);
}

#[test]
fn json_schema() {
    let output = lun_command()
        .args(["debug", "json-schema", "--schema-type", "tokens"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["title"], "Tokens");
}

#[test]
fn shell_completion() {
    for shell in ["bash", "fish", "powershell", "zsh"] {
        let output = lun_command()
            .args(["shell-completion", shell])
            .output()
            .unwrap();
        assert!(output.status.success(), "{shell}");
        let script = String::from_utf8(output.stdout).unwrap();
        assert!(script.contains("lun"), "{shell}");
    }
}

fn project_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("integration")
        .join("project")
}

fn lun_command() -> Command {
    let mut cmd = Command::new(get_cargo_bin("lun"));
    normalize_lun(&mut cmd);
    cmd
}

fn normalize_lun(cmd: &mut Command) -> &mut Command {
    cmd
        // We set `CLICOLOR_FORCE` in CI to force color output, but we don't want `lun` to
        // output color for our snapshot tests. And it seems to override the
        // `--color=never` flag.
        .env_remove("CLICOLOR_FORCE")
        .env_remove("LUN_FORMAT")
        .env("NO_COLOR", "1")
        .args(["--color=never"])
        // We don't want the tests to be affected by the user's `RUST_BACKTRACE` setting.
        .env_remove("RUST_BACKTRACE")
        .env_remove("RUST_LOG")
}
