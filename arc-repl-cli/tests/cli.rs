use std::path::{Path, PathBuf};

use arc_repl_wasm::fixtures::{Abi, FixtureCompiler};
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};

fn write_module(dir: &TempDir, fixture: &FixtureCompiler) -> PathBuf {
    let path = dir.path().join("compiler.wasm");
    fixture.write_to(&path).expect("write module");
    path
}

fn repl(module: &Path) -> Command {
    let mut cmd = Command::cargo_bin("arc-repl").expect("binary exists");
    cmd.arg("--module").arg(module);
    cmd
}

#[test]
fn eval_prints_compiler_output() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::constant("fn main() {}"));

    repl(&module)
        .arg("--eval")
        .arg("fun main() {}")
        .assert()
        .success()
        .stdout(predicate::str::contains("fn main() {}"));
}

#[test]
fn eval_reports_compile_failure() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::echo().trap_on(b'!'));

    repl(&module)
        .arg("--eval")
        .arg("!oops")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn piped_session_prints_transcript() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::echo());

    repl(&module)
        .write_stdin("hello\n\nbye\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "This is a REPL for the arc-script language.",
        ))
        .stdout(predicate::str::contains("hello\r\nhello\r\n$ \r\n$ bye\r\nbye\r\n$ "));
}

#[test]
fn piped_backspace_edits_the_line() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::echo().abi(Abi::Modern));

    repl(&module)
        .arg("--no-banner")
        .write_stdin("ab\x7f\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("ab\x08 \x08\r\na\r\n$ "));
}

#[test]
fn session_survives_a_trapping_line() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::echo().trap_on(b'!'));

    repl(&module)
        .arg("--no-banner")
        .write_stdin("!bad\nok\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("$ ok\r\nok\r\n$ "));
}

#[test]
fn trapping_line_logs_nothing_at_default_level() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::echo().trap_on(b'!'));

    repl(&module)
        .arg("--no-banner")
        .env_remove("RUST_LOG")
        .write_stdin("!bad\nok\n")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn piped_session_accepts_invalid_utf8() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::echo());

    repl(&module)
        .arg("--no-banner")
        .write_stdin(&b"a\xffb\n"[..])
        .assert()
        .success()
        .stdout(predicate::str::contains("a\u{fffd}b\r\na\u{fffd}b\r\n$ "));
}

#[test]
fn custom_prompt_without_banner() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::constant("done"));

    repl(&module)
        .arg("--no-banner")
        .arg("--prompt")
        .arg("arc> ")
        .write_stdin("x\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("\r\narc> x\r\ndone\r\narc> "));
}

#[test]
fn custom_entry_point() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::constant("ok").entry("transpile"));

    repl(&module)
        .arg("--entry")
        .arg("transpile")
        .arg("--eval")
        .arg("x")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn reports_missing_entry_point() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::echo().entry("transpile"));

    repl(&module)
        .arg("--eval")
        .arg("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not export"));
}

#[test]
fn reports_missing_module() {
    let dir = tempdir().expect("tempdir");

    repl(&dir.path().join("missing.wasm"))
        .arg("--eval")
        .arg("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load compiler"));
}

#[test]
fn writes_logs_to_file() {
    let dir = tempdir().expect("tempdir");
    let module = write_module(&dir, &FixtureCompiler::echo());
    let log = dir.path().join("repl.log");

    repl(&module)
        .arg("--log-level")
        .arg("info")
        .arg("--log-file")
        .arg(&log)
        .env_remove("RUST_LOG")
        .write_stdin("x\n")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    let contents = std::fs::read_to_string(&log).expect("read log");
    assert!(contents.contains("repl session started"));
    assert!(contents.contains("repl session ended"));
}
