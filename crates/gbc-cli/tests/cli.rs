use std::path::PathBuf;
use std::process::{Command, Output};

fn gbc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gbc")).args(args).output().unwrap()
}

fn stdout(out: &Output) -> String { String::from_utf8_lossy(&out.stdout).into_owned() }

fn stderr(out: &Output) -> String { String::from_utf8_lossy(&out.stderr).into_owned() }

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("gbc_cli");
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

#[test]
fn run_prints_value() {
    let out = gbc(&["run", "-e", "3+4", "--width", "4", "--height", "4"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "7");
}

#[test]
fn compiled_run_matches() {
    let out = gbc(&["run", "--compiled", "-e", "{1 an1  *2) q1,5", "--width", "4", "--height", "4"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "10");
}

#[test]
fn run_reads_file_and_writes_png() {
    let src = scratch("square.gbc");
    let png = scratch("square.png");
    let _ = std::fs::remove_file(&png);
    std::fs::write(&src, "C255,0,0 p1,1 d p6,1 P p6,6 P p1,6 P p1,1 P").unwrap();

    let out = gbc(&[
        "run",
        src.to_str().unwrap(),
        "-o",
        png.to_str().unwrap(),
        "--width",
        "8",
        "--height",
        "8",
        "--background",
        "ffffff",
    ]);
    assert!(out.status.success(), "{}", stderr(&out));
    let bytes = std::fs::read(&png).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn trace_lists_surface_calls() {
    let out = gbc(&["trace", "-e", "p1,1 t2,3 t4,n1 d"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(
        stdout(&out),
        "set_cursor 1 1\ntranslate 2 3\ntranslate 4 -1\ndot 7 3\n=> 0\n",
    );
}

#[test]
fn trace_is_identical_through_the_vm() {
    let src = "L3 a1,a1 +1  pa1,a1  d) C1,2,3";
    let tree = gbc(&["trace", "-e", src]);
    let vm = gbc(&["trace", "--compiled", "-e", src]);
    assert!(tree.status.success(), "{}", stderr(&tree));
    assert_eq!(stdout(&tree), stdout(&vm));
}

#[test]
fn ast_prints_tree() {
    let out = gbc(&["ast", "-e", "3+4"]);
    assert_eq!(stdout(&out).trim(), "program{(3 + 4)}");
    let out = gbc(&["ast", "--optimize", "-e", "3+4"]);
    assert_eq!(stdout(&out).trim(), "program{7}");
}

#[test]
fn disasm_ends_in_halt() {
    let out = gbc(&["disasm", "-e", "L2 d)"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).trim_end().ends_with("halt"));
}

#[test]
fn parse_error_exits_non_zero() {
    let out = gbc(&["run", "-e", "1.2.3"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("P001"), "{}", stderr(&out));
}

#[test]
fn runtime_error_exits_non_zero() {
    let out = gbc(&["trace", "-e", "q3"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("R002"), "{}", stderr(&out));
}

#[test]
fn depth_limit_flag() {
    let out = gbc(&["trace", "--max-depth", "0", "-e", "{1 5) q1"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("R007"), "{}", stderr(&out));
}

#[test]
fn missing_program_is_rejected() {
    let out = gbc(&["run"]);
    assert!(!out.status.success());
}

#[test]
fn bad_background_is_rejected() {
    let out = gbc(&["run", "-e", "d", "--background", "nope"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("--background"), "{}", stderr(&out));
}
