mod common;

use std::path::PathBuf;

use pretty_assertions::assert_eq;

use rox::natives::{FileMode, LoxFile};

use common::{output, runtime_error};

/// A path under the system temp dir unique to this test process.
fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rox-{}-{}", std::process::id(), name))
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(output("print clock() > 0;"), "true\n");
    assert_eq!(
        runtime_error("clock(1);"),
        "Expected 0 arguments but got 1.\n[line 1]"
    );
}

#[test]
fn write_then_read_back() {
    let path = scratch_path("roundtrip.txt");
    let source = format!(
        "var f = open(\"{path}\", \"w\");
write(f, \"hello\");
write(f, \" world\");
close(f);
var g = open(\"{path}\", \"r\");
print read(g);
close(g);
close(g);",
        path = path.display()
    );

    assert_eq!(output(&source), "hello world\n");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn mode_mismatch_is_silent() {
    let path = scratch_path("modes.txt");
    std::fs::write(&path, "kept").expect("seed file");

    let source = format!(
        "var r = open(\"{path}\", \"r\");
write(r, \"ignored\");
print read(r);
close(r);
var w = open(\"{path}\", \"w\");
print read(w) == \"\";
close(w);",
        path = path.display()
    );

    assert_eq!(output(&source), "kept\ntrue\n");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn open_failures() {
    assert_eq!(
        runtime_error("open(\"/nonexistent-rox-dir/missing.txt\", \"r\");"),
        "Failed to open file.\n[line 1]"
    );
    assert_eq!(
        runtime_error("open(\"whatever.txt\", \"a\");"),
        "Invalid file mode.\n[line 1]"
    );
}

#[test]
fn argument_type_errors() {
    assert_eq!(
        runtime_error("open(1, \"r\");"),
        "Expected a string but got number.\n[line 1]"
    );
    assert_eq!(
        runtime_error("\nclose(nil);"),
        "Expected a file but got nil.\n[line 2]"
    );
}

#[test]
fn file_handles_display_their_path() {
    let path = scratch_path("display.txt");
    let source = format!(
        "var f = open(\"{path}\", \"w\");\nprint f;\nclose(f);\nprint open;",
        path = path.display()
    );

    assert_eq!(
        output(&source),
        format!("<file {}>\n<native fn open>\n", path.display())
    );

    let _ = std::fs::remove_file(&path);
}

#[test]
fn close_is_idempotent() {
    let path = scratch_path("close.txt");
    let mut file = LoxFile::open(&path.to_string_lossy(), FileMode::Write).expect("create");

    assert!(file.is_open());
    assert_eq!(file.mode(), FileMode::Write);

    file.close();
    file.close();

    assert!(!file.is_open());
    // Writes after closing go nowhere.
    file.write("late");
    assert_eq!(std::fs::read_to_string(&path).expect("read back"), "");

    let _ = std::fs::remove_file(&path);
}
