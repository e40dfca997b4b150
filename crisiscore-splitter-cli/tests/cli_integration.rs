use anyhow::Result;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to run the CLI binary with given args
fn run_cli(args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_text-splitter"))
        .args(args)
        .output()?;
    Ok(output)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn write_input(temp_dir: &TempDir, name: &str, content: &[u8]) -> Result<String> {
    let path = temp_dir.path().join(name);
    fs::write(&path, content)?;
    Ok(path_arg(&path))
}

/// Test that the binary runs and shows help
#[test]
fn test_cli_help() -> Result<()> {
    let output = run_cli(&["--help"])?;

    assert!(
        output.status.success(),
        "CLI help command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Split a text file into size-bounded chunks"));
    assert!(stdout.contains("--size"));
    assert!(stdout.contains("--policy"));
    assert!(stdout.contains("--pattern"));

    Ok(())
}

/// Test splitting a single file with an explicit size
#[test]
fn test_cli_split_file() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let input = write_input(&temp_dir, "input.txt", b"aaaa\nbbbb\ncccc\n")?;

    let output = run_cli(&[&input, "--size", "10"])?;
    assert!(
        output.status.success(),
        "split failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("into 2 chunks"));

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("input.txt.cc000.txt"))?,
        "aaaa\nbbbb\n"
    );
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("input.txt.cc001.txt"))?,
        "cccc\n"
    );

    // Progress goes to stderr through tracing
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Created chunk:"));

    Ok(())
}

/// Test error exit codes and messages
#[test]
fn test_cli_error_handling() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let input = write_input(&temp_dir, "input.txt", b"line\n")?;
    let missing = path_arg(&temp_dir.path().join("missing.txt"));

    let output = run_cli(&[&missing])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr)?.contains("Input file not found"));

    for size in ["0", "-5"] {
        let output = run_cli(&[&input, "-s", size])?;
        assert_eq!(output.status.code(), Some(1), "size {size} was accepted");
        assert!(String::from_utf8(output.stderr)?.contains("Chunk size must be positive"));
    }

    let output = run_cli(&[&input, "--size", "lots"])?;
    assert_eq!(output.status.code(), Some(1));

    let output = run_cli(&[&input, "--policy", "lenient"])?;
    assert_eq!(output.status.code(), Some(1));

    assert!(!temp_dir.path().join("input.txt.cc000.txt").exists());

    Ok(())
}

/// Test the strict policy and JSON output
#[test]
fn test_cli_strict_policy_json() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let long_line = "x".repeat(30);
    let input = write_input(
        &temp_dir,
        "strict.txt",
        format!("short\n{long_line}\ntail\n").as_bytes(),
    )?;

    let output = run_cli(&[&input, "-s", "10", "--policy", "strict", "-f", "json"])?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["chunk_count"], 2);
    assert_eq!(json["lines_read"], 3);
    assert_eq!(json["lines_skipped"], 1);
    assert_eq!(json["encoding"], "UTF-8");

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Skipping line 2 exceeding chunk size"));

    Ok(())
}

/// Test that a config file is loaded and flags override it
#[test]
fn test_cli_config_file() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let input = write_input(&temp_dir, "doc.txt", b"one\ntwo\nthree\nfour\n")?;
    let out_dir = temp_dir.path().join("chunks");
    let config = temp_dir.path().join("splitter.toml");
    fs::write(
        &config,
        format!(
            "max_chunk_size = 4\noutput_dir = {:?}\n",
            out_dir.to_string_lossy()
        ),
    )?;

    let output = run_cli(&[&input, "--config", &path_arg(&config), "-s", "8", "-q"])?;
    assert!(
        output.status.success(),
        "split failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // Size 8 from the command line, output directory from the file
    assert_eq!(fs::read_to_string(out_dir.join("doc.txt.cc000.txt"))?, "one\ntwo\n");
    assert_eq!(fs::read_to_string(out_dir.join("doc.txt.cc001.txt"))?, "three\n");
    assert_eq!(fs::read_to_string(out_dir.join("doc.txt.cc002.txt"))?, "four\n");

    // Quiet mode suppresses the info lines
    assert!(!String::from_utf8(output.stderr)?.contains("Created chunk:"));

    Ok(())
}

/// Test headings mode with a minimum section size and an output directory
#[test]
fn test_cli_headings_boundary() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let input = write_input(
        &temp_dir,
        "doc.md",
        b"# One\nalpha\nbeta\n# Two\ngamma\n## Three\ndelta\n",
    )?;
    let out_dir = temp_dir.path().join("sections");

    let output = run_cli(&[
        &input,
        "-s",
        "1000",
        "--boundary",
        "headings",
        "--min-section-size",
        "20",
        "-o",
        &path_arg(&out_dir),
    ])?;
    assert!(
        output.status.success(),
        "split failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert!(String::from_utf8(output.stdout)?.contains("into 2 chunks"));
    assert_eq!(
        fs::read_to_string(out_dir.join("doc.md.cc000.txt"))?,
        "# One\nalpha\nbeta\n# Two\ngamma\n"
    );
    assert_eq!(
        fs::read_to_string(out_dir.join("doc.md.cc001.txt"))?,
        "## Three\ndelta\n"
    );
    assert!(!temp_dir.path().join("doc.md.cc000.txt").exists());

    Ok(())
}

/// Test batch mode over a directory with one broken file
#[test]
fn test_cli_batch_mode() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    write_input(&temp_dir, "a.log", b"alpha\nbeta\n")?;
    write_input(&temp_dir, "b.log", b"gamma\n")?;
    write_input(&temp_dir, "c.log", b"\xff\xfe\n")?;
    write_input(&temp_dir, "ignored.txt", b"not matched\n")?;
    let dir = path_arg(temp_dir.path());

    let output = run_cli(&[
        &dir,
        "--pattern",
        "*.log",
        "--fallback-encoding",
        "none",
        "-f",
        "json",
    ])?;

    // One failure makes the whole run fail, but the other files are still split
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr)?.contains("1 of 3 files failed"));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let results = json.as_object().expect("batch output is a JSON object");
    assert_eq!(results.len(), 3);

    let a = &results[&path_arg(&temp_dir.path().join("a.log"))];
    assert_eq!(a["status"], "success");
    assert_eq!(a["chunk_count"], 1);
    let c = &results[&path_arg(&temp_dir.path().join("c.log"))];
    assert_eq!(c["status"], "error");

    assert!(temp_dir.path().join("b.log.cc000.txt").exists());
    assert!(!temp_dir.path().join("ignored.txt.cc000.txt").exists());

    Ok(())
}
