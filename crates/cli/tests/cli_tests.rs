//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("mdflowy")
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

#[test]
fn test_cli_file_input() {
    cmd()
        .arg(get_fixture_path("outline.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Release notes</h1>"));
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(get_fixture_path("outline.html")).unwrap();
    cmd()
        .arg("-")
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Release notes</h1>"));
}

#[test]
fn test_cli_markdown_format() {
    cmd()
        .args(["-f", "markdown", &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Release notes\n"))
        .stdout(predicate::str::contains("- Faster sync, see https://example.com\n"))
        .stdout(predicate::str::contains("hidden copy").not());
}

#[test]
fn test_cli_html_highlights_code() {
    cmd()
        .args(["-f", "html", &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"<code class="language-rust">"#))
        .stdout(predicate::str::contains(r#"<a href="https://example.com">"#));
}

#[test]
fn test_cli_text_format() {
    cmd()
        .args(["-f", "text", &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Release notes"))
        .stdout(predicate::str::contains("<h1>").not());
}

#[test]
fn test_cli_page_format() {
    cmd()
        .args(["-f", "page", &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("bmd-has-preview"))
        .stdout(predicate::str::contains(r#"<a class="bmd-preview-button">Preview MD</a>"#))
        .stdout(predicate::str::contains("list-ol"))
        .stdout(predicate::str::contains("has-latex").not());
}

#[test]
fn test_cli_page_math_blocks() {
    cmd()
        .args(["-f", "page", "--math", &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<div class="content has-latex"><span class="innerContentContainer">Energy is $E=mc^2$</span></div><div class="rendered-latex">Energy is <span class="math math-inline">\(E=mc^2\)</span></div>"#,
        ))
        .stdout(predicate::str::contains(r#"<style data-sheet="math">"#));
}

#[test]
fn test_cli_invalid_format() {
    cmd()
        .args(["-f", "json", &get_fixture_path("outline.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_cli_replay_edit() {
    cmd()
        .arg(get_fixture_path("outline.html"))
        .args(["--then", &get_fixture_path("outline_edited.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline mode"))
        .stdout(predicate::str::contains("Faster sync").not());
}

#[test]
fn test_cli_replay_focus() {
    cmd()
        .arg(get_fixture_path("outline.html"))
        .args(["--then", &get_fixture_path("outline_focus.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hidden detail"));
}

#[test]
fn test_cli_replay_chain() {
    cmd()
        .arg(get_fixture_path("outline.html"))
        .args(["--then", &get_fixture_path("outline_focus.html")])
        .args(["--then", &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hidden detail").not());
}

#[test]
fn test_cli_plain() {
    cmd()
        .args(["--plain", "-f", "markdown", &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Highlights #ol\n"))
        .stdout(predicate::str::contains("contentTag").not());
}

#[test]
fn test_cli_no_linkify() {
    cmd()
        .args(["--no-linkify", &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://example.com"))
        .stdout(predicate::str::contains("<a href").not());
}

#[test]
fn test_cli_math() {
    cmd()
        .args(["--math", &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"<span class="math math-inline">"#));
}

#[test]
fn test_cli_unknown_theme() {
    cmd()
        .args(["--theme", "no-such-theme", &get_fixture_path("outline.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-theme"));
}

#[test]
fn test_cli_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.json");
    std::fs::write(&config, r#"{"button_label": "Show Markdown"}"#).unwrap();

    cmd()
        .args(["-f", "page", "--config", config.to_str().unwrap(), &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Show Markdown"));
}

#[test]
fn test_cli_missing_config_file() {
    cmd()
        .args(["--config", "nonexistent.json", &get_fixture_path("outline.html")])
        .assert()
        .failure();
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("preview.html");

    cmd()
        .args(["-o", output.to_str().unwrap()])
        .arg(get_fixture_path("outline.html"))
        .assert()
        .success();

    assert!(std::fs::read_to_string(&output).unwrap().contains("Release notes"));
}

#[test]
fn test_cli_no_page_container() {
    cmd()
        .arg(get_fixture_path("no_container.html"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No page container"));
}

#[test]
fn test_cli_invalid_file() {
    cmd().arg("nonexistent.html").assert().failure();
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["-v", &get_fixture_path("outline.html")])
        .assert()
        .success()
        .stderr(predicate::str::contains("mdflowy"))
        .stderr(predicate::str::contains("Visible nodes"));
}

#[test]
fn test_cli_completions() {
    cmd()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mdflowy"));
}
