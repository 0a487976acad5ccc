use std::process::Command;
use tempfile::TempDir;

#[test]
#[ignore] // Needs network access and a template.pptx in the package root
fn test_cli_generates_deck_from_csv() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let vocab_path = dir.path().join("vocab.csv");
    std::fs::write(&vocab_path, "你好,hello\n谢谢,thank you\n").expect("Failed to write vocab");

    let output_path = dir.path().join("deck.pptx");
    let media_dir = dir.path().join("media");

    let status = Command::new("cargo")
        .args([
            "run",
            "--",
            "generate",
            "--input",
            vocab_path.to_str().expect("vocab path"),
            "--template",
            "template.pptx",
            "--output",
            output_path.to_str().expect("output path"),
            "--media-dir",
            media_dir.to_str().expect("media dir"),
        ])
        .status()
        .expect("Failed to run CLI");

    assert!(status.success(), "CLI run should succeed");
    assert!(output_path.exists(), "Deck should be written");
}
