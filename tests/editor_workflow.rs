//! End-to-end integration tests for the staged editor: stage, inspect,
//! re-edit, commit, verify disk.

use serde_json::json;
use stagefs::delete::DeleteOptions;
use stagefs::editor::AppendOptions;
use stagefs::{CopyOptions, Editor, FileState};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn editor_in(dir: &TempDir) -> Editor {
    Editor::new().with_cwd(dir.path())
}

#[test]
fn scaffold_workflow_stages_then_commits() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("templates")).unwrap();
    fs::write(
        dir.path().join("templates/readme.md"),
        "# <project>\n\nGenerated scaffold.\n",
    )
    .unwrap();
    fs::write(dir.path().join("templates/main.rs"), "fn main() {}\n").unwrap();

    let editor = editor_in(&dir);

    let context = json!({"project": "demo"}).as_object().cloned().unwrap();
    editor
        .copy(
            "templates/*",
            "out",
            &CopyOptions::templated(context),
        )
        .unwrap();
    editor.write("out/extra.txt", "added directly");

    // Nothing on disk yet.
    assert!(!dir.path().join("out").exists());

    // Staged files are inspectable and re-editable before commit.
    assert_eq!(
        editor.read_to_string("out/readme.md").unwrap(),
        "# demo\n\nGenerated scaffold.\n"
    );
    editor
        .append("out/extra.txt", b"second line", &AppendOptions::default())
        .unwrap();

    let report = editor.commit();
    assert!(report.is_success());
    assert_eq!(report.written(), 3);

    assert_eq!(
        fs::read_to_string(dir.path().join("out/readme.md")).unwrap(),
        "# demo\n\nGenerated scaffold.\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("out/extra.txt")).unwrap(),
        "added directly\nsecond line"
    );
}

#[test]
fn glob_copy_merges_virtual_and_disk_sources() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/disk.txt"), "from disk").unwrap();

    let editor = editor_in(&dir);
    // A prior in-memory copy target that never touched disk.
    editor.write("src/virtual.txt", "from memory");

    editor
        .copy("src/*.txt", "dest", &CopyOptions::default())
        .unwrap();
    let report = editor.commit();
    assert!(report.is_success());

    assert_eq!(
        fs::read_to_string(dir.path().join("dest/disk.txt")).unwrap(),
        "from disk"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("dest/virtual.txt")).unwrap(),
        "from memory"
    );
}

#[test]
fn delete_then_commit_removes_files_from_disk() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("stale.txt"), "old").unwrap();

    let editor = editor_in(&dir);
    editor.delete("stale.txt", &DeleteOptions::default()).unwrap();

    assert!(dir.path().join("stale.txt").exists());
    let report = editor.commit();
    assert!(report.is_success());
    assert_eq!(report.removed(), 1);
    assert!(!dir.path().join("stale.txt").exists());
}

#[test]
fn move_files_copies_then_tombstones_source() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("old-name.txt"), "payload").unwrap();

    let editor = editor_in(&dir);
    editor
        .move_files("old-name.txt", "new-name.txt", &CopyOptions::default())
        .unwrap();

    assert!(!editor.exists("old-name.txt"));
    assert_eq!(editor.read("new-name.txt").unwrap(), b"payload");

    editor.commit();
    assert!(!dir.path().join("old-name.txt").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("new-name.txt")).unwrap(),
        "payload"
    );
}

#[test]
fn dump_snapshots_pending_state() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("victim.txt"), "x").unwrap();

    let editor = editor_in(&dir);
    editor.write("created.txt", "new");
    editor.delete("victim.txt", &DeleteOptions::default()).unwrap();

    let dump = editor.dump(dir.path());
    assert_eq!(dump["created.txt"].state, FileState::Modified);
    assert_eq!(dump["created.txt"].contents.as_deref(), Some("new"));
    assert_eq!(dump["victim.txt"].state, FileState::Deleted);
    assert_eq!(dump["victim.txt"].contents, None);
}

#[test]
fn commit_reports_failures_without_aborting_batch() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("collision")).unwrap();

    let editor = editor_in(&dir);
    editor.write("collision", "cannot write over a directory");
    editor.write("survivor.txt", "fine");

    let report = editor.commit();
    assert!(!report.is_success());

    let failed: Vec<PathBuf> = report.failures().map(|o| o.path.clone()).collect();
    assert_eq!(failed, vec![dir.path().join("collision")]);
    assert_eq!(
        fs::read_to_string(dir.path().join("survivor.txt")).unwrap(),
        "fine"
    );
}

#[tokio::test]
async fn async_batch_copy_commits_all_files() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("pool")).unwrap();
    for i in 0..5 {
        fs::write(dir.path().join(format!("pool/{i}.txt")), format!("n{i}")).unwrap();
    }

    let editor = editor_in(&dir);
    editor
        .copy_async("pool/*.txt", "mirror", &CopyOptions::default(), None)
        .await
        .unwrap();

    assert!(editor.commit().is_success());
    for i in 0..5 {
        assert_eq!(
            fs::read_to_string(dir.path().join(format!("mirror/{i}.txt"))).unwrap(),
            format!("n{i}")
        );
    }
}
