use kpt_core::{Error, PatchStatus, Session};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const MARGINS: &str = "# Generated by kobopatch\n\
\n\
<Patch>\n\
patch_name = `Custom left & right margins`\n\
patch_group = `Margins`\n\
patch_enable = `no`\n\
## Multi-version patch\n\
# Lets you shrink the side margins.\n\
replace_int = 558266, 6, 2\n\
replace_int = 558312, 6, 2\n\
</Patch>\n\
\n\
<Patch>\n\
patch_name = `Thinner progress bar`\n\
patch_enable = `yes`\n\
replace_bytes = 0007A2, 06 30, 08 30\n\
</Patch>\n";

const SLEEP: &str = "<Patch>\n\
patch_name = `Ignore sleepcover events`\n\
patch_enable = `no`\n\
find_base_address = `_ZN11PowerWidget4initEv`\n\
</Patch>\n";

fn write_batch(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let a = dir.join("margins.patch");
    let b = dir.join("sleep.patch");
    fs::write(&a, MARGINS).unwrap();
    fs::write(&b, SLEEP).unwrap();
    (a, b)
}

#[test]
fn test_load_exposes_records() {
    let dir = tempdir().unwrap();
    let (a, b) = write_batch(dir.path());
    let session = Session::load(&[a, b]).unwrap();

    let margins = &session.files()[0];
    assert_eq!(margins.options.len(), 2);
    assert_eq!(margins.options[0].name, "Custom left & right margins");
    assert_eq!(margins.options[0].group.as_deref(), Some("Margins"));
    assert_eq!(margins.options[0].status, PatchStatus::Disabled);
    assert!(margins.options[0].help_text.contains("side margins"));
    assert_eq!(margins.options[1].group, None);
    assert!(margins.option_by_name("Thinner progress bar").is_some());
    assert!(margins.option_by_name("No such option").is_none());

    let sleep = &session.files()[1];
    assert_eq!(sleep.options.len(), 1);
    assert_eq!(sleep.options[0].status, PatchStatus::Disabled);
}

#[test]
fn test_toggle_and_apply_changes_one_token() {
    let dir = tempdir().unwrap();
    let (a, b) = write_batch(dir.path());
    let mut session = Session::load(&[a.clone(), b.clone()]).unwrap();

    assert!(session.set_status_by_name(&a, "Custom left & right margins", PatchStatus::Enabled));
    let written = session.apply().unwrap();
    assert_eq!(written, vec![a.clone()]);

    let expected = MARGINS.replacen("patch_enable = `no`", "patch_enable = `yes`", 1);
    assert_eq!(fs::read_to_string(&a).unwrap(), expected);
    assert_eq!(fs::read_to_string(&b).unwrap(), SLEEP);
}

#[test]
fn test_toggle_on_then_off_reproduces_original() {
    let dir = tempdir().unwrap();
    let (a, b) = write_batch(dir.path());
    let mut session = Session::load(&[a.clone(), b]).unwrap();

    session.set_status(&a, 0, PatchStatus::Enabled);
    session.set_status(&a, 0, PatchStatus::Disabled);

    assert!(!session.is_modified());
    assert!(session.apply().unwrap().is_empty());
    assert_eq!(fs::read_to_string(&a).unwrap(), MARGINS);
}

#[test]
fn test_disable_all_then_apply() {
    let dir = tempdir().unwrap();
    let (a, b) = write_batch(dir.path());
    let mut session = Session::load(&[a.clone(), b.clone()]).unwrap();

    session.disable_all();
    let written = session.apply().unwrap();
    assert_eq!(written, vec![a.clone()]);

    let expected = MARGINS.replacen("patch_enable = `yes`", "patch_enable = `no`", 1);
    assert_eq!(fs::read_to_string(&a).unwrap(), expected);
    // Everything in the sleepcover file was already disabled.
    assert_eq!(fs::read_to_string(&b).unwrap(), SLEEP);
}

#[test]
fn test_restore_defaults_then_apply_writes_nothing() {
    let dir = tempdir().unwrap();
    let (a, b) = write_batch(dir.path());
    let mut session = Session::load(&[a.clone(), b.clone()]).unwrap();

    session.disable_all();
    session.set_status(&b, 0, PatchStatus::Enabled);
    session.restore_defaults();

    assert!(session.apply().unwrap().is_empty());
    assert_eq!(fs::read_to_string(&a).unwrap(), MARGINS);
    assert_eq!(fs::read_to_string(&b).unwrap(), SLEEP);
}

#[test]
fn test_reload_after_apply_roundtrips() {
    let dir = tempdir().unwrap();
    let (a, b) = write_batch(dir.path());
    let mut session = Session::load(&[a.clone(), b.clone()]).unwrap();

    session.set_status(&a, 1, PatchStatus::Disabled);
    session.set_status(&b, 0, PatchStatus::Enabled);
    session.apply().unwrap();

    let reloaded = Session::load(&[a, b]).unwrap();
    assert_eq!(reloaded.files()[0].options[1].status, PatchStatus::Disabled);
    assert_eq!(reloaded.files()[1].options[0].status, PatchStatus::Enabled);
    assert!(!reloaded.is_modified());
}

#[test]
fn test_apply_batch_is_all_or_nothing() {
    let dir = tempdir().unwrap();
    let (a, _) = write_batch(dir.path());

    // The second file lives in a subdirectory that disappears after load, so
    // its staging write fails even though the first file is serializable.
    let sub = dir.path().join("extra");
    fs::create_dir(&sub).unwrap();
    let c = sub.join("sleep.patch");
    fs::write(&c, SLEEP).unwrap();

    let mut session = Session::load(&[a.clone(), c.clone()]).unwrap();
    session.set_status(&a, 0, PatchStatus::Enabled);
    session.set_status(&c, 0, PatchStatus::Enabled);

    fs::remove_file(&c).unwrap();
    fs::remove_dir(&sub).unwrap();

    let err = session.apply().unwrap_err();
    assert!(matches!(err, Error::Write { .. }));

    // The first file must be untouched, with no stray staging files left.
    assert_eq!(fs::read_to_string(&a).unwrap(), MARGINS);
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .filter(|name| name.to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    // Edits survive the failed apply so the user can retry.
    assert!(session.is_modified());
}

#[test]
fn test_load_reports_malformed_file() {
    let dir = tempdir().unwrap();
    let (a, _) = write_batch(dir.path());
    let broken = dir.path().join("broken.patch");
    fs::write(&broken, "<Patch>\npatch_name = `X`\n").unwrap();

    let err = Session::load(&[a, broken]).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
    let msg = err.to_string();
    assert!(msg.contains("broken.patch"));
    assert!(msg.contains("line 1"));
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.patch");

    let err = Session::load(&[missing.clone()]).unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
    assert!(err.to_string().contains("absent.patch"));
}
