//! End-to-end coverage of the `packctl` binary (`spec §6` CLI surface),
//! exercised the way the teacher workspace drives its own CLI: through
//! `assert_cmd` against the built binary rather than calling command
//! functions directly, so flag parsing and process exit codes are covered
//! too.

use assert_cmd::Command;
use camino::Utf8PathBuf;
use pack_fixture::{PackFixture, RegistryFixture};
use predicates::prelude::*;
use tempfile::TempDir;

fn packctl_cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

#[test]
fn init_scaffolds_a_pack_and_refuses_to_clobber_it() {
    let workdir = TempDir::new().unwrap();
    let dir = utf8_dir(&workdir);

    packctl_cmd()
        .args(["init", "web", "--directory"])
        .arg(dir.as_str())
        .assert()
        .success();

    assert!(dir.join("web/metadata.hcl").exists());
    assert!(dir.join("web/variables.hcl").exists());
    assert!(dir.join("web/templates/web.tpl").exists());

    packctl_cmd()
        .args(["init", "web", "--directory"])
        .arg(dir.as_str())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn registry_add_vendors_a_local_pack_tree_and_lists_it() {
    let source = TempDir::new().unwrap();
    let source_dir = utf8_dir(&source);
    RegistryFixture::new()
        .with_pack(PackFixture::new("web").with_template("job", "job \"web\" {}"))
        .write_to(&source_dir)
        .unwrap();

    let cache = TempDir::new().unwrap();
    let cache_dir = utf8_dir(&cache);

    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["registry", "add", "community"])
        .arg(source_dir.as_str())
        .assert()
        .success()
        .stdout(predicate::str::contains("added 1 pack(s) to registry community"));

    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["registry", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("community"))
        .stdout(predicate::str::contains("1 pack(s)"));

    assert!(
        cache_dir
            .join("community/latest/web@latest/metadata.hcl")
            .exists(),
        "vendored pack should resolve at the ordinary latest ref path"
    );
}

#[test]
fn registry_delete_removes_a_previously_added_registry() {
    let source = TempDir::new().unwrap();
    let source_dir = utf8_dir(&source);
    RegistryFixture::new()
        .with_pack(PackFixture::new("web"))
        .write_to(&source_dir)
        .unwrap();

    let cache = TempDir::new().unwrap();
    let cache_dir = utf8_dir(&cache);

    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["registry", "add", "community"])
        .arg(source_dir.as_str())
        .assert()
        .success();

    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["registry", "delete", "community"])
        .assert()
        .success();

    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["registry", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("community").not());
}

#[test]
fn registry_add_rejects_an_empty_source() {
    let cache = TempDir::new().unwrap();
    let cache_dir = utf8_dir(&cache);

    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["registry", "add", "community", ""])
        .assert()
        .failure();
}

#[test]
fn render_writes_templates_to_a_directory_and_guards_against_overwrite() {
    let source = TempDir::new().unwrap();
    let source_dir = utf8_dir(&source);
    RegistryFixture::new()
        .with_pack(
            PackFixture::new("web")
                .with_template("job", "job \"{{ nomad_pack.pack.name }}\" {\n  type = \"service\"\n}"),
        )
        .write_to(&source_dir)
        .unwrap();

    let cache = TempDir::new().unwrap();
    let cache_dir = utf8_dir(&cache);
    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["registry", "add", "community"])
        .arg(source_dir.as_str())
        .assert()
        .success();

    let out = TempDir::new().unwrap();
    let out_dir = utf8_dir(&out);

    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["render", "community/web", "-o"])
        .arg(out_dir.as_str())
        .assert()
        .success();

    let rendered = out_dir.join("web_templates_job");
    assert!(rendered.exists());
    assert!(fs_err::read_to_string(&rendered).unwrap().contains("job \"web\""));

    // rerunning without --overwrite must fail rather than clobber the file
    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["render", "community/web", "-o"])
        .arg(out_dir.as_str())
        .assert()
        .failure()
        .stderr(predicate::str::contains("overwrite"));

    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["render", "community/web", "-o"])
        .arg(out_dir.as_str())
        .arg("--overwrite")
        .assert()
        .success();
}

#[test]
fn info_reports_an_unresolvable_pack_as_a_failure() {
    let cache = TempDir::new().unwrap();
    let cache_dir = utf8_dir(&cache);

    packctl_cmd()
        .args(["--cache-root"])
        .arg(cache_dir.as_str())
        .args(["info", "community/does-not-exist"])
        .assert()
        .failure();
}
