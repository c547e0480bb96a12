//! End-to-end pipeline tests: resolve, load, transform, write back

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use x3_patcher::{
    FileManager, GeneratedFile, MemoryArchive, Result, Settings, Transform, add_script,
    remove_script, run, write_files,
};

const SHIELDS: &str = "\
// Shield table
14;2;
1;2;3;1234;5;96.5;1000;7;8;9;10;11;SS_SHIELD_A;
1;2;3;1235;5;97.0;5000;7;8;9;10;11;SS_SHIELD_B;
";

const GLOBALS: &str = "// globals\n2;\nSG_MAX_X;100000;\nSG_MAX_Y;100000;\n";

const UNIVERSE: &str =
    "<?xml version=\"1.0\" encoding=\"ISO-8859-1\" ?>\n<universe>\n  <sector x=\"1\" y=\"1\" />\n</universe>\n";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn base_archive() -> MemoryArchive {
    let mut archive = MemoryArchive::new("01.cat");
    archive.insert("types/TShields.txt", SHIELDS.as_bytes());
    archive.insert("types/Globals.txt", GLOBALS.as_bytes());
    archive.insert("maps/x3_universe.xml", UNIVERSE.as_bytes());
    archive.insert("L/x3story.obj", vec![0x0Du8, 0x00, 0x05, 0x86, 0x0E]);
    archive
}

fn manager_for(output: &Path) -> FileManager {
    init_logging();
    let mut manager = FileManager::new(Settings::new(output));
    manager.add_archive(Box::new(base_archive()));
    manager
}

fn scale_shield_efficiency(manager: &mut FileManager) -> Result<()> {
    let table = manager.load_table("types/TShields.txt")?;
    for row in table.data_rows_mut() {
        let value: f64 = row.get("efficiency").unwrap_or("0").parse().unwrap_or(0.0);
        row.set("efficiency", format!("{:.1}", value * 2.0));
    }
    Ok(())
}

fn raise_map_limits(manager: &mut FileManager) -> Result<()> {
    let table = manager.load_table("types/Globals.txt")?;
    for row in table.data_rows_mut() {
        row.set("value", "200000");
    }
    Ok(())
}

fn read_shield_ids(manager: &mut FileManager) -> Result<()> {
    // Loads but never mutates; must not cause a write.
    let table = manager.load_table("types/TShields.txt")?;
    let ids: Vec<String> = table
        .data_rows()
        .filter_map(|row| row.get("id").map(str::to_string))
        .collect();
    assert_eq!(ids, vec!["SS_SHIELD_A", "SS_SHIELD_B"]);
    Ok(())
}

#[test]
fn run_writes_only_dirty_files() {
    init_logging();
    let out = tempfile::tempdir().unwrap();
    let transforms = [
        Transform {
            name: "scale_shield_efficiency",
            requires: &["types/TShields.txt"],
            apply: scale_shield_efficiency,
        },
        Transform {
            name: "read_shield_ids",
            requires: &["types/TShields.txt"],
            apply: read_shield_ids,
        },
    ];

    let report = run(
        Settings::new(out.path()),
        vec![Box::new(base_archive())],
        &transforms,
    )
    .unwrap();

    assert_eq!(report.written, vec!["types/TShields.txt"]);
    assert!(report.failures.is_empty());

    let written = fs::read_to_string(out.path().join("types").join("TShields.txt")).unwrap();
    assert_eq!(
        written,
        "\
// Shield table
14;2;
1;2;3;1234;5;193.0;1000;7;8;9;10;11;SS_SHIELD_A;
1;2;3;1235;5;194.0;5000;7;8;9;10;11;SS_SHIELD_B;
"
    );

    // The map and the opcode blob were never loaded, let alone written.
    assert!(!out.path().join("maps").exists());
    assert!(!out.path().join("L").exists());
}

#[test]
fn cache_shares_one_instance_across_transforms() {
    let out = tempfile::tempdir().unwrap();
    let mut manager = manager_for(out.path());

    let transforms = [
        Transform {
            name: "scale_shield_efficiency",
            requires: &["types/TShields.txt"],
            apply: scale_shield_efficiency,
        },
        Transform {
            name: "scale_shield_efficiency_again",
            requires: &["types/TShields.txt"],
            apply: scale_shield_efficiency,
        },
    ];
    manager.run_all(&transforms).unwrap();

    // Both transforms edited the same instance: 96.5 * 2 * 2.
    let table = manager.load_table("types/TShields.txt").unwrap();
    assert_eq!(
        table.data_rows().next().unwrap().get("efficiency"),
        Some("386.0")
    );
    assert_eq!(manager.loaded_count(), 1);
}

#[test]
fn missing_dependency_skips_without_aborting_run() {
    let out = tempfile::tempdir().unwrap();
    let mut manager = manager_for(out.path());

    fn needs_missing(_manager: &mut FileManager) -> Result<()> {
        panic!("must not run with unsatisfied dependencies");
    }
    let transforms = [
        Transform {
            name: "needs_missing",
            requires: &["types/TMissiles.txt"],
            apply: needs_missing,
        },
        Transform {
            name: "raise_map_limits",
            requires: &["types/Globals.txt"],
            apply: raise_map_limits,
        },
    ];
    manager.run_all(&transforms).unwrap();

    let report = write_files(&manager);
    assert_eq!(report.written, vec!["types/Globals.txt"]);
}

#[test]
fn loose_source_tree_overrides_archive() {
    let dirs = tempfile::tempdir().unwrap();
    let source = dirs.path().join("patch_source");
    let out = dirs.path().join("addon");
    fs::create_dir_all(source.join("types")).unwrap();
    fs::write(
        source.join("types").join("Globals.txt"),
        "2;\nSG_MAX_X;1;\nSG_MAX_Y;1;\n",
    )
    .unwrap();

    let settings = Settings::new(&out).with_source_dir(&source);
    let mut manager = FileManager::new(settings);
    manager.add_archive(Box::new(base_archive()));

    let table = manager.load_table("types/Globals.txt").unwrap();
    assert_eq!(table.data_rows().count(), 2);
    assert_eq!(table.data_rows().next().unwrap().get("value"), Some("1"));
}

#[test]
fn xml_edit_preserves_declared_encoding() {
    let out = tempfile::tempdir().unwrap();
    let mut manager = manager_for(out.path());

    let xml = manager.load_xml("maps/x3_universe.xml").unwrap();
    assert_eq!(xml.encoding(), "iso-8859-1");
    let patched = xml.text().replace("x=\"1\"", "x=\"5\"");
    xml.set_text(patched);

    write_files(&manager).into_result().unwrap();
    let written = fs::read(out.path().join("maps").join("x3_universe.xml")).unwrap();
    let text = String::from_utf8(written).unwrap(); // pure ASCII here
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"ISO-8859-1\" ?>"));
    assert!(text.contains("x=\"5\""));
}

#[test]
fn binary_patch_round_trip() {
    let out = tempfile::tempdir().unwrap();
    let mut manager = manager_for(out.path());

    let blob = manager.load_binary("L/x3story.obj").unwrap();
    let offset = blob.find(&[0x05, 0x86]).unwrap();
    blob.patch(offset, &[0x05, 0x87]).unwrap();

    write_files(&manager).into_result().unwrap();
    assert_eq!(
        fs::read(out.path().join("L").join("x3story.obj")).unwrap(),
        vec![0x0D, 0x00, 0x05, 0x87, 0x0E]
    );
}

#[test]
fn generated_file_lands_in_output_tree() {
    let out = tempfile::tempdir().unwrap();
    let mut manager = manager_for(out.path());
    manager
        .add_generated(
            "t/9999-L044.xml",
            GeneratedFile::text("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<language id=\"44\"/>"),
        )
        .unwrap();

    write_files(&manager).into_result().unwrap();
    let written = fs::read_to_string(out.path().join("t").join("9999-L044.xml")).unwrap();
    assert!(written.ends_with("<language id=\"44\"/>\n"));
}

#[test]
fn unmodified_round_trip_is_byte_identical() {
    let out = tempfile::tempdir().unwrap();
    let mut manager = manager_for(out.path());

    // Load everything, mutate nothing, then force-serialize by hand to
    // compare against the original bytes.
    let table = manager.load_table("types/TShields.txt").unwrap();
    assert_eq!(table.serialize(), SHIELDS);
    let xml = manager.load_xml("maps/x3_universe.xml").unwrap();
    assert_eq!(xml.encoded().unwrap(), UNIVERSE.as_bytes());

    // And the write-back engine skips all of it.
    let report = write_files(&manager);
    assert!(report.written.is_empty());
    assert_eq!(report.skipped.len(), 2);
}

#[test]
fn append_rows_across_transforms() {
    let out = tempfile::tempdir().unwrap();
    let mut manager = manager_for(out.path());

    fn add_globals(manager: &mut FileManager) -> Result<()> {
        let table = manager.load_table("types/Globals.txt")?;
        let row = table.new_row(vec!["SG_NEW", "7"])?;
        table.add_rows(vec![row])?;
        Ok(())
    }
    let transform = Transform {
        name: "add_globals",
        requires: &["types/Globals.txt"],
        apply: add_globals,
    };
    manager.run(&transform).unwrap();

    // Header counter bumped by exactly one, data rows grew by one, and a
    // later reader sees the appended row.
    let table = manager.load_table("types/Globals.txt").unwrap();
    assert_eq!(table.data_row_count(), 3);
    assert_eq!(
        table.serialize(),
        "// globals\n3;\nSG_MAX_X;100000;\nSG_MAX_Y;100000;\nSG_NEW;7;\n"
    );
}

#[test]
fn add_remove_script_round_trip() {
    let dirs = tempfile::tempdir().unwrap();
    let overrides = dirs.path().join("overrides");
    let scripts = dirs.path().join("scripts");
    fs::create_dir_all(&overrides).unwrap();
    fs::create_dir_all(&scripts).unwrap();
    fs::write(overrides.join("foo.xml"), "<script/>\n").unwrap();
    fs::write(scripts.join("foo.pck"), b"compiled").unwrap();

    add_script(&overrides, &scripts, "foo").unwrap();
    assert!(scripts.join("foo.xml").is_file());
    assert!(scripts.join("foo.pck.x3c.bak").is_file());
    assert!(!scripts.join("foo.pck").exists());

    remove_script(&scripts, "foo").unwrap();
    assert!(!scripts.join("foo.xml").exists());
    assert!(!scripts.join("foo.pck.x3c.bak").exists());
    assert_eq!(fs::read(scripts.join("foo.pck")).unwrap(), b"compiled");
}
