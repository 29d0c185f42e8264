use std::fs;
use std::path::{Path, PathBuf};

fn rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

fn rel(path: &Path) -> String {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    rel.replace('\\', "/")
}

#[test]
fn consumer_side_cannot_reach_sensors() {
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let consumer_files = [
        src.join("poller.rs"),
        src.join("synthetic.rs"),
        src.join("system/history.rs"),
    ];
    let forbidden = [
        "crate::system::sensors",
        "crate::system::acquisition",
        "crate::system::collector",
        "crate::system::platform",
        "sysinfo",
    ];
    let mut violations = Vec::new();

    for file in consumer_files {
        let content = fs::read_to_string(&file).unwrap_or_default();
        assert!(!content.is_empty(), "{} missing or empty", rel(&file));
        for needle in forbidden {
            if content.contains(needle) {
                violations.push(format!(
                    "{} imports privileged dependency `{}`",
                    rel(&file),
                    needle
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Bridge boundary violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn bridge_exposes_only_four_requests() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/bridge.rs");
    let content = fs::read_to_string(&path).unwrap_or_default();
    let start = content
        .find("pub enum MetricsRequest {")
        .expect("MetricsRequest enum not found");
    let body = &content[start..];
    let end = body.find('}').expect("unterminated MetricsRequest enum");
    let variants = body[..end]
        .lines()
        .skip(1)
        .filter(|line| line.trim().ends_with("),"))
        .count();
    assert_eq!(variants, 4, "MetricsRequest must carry exactly four requests");
}

#[test]
fn target_os_cfg_is_scoped_to_system_platform() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        if !content.contains("target_os") {
            continue;
        }

        let rel_path = rel(&file);
        if !rel_path.starts_with("src/system/platform/") {
            violations.push(format!(
                "{} contains `target_os` cfg but is outside allowed boundary",
                rel_path
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Unexpected target_os cfg usage:\n{}",
        violations.join("\n")
    );
}
