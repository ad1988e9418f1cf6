// hostclean-core/tests/cleaner_integration_tests.rs
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use test_log::test; // For integrating with `env_logger` in tests

use hostclean_core::{
    Category, Cleaner, CleanerOptions, ObfuscationConfig, RedactionConfig, WalkOptions,
};

const HOSTNAME: &str = "report.test.com";
const TEST_FILE_DATA: &str = "ipv6: abcd::1\nip: 10.0.2.155\ntestword\nreport.test.com";

struct Run {
    _dir: TempDir,
    archive: PathBuf,
    reports: PathBuf,
    facts: PathBuf,
}

fn run_dirs() -> Result<Run> {
    let dir = tempdir()?;
    let archive = dir.path().join("archive");
    fs::create_dir_all(&archive)?;
    Ok(Run {
        archive,
        reports: dir.path().join("reports"),
        facts: dir.path().join("rhsm").join("insights-client.facts"),
        _dir: dir,
    })
}

fn options(run: &Run) -> CleanerOptions {
    CleanerOptions {
        report_dir: run.reports.clone(),
        facts_path: Some(run.facts.clone()),
        run_id: Some("integration".to_string()),
        walk: WalkOptions::default(),
    }
}

fn report(run: &Run, slug: &str) -> PathBuf {
    run.reports.join(format!("archive-{}.csv", slug))
}

fn read_facts(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>> {
    Ok(serde_json::from_slice(&fs::read(path)?)?)
}

fn facts_list(facts: &serde_json::Map<String, serde_json::Value>, key: &str) -> Vec<serde_json::Value> {
    serde_json::from_str(facts[key].as_str().unwrap()).unwrap()
}

#[test]
fn test_ipv4_substitution_and_report_row() -> Result<()> {
    let run = run_dirs()?;
    let file = run.archive.join("test.file");
    fs::write(&file, "ip: 10.0.2.155\n")?;

    let mut cleaner = Cleaner::new(
        ObfuscationConfig::new(true, false, false),
        RedactionConfig::default(),
        Some(HOSTNAME),
        options(&run),
    )?;
    cleaner.clean_file(&file, &[])?;
    cleaner.generate_report("archive")?;

    assert_eq!(fs::read_to_string(&file)?, "ip: 10.230.230.1\n");
    assert_eq!(
        fs::read_to_string(report(&run, "ip"))?,
        "Obfuscated IPv4,Original IPv4\n10.230.230.1,10.0.2.155\n"
    );
    assert!(!report(&run, "ipv6").exists());
    assert!(!report(&run, "hostname").exists());
    Ok(())
}

#[test]
fn test_keywords_numbered_in_first_encounter_order() -> Result<()> {
    let run = run_dirs()?;
    fs::write(run.archive.join("a"), "nothing here\nsay testword\n")?;
    fs::write(run.archive.join("b"), "otherword then testword\n")?;

    let redaction = RedactionConfig::new(Vec::<String>::new(), vec!["testword", "otherword"])?;
    let mut cleaner = Cleaner::new(ObfuscationConfig::default(), redaction, None, options(&run))?;
    cleaner.clean_archive(&run.archive)?;
    cleaner.generate_report("archive")?;

    assert_eq!(fs::read_to_string(run.archive.join("a"))?, "nothing here\nsay keyword0\n");
    assert_eq!(fs::read_to_string(run.archive.join("b"))?, "keyword1 then keyword0\n");
    assert_eq!(
        fs::read_to_string(report(&run, "keyword"))?,
        "Obfuscated Keyword,Original Keyword\nkeyword0,testword\nkeyword1,otherword\n"
    );
    Ok(())
}

#[test]
fn test_hostname_is_identical_across_runs() -> Result<()> {
    let mut labels = Vec::new();
    for run_id in ["first", "second"] {
        let run = run_dirs()?;
        let file = run.archive.join("hostname");
        fs::write(&file, format!("{}\n", HOSTNAME))?;
        let mut opts = options(&run);
        opts.run_id = Some(run_id.to_string());

        let mut cleaner = Cleaner::new(
            ObfuscationConfig::new(false, false, true),
            RedactionConfig::default(),
            Some(HOSTNAME),
            opts,
        )?;
        cleaner.clean_file(&file, &[])?;
        cleaner.generate_report("archive")?;
        labels.push(fs::read_to_string(&file)?);

        assert_eq!(
            fs::read_to_string(report(&run, "hostname"))?,
            "Obfuscated Hostname,Original Hostname\nf9fe0db0c046.example.com,report.test.com\n"
        );
    }
    assert_eq!(labels[0], "f9fe0db0c046.example.com\n");
    assert_eq!(labels[0], labels[1]);
    Ok(())
}

#[test]
fn test_all_disabled_only_drops_lines() -> Result<()> {
    let run = run_dirs()?;
    let file = run.archive.join("test.file");
    fs::write(&file, format!("{}\npassword=hunter2\n", TEST_FILE_DATA))?;

    let redaction = RedactionConfig::new(vec!["^password="], Vec::<String>::new())?;
    let mut cleaner = Cleaner::new(ObfuscationConfig::default(), redaction, Some(HOSTNAME), options(&run))?;
    let stats = cleaner.clean_archive(&run.archive)?;
    let outcome = cleaner.generate_report("archive")?;

    assert_eq!(stats.lines_dropped, 1);
    assert_eq!(fs::read_to_string(&file)?, format!("{}\n", TEST_FILE_DATA));
    assert!(outcome.reports.is_empty());
    for slug in ["ip", "ipv6", "hostname", "mac", "keyword"] {
        assert!(!report(&run, slug).exists());
    }

    let facts = read_facts(&run.facts)?;
    assert_eq!(facts["insights_client.hostname"], HOSTNAME);
    for category in ["hostname", "ipv4", "ipv6", "mac", "keyword"] {
        assert_eq!(facts[&format!("insights_client.obfuscated_{}", category)], "[]");
    }
    assert_eq!(facts["insights_client.obfuscate_ipv4_enabled"], false);
    Ok(())
}

#[test]
fn test_cross_file_reuse() -> Result<()> {
    let run = run_dirs()?;
    fs::write(run.archive.join("1_first"), "gw 192.168.1.1\n")?;
    fs::write(run.archive.join("2_second"), "peer 192.168.1.2\n")?;
    fs::write(run.archive.join("3_third"), "again 192.168.1.1\n")?;

    let mut cleaner = Cleaner::new(
        ObfuscationConfig::new(true, false, false),
        RedactionConfig::default(),
        None,
        options(&run),
    )?;
    cleaner.clean_archive(&run.archive)?;

    assert_eq!(fs::read_to_string(run.archive.join("1_first"))?, "gw 10.230.230.1\n");
    assert_eq!(fs::read_to_string(run.archive.join("2_second"))?, "peer 10.230.230.2\n");
    assert_eq!(fs::read_to_string(run.archive.join("3_third"))?, "again 10.230.230.1\n");
    assert_eq!(cleaner.store().len(Category::Ipv4)?, 2);
    Ok(())
}

#[test]
fn test_full_run_facts_document() -> Result<()> {
    let run = run_dirs()?;
    let file = run.archive.join("test.file");
    fs::write(&file, TEST_FILE_DATA)?;

    let redaction = RedactionConfig::new(Vec::<String>::new(), vec!["testword"])?;
    let mut cleaner = Cleaner::new(
        ObfuscationConfig::new(true, true, true),
        redaction,
        Some(HOSTNAME),
        options(&run),
    )?;
    cleaner.clean_file(&file, &[])?;
    cleaner.generate_report("archive")?;

    let cleaned = fs::read_to_string(&file)?;
    assert!(cleaned.contains("ip: 10.230.230.1\n"));
    assert!(cleaned.contains("keyword0\n"));
    assert!(cleaned.ends_with("f9fe0db0c046.example.com"));
    assert!(!cleaned.contains("abcd::1"));

    let facts = read_facts(&run.facts)?;
    assert_eq!(facts["insights_client.obfuscate_hostname_enabled"], true);
    let ipv6 = facts_list(&facts, "insights_client.obfuscated_ipv6");
    let obfuscated = ipv6[0]["obfuscated"].as_str().unwrap();
    assert_eq!(ipv6[0]["original"], "abcd::1");
    assert_ne!(obfuscated, "abcd::1");
    assert_eq!(obfuscated.len(), "abcd::1".len());
    assert!(cleaned.starts_with(&format!("ipv6: {}\n", obfuscated)));

    let hostnames = facts_list(&facts, "insights_client.obfuscated_hostname");
    assert_eq!(hostnames[0]["original"], HOSTNAME);
    let keywords = facts_list(&facts, "insights_client.obfuscated_keyword");
    assert_eq!(keywords[0]["obfuscated"], "keyword0");
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_facts_mode_forced_over_existing_file() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let run = run_dirs()?;
    fs::create_dir_all(run.facts.parent().unwrap())?;
    fs::write(&run.facts, "{}")?;
    fs::set_permissions(&run.facts, fs::Permissions::from_mode(0o600))?;

    let mut cleaner = Cleaner::new(
        ObfuscationConfig::new(true, false, false),
        RedactionConfig::default(),
        None,
        options(&run),
    )?;
    cleaner.generate_report("archive")?;

    let mode = fs::metadata(&run.facts)?.permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
    Ok(())
}

#[test]
fn test_clean_after_report_is_rejected() -> Result<()> {
    let run = run_dirs()?;
    let mut cleaner = Cleaner::new(
        ObfuscationConfig::default(),
        RedactionConfig::default(),
        None,
        options(&run),
    )?;
    cleaner.generate_report("archive")?;
    assert!(cleaner.clean_archive(&run.archive).is_err());
    Ok(())
}

#[test]
fn test_headless_run() -> Result<()> {
    let run = run_dirs()?;
    fs::write(run.archive.join("ifconfig"), "ether 00:1A:2B:3C:4D:5E inet 10.0.0.9\n")?;

    let summary = hostclean_core::headless_clean_archive(
        &run.archive,
        "archive",
        ObfuscationConfig::new(true, false, false).with_mac(true),
        RedactionConfig::default(),
        None,
        options(&run),
    )?;

    assert_eq!(summary.run_id, "integration");
    assert_eq!(summary.stats.files_cleaned, 1);
    assert_eq!(
        fs::read_to_string(run.archive.join("ifconfig"))?,
        "ether 02:00:00:00:00:01 inet 10.230.230.1\n"
    );
    assert!(report(&run, "mac").exists());
    Ok(())
}
