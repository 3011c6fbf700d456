use std::env;
use std::fs;
use anyhow::Result;
use oracle_api::Verdict;
use crate::capture::{FlowRecord, Ports};
use super::*;

fn bare() -> FlowRecord {
    FlowRecord {
        domain:               "none".to_owned(),
        source_ip:            "none".to_owned(),
        source_port:          "none".to_owned(),
        destination_ip:       "none".to_owned(),
        destination_port:     "none".to_owned(),
        transport_protocol:   "none".to_owned(),
        application_protocol: "unknown".to_owned(),
        verdict:              None,
    }
}

fn denied() -> FlowRecord {
    FlowRecord {
        domain:               "example.com".to_owned(),
        source_ip:            "10.0.0.1".to_owned(),
        source_port:          "1234".to_owned(),
        destination_ip:       "10.0.0.2".to_owned(),
        destination_port:     "53".to_owned(),
        transport_protocol:   "UDP".to_owned(),
        application_protocol: "dns".to_owned(),
        verdict:              Some(Verdict::Deny),
    }
}

#[test]
fn absent_layers_stored_as_null() -> Result<()> {
    let mut store = Store::open_in_memory()?;
    store.init()?;

    store.insert_batch(RAW, &[&bare()])?;

    assert_eq!(store.scalar(
        "SELECT COUNT(*) FROM new_data WHERE domain IS NULL \
         AND source_ip IS NULL AND source_port IS NULL \
         AND transport_protocol IS NULL AND verdict IS NULL",
    )?, 1);

    // "unknown" is a real value, not an absent layer
    assert_eq!(store.scalar(
        "SELECT COUNT(*) FROM new_data WHERE application_protocol = 'unknown'",
    )?, 1);

    Ok(())
}

#[test]
fn verdicts_stored_as_text() -> Result<()> {
    let mut store = Store::open_in_memory()?;
    store.init()?;

    store.insert_batch(BLOCKED, &[&denied()])?;

    assert_eq!(store.verdicts(BLOCKED)?, vec![Some("deny".to_owned())]);

    Ok(())
}

#[test]
fn truncate_respects_keep_list() -> Result<()> {
    let mut store = Store::open_in_memory()?;
    store.init()?;

    let mut ports = Ports::new();
    ports.insert("53".to_owned(), "dns".to_owned());
    store.seed_ports(&ports)?;

    store.insert_batch(RAW, &[&denied()])?;
    store.insert_batch(BLOCKED, &[&denied()])?;

    store.truncate_except(&[PORTS.to_owned()])?;

    assert_eq!(store.scalar("SELECT COUNT(*) FROM new_data")?, 0);
    assert_eq!(store.scalar("SELECT COUNT(*) FROM blocked_frames")?, 0);
    assert!(!store.ports_empty()?);

    Ok(())
}

#[test]
fn seed_and_reload_ports() -> Result<()> {
    let mut store = Store::open_in_memory()?;
    store.init()?;

    assert!(store.ports_empty()?);

    let mut ports = Ports::new();
    ports.insert("53".to_owned(), "dns".to_owned());
    ports.insert("80".to_owned(), "http".to_owned());
    store.seed_ports(&ports)?;

    assert!(!store.ports_empty()?);
    assert_eq!(store.known_ports()?, ports);

    // reseeding replaces, never duplicates
    store.seed_ports(&ports)?;
    assert_eq!(store.scalar("SELECT COUNT(*) FROM known_ports")?, 2);

    Ok(())
}

#[test]
fn load_ports_file() -> Result<()> {
    let path = env::temp_dir().join(format!("picket-ports-{}.json", std::process::id()));
    fs::write(&path, r#"{"53": "dns", "443": "https"}"#)?;

    let ports = load(path.to_str().expect("path"))?;
    fs::remove_file(&path)?;

    assert_eq!(ports.get("53"),  Some(&"dns".to_owned()));
    assert_eq!(ports.get("443"), Some(&"https".to_owned()));

    assert!(load("/nonexistent/known_ports.json").is_err());

    Ok(())
}
