//! Config files feeding the calendar.

use std::io::Write;
use std::sync::Arc;

use bazi_config::{BaziConfig, ConfigError, OutputFormat};
use bazi_core::{CalendarConverter, SolarTerm, SolarTermCache};

fn write(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn missing_config_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(
        BaziConfig::load_from(&dir.path().join("config.toml"))
            .unwrap()
            .is_none()
    );
}

#[test]
fn malformed_config_reports_path() {
    let file = write("[calendar\n");
    let err = BaziConfig::load_from(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn configured_offset_moves_term_instants() {
    let file = write("[calendar]\nutc_offset_minutes = 540\n[output]\nformat = \"csv\"\n");
    let config = BaziConfig::load_from(file.path()).unwrap().unwrap();
    assert_eq!(config.output_format(), Some(OutputFormat::Csv));

    let offset = config.utc_offset_minutes().unwrap();
    let tokyo = CalendarConverter::new(Arc::new(SolarTermCache::new(offset)));
    let beijing = CalendarConverter::default();
    let a = tokyo.term_instant(2024, SolarTerm::LiChun).unwrap();
    let b = beijing.term_instant(2024, SolarTerm::LiChun).unwrap();
    assert_eq!((a - b).num_minutes(), 60);
}
