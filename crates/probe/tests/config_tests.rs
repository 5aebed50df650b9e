//! Integration tests for configuration parsing
//!
//! Covers:
//! - Minimal and full probe configuration files
//! - Policy selection
//! - Invalid configuration handling
//! - Save/load through the filesystem
//! - Lookup order across candidate locations

use probe::{PolicyKind, ProbeConfig, ProbeTarget};
use std::time::Duration;

const MINIMAL_CONFIG: &str = r#"
[probe]
log_level = "info"
"#;

const FULL_CONFIG: &str = r#"
[probe]
log_level = "debug"

[device]
vendor_id = "0x1d50"
product_id = "0x6018"
interface = 1
alternate_setting = 1
endpoint = 4
read_size = 128
timeout_ms = 250
detach_kernel_driver = false

[poll]
interval_ms = 100
policy = "stop-on-disconnect"
max_iterations = 20

[reports]
interface = 3
endpoint = 6
read_size = 32
"#;

mod parsing {
    use super::*;

    #[test]
    fn test_minimal_config_uses_descriptor_defaults() {
        let config = ProbeConfig::parse(MINIMAL_CONFIG).unwrap();

        assert_eq!(config.target().unwrap(), ProbeTarget::framer_control());
        assert_eq!(
            config.report_target().unwrap(),
            ProbeTarget::interrupt_reports()
        );
        assert_eq!(config.poll.interval(), Duration::from_millis(500));
        assert_eq!(config.poll.policy, PolicyKind::AlwaysContinue);
        assert_eq!(config.poll.max_iterations, None);
        assert!(config.device.detach_kernel_driver);
    }

    #[test]
    fn test_empty_file_is_valid() {
        let config = ProbeConfig::parse("").unwrap();
        assert_eq!(config.probe.log_level, "info");
    }

    #[test]
    fn test_full_config() {
        let config = ProbeConfig::parse(FULL_CONFIG).unwrap();
        let target = config.target().unwrap();

        assert_eq!(target.vendor_id, 0x1d50);
        assert_eq!(target.product_id, 0x6018);
        assert_eq!(target.interface, 1);
        assert_eq!(target.alternate_setting, 1);
        assert_eq!(target.endpoint, 4);
        assert_eq!(target.read_size, 128);
        assert_eq!(target.timeout, Duration::from_millis(250));
        assert!(!config.device.detach_kernel_driver);

        assert_eq!(config.poll.interval(), Duration::from_millis(100));
        assert_eq!(config.poll.policy, PolicyKind::StopOnDisconnect);
        assert_eq!(config.poll.max_iterations, Some(20));
    }

    #[test]
    fn test_report_target_keeps_device_ids() {
        let config = ProbeConfig::parse(FULL_CONFIG).unwrap();
        let target = config.report_target().unwrap();

        assert_eq!(target.vendor_id, 0x1d50);
        assert_eq!(target.interface, 3);
        assert_eq!(target.endpoint, 6);
        assert_eq!(target.read_size, 32);
        assert_eq!(target.alternate_setting, 0);
        assert_eq!(target.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_timeout_is_allowed() {
        let config = ProbeConfig::parse("[device]\ntimeout_ms = 0\n").unwrap();
        assert_eq!(config.target().unwrap().timeout, Duration::ZERO);
    }
}

mod invalid {
    use super::*;

    #[test]
    fn test_bad_log_level() {
        let err = ProbeConfig::parse("[probe]\nlog_level = \"loud\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid log level"));
    }

    #[test]
    fn test_vendor_id_without_prefix() {
        assert!(ProbeConfig::parse("[device]\nvendor_id = \"16d0\"\n").is_err());
    }

    #[test]
    fn test_unknown_policy() {
        assert!(ProbeConfig::parse("[poll]\npolicy = \"retry-forever\"\n").is_err());
    }

    #[test]
    fn test_zero_read_size() {
        assert!(ProbeConfig::parse("[device]\nread_size = 0\n").is_err());
        assert!(ProbeConfig::parse("[reports]\nread_size = 0\n").is_err());
    }

    #[test]
    fn test_endpoint_out_of_range() {
        assert!(ProbeConfig::parse("[device]\nendpoint = 0\n").is_err());
        assert!(ProbeConfig::parse("[reports]\nendpoint = 16\n").is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(ProbeConfig::parse("[device\nvendor_id = ").is_err());
    }
}

mod filesystem {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("probe.toml");

        let mut config = ProbeConfig::default();
        config.device.timeout_ms = 42;
        config.poll.policy = PolicyKind::StopOnDisconnect;
        config.save(&path).unwrap();

        let loaded = ProbeConfig::load(&path).unwrap();
        assert_eq!(loaded.device.timeout_ms, 42);
        assert_eq!(loaded.poll.policy, PolicyKind::StopOnDisconnect);
        assert_eq!(loaded.target().unwrap().vendor_id, 0x16d0);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProbeConfig::load(&dir.path().join("absent.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[probe]\nlog_level = \"nope\"\n").unwrap();

        let err = ProbeConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.toml"));
    }

    #[test]
    fn test_invalid_default_file_is_not_replaced_by_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let system = dir.path().join("system.toml");
        std::fs::write(&user, "[device]\nvendor_id = \"1d50\"\n").unwrap();
        ProbeConfig::default().save(&system).unwrap();

        let err = ProbeConfig::load_first(vec![user, system]).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("user.toml"));
        assert!(message.contains("Invalid vendor_id '1d50'"));
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("system.toml");
        std::fs::write(&system, "[device]\ntimeout_ms = 7\n").unwrap();

        let config = ProbeConfig::load_first(vec![dir.path().join("absent.toml"), system])
            .unwrap()
            .unwrap();
        assert_eq!(config.device.timeout_ms, 7);
    }

    #[test]
    fn test_no_candidate_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let found = ProbeConfig::load_first(vec![dir.path().join("absent.toml")]).unwrap();
        assert!(found.is_none());
    }
}
