use rambench::error;
use rambench::{BenchmarkConfig, BenchmarkRequest, RamBenchError};

#[test]
fn test_user_friendly_messages() {
    let msg = error::user_friendly_message(&RamBenchError::AllocationError { requested: 1 << 31 });
    assert!(msg.contains("smaller"));

    let msg = error::user_friendly_message(&RamBenchError::AcceleratedUnavailable("x".into()));
    assert!(msg.to_lowercase().contains("portable"));

    let msg = error::user_friendly_message(&RamBenchError::BenchmarkError("boom".into()));
    assert!(msg.contains("boom"));
}

#[test]
fn test_invalid_request_errors() {
    assert!(matches!(
        BenchmarkRequest::from_megabytes(true, 0, 1),
        Err(RamBenchError::InvalidSize(_))
    ));
    assert!(matches!(
        BenchmarkRequest::new(64, 0, true),
        Err(RamBenchError::ConfigError(_))
    ));
}

#[test]
fn test_toml_errors_convert_to_config_errors() {
    let parsed: Result<BenchmarkConfig, RamBenchError> =
        toml::from_str::<BenchmarkConfig>("size_mb = \"big\"").map_err(RamBenchError::from);
    assert!(matches!(parsed, Err(RamBenchError::ConfigError(_))));
}

#[test]
fn test_io_errors_convert() {
    let err: RamBenchError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
    assert!(err.to_string().contains("disk"));
}
