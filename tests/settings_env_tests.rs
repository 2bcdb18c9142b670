//! Environment overrides live in their own test binary so they cannot leak into other tests.

use std::fs;

use mcstore::load_config;

#[test]
fn environment_overrides_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mcstore.toml");
    fs::write(&path, "capacity = 120\nmax_series = 500\n").expect("write config");

    std::env::set_var("MCSTORE_CAPACITY", "30");
    let config = load_config(Some(&path));
    std::env::remove_var("MCSTORE_CAPACITY");

    let config = config.expect("load config");
    assert_eq!(config.capacity, 30);
    assert_eq!(config.max_series, Some(500));
}
