//! `TCAL_*` overrides, supplied through an explicit lookup.

use std::collections::HashMap;

use tcal_config::{
    load_layered_yaml_from_strings, load_layered_yaml_with_env, ENV_DEFAULTS_DOWNLOAD, ENV_LOG,
    ENV_REGISTRY_MAX_ENTRIES,
};

const BASE_YAML: &str = r#"
defaults:
  download: "auto"
registry:
  max_entries: 16
"#;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn env_overrides_win_over_yaml_and_change_hash() {
    let plain = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let overridden = load_layered_yaml_with_env(
        &[BASE_YAML],
        env(&[
            (ENV_DEFAULTS_DOWNLOAD, "https://example.com/d.json,1h"),
            (ENV_REGISTRY_MAX_ENTRIES, "4"),
            (ENV_LOG, "warn"),
        ]),
    )
    .unwrap();

    assert_eq!(overridden.config.defaults.download, "https://example.com/d.json,1h");
    assert_eq!(overridden.config.registry.max_entries, Some(4));
    assert_eq!(overridden.config.log.filter, "warn");
    assert_ne!(plain.config_hash, overridden.config_hash);
}

#[test]
fn empty_max_entries_means_unbounded() {
    let loaded =
        load_layered_yaml_with_env(&[BASE_YAML], env(&[(ENV_REGISTRY_MAX_ENTRIES, "")])).unwrap();
    assert_eq!(loaded.config.registry_options().max_entries, None);
}

#[test]
fn malformed_overrides_are_rejected() {
    let not_a_number = env(&[(ENV_REGISTRY_MAX_ENTRIES, "many")]);
    assert!(load_layered_yaml_with_env(&[BASE_YAML], not_a_number).is_err());

    let bad_scheme = env(&[(ENV_DEFAULTS_DOWNLOAD, "gopher://x")]);
    assert!(load_layered_yaml_with_env(&[BASE_YAML], bad_scheme).is_err());
}

#[test]
fn options_carry_through() {
    let loaded = load_layered_yaml_from_strings(&[
        "defaults:\n  auto_url: \"https://example.com/auto.json\"\n  auto_period_secs: 60\n",
    ])
    .unwrap();
    let opts = loaded.config.manager_options();
    assert_eq!(opts.auto_url.as_deref(), Some("https://example.com/auto.json"));
    assert_eq!(opts.auto_period.as_secs(), 60);
    assert_eq!(loaded.config.fetch_timeout().as_millis(), 10_000);
}
