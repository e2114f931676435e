//! Property-style checks of resolution precedence and the path codec,
//! exercised over every path of the application fixture.

mod common;

use common::{PREFIX, application_yaml, loaded, loaded_in};
use std::collections::HashMap;
use tiered_config::config::{ConfigSource, Value, override_name, parse_documents};
use tiered_config::config::DocumentFormat;

/// Every lookup path reachable in `value`, with the value found there.
fn collect_paths(prefix: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                out.push((path.clone(), child.clone()));
                collect_paths(&path, child, out);
            }
        }
        Value::Sequence(items) => {
            for (i, child) in items.iter().enumerate() {
                let path = format!("{}[{}]", prefix, i);
                out.push((path.clone(), child.clone()));
                collect_paths(&path, child, out);
            }
        }
        _ => {}
    }
}

fn default_paths() -> Vec<(String, Value)> {
    let documents = parse_documents(application_yaml(), DocumentFormat::Yaml).unwrap();
    let mut paths = Vec::new();
    collect_paths("", &documents[0], &mut paths);
    paths
}

#[test]
fn every_default_path_resolves_to_its_tree_value() {
    let manager = loaded(&[]);
    for (path, expected) in default_paths() {
        assert_eq!(manager.get(&path).unwrap(), Some(expected), "path {}", path);
    }
}

#[test]
fn override_names_are_unique_across_fixture_paths() {
    let mut seen: HashMap<String, String> = HashMap::new();
    for (path, _) in default_paths() {
        let name = override_name(PREFIX, &path).unwrap();
        if let Some(previous) = seen.insert(name.clone(), path.clone()) {
            panic!("{} and {} both encode to {}", previous, path, name);
        }
    }
}

#[test]
fn override_name_is_deterministic() {
    for (path, _) in default_paths() {
        assert_eq!(
            override_name(PREFIX, &path).unwrap(),
            override_name(PREFIX, &path).unwrap()
        );
    }
}

#[test]
fn override_wins_for_every_path_and_environment() {
    for (path, _) in default_paths() {
        let variable = override_name(PREFIX, &path).unwrap();
        let vars = [(variable.as_str(), "overridden")];
        for environment in ["default", "non-default"] {
            let manager = loaded_in(environment, &vars);
            assert_eq!(
                manager.get(&path).unwrap(),
                Some(Value::from("overridden")),
                "path {} in {}",
                path,
                environment
            );
        }
    }
}

#[test]
fn default_values_visible_from_non_default_environment() {
    let manager = loaded_in("non-default", &[]);
    let overridden_in_non_default = [
        "my.nested.config.an_int",
        "my.nested.config",
        "my.nested",
        "my",
    ];
    for (path, expected) in default_paths() {
        if overridden_in_non_default.contains(&path.as_str()) {
            continue;
        }
        assert_eq!(manager.get(&path).unwrap(), Some(expected), "path {}", path);
    }
}

#[test]
fn absent_paths_never_fail() {
    let manager = loaded(&[]);
    for path in [
        "does.not.exist",
        "my.nested.config.missing",
        "my.missing[4]",
        "",
        "my..nested",
        "a[x].b",
    ] {
        assert_eq!(manager.get(path).unwrap(), None, "path {:?}", path);
    }
}

#[test]
fn loading_twice_is_idempotent() {
    let mut manager = loaded(&[("TEST__MY__NESTED__CONFIG__AN_INT", "7")]);
    let before: Vec<Option<Value>> = default_paths()
        .iter()
        .map(|(p, _)| manager.get(p).unwrap())
        .collect();
    manager
        .load_configs(ConfigSource::yaml(application_yaml()))
        .unwrap();
    let after: Vec<Option<Value>> = default_paths()
        .iter()
        .map(|(p, _)| manager.get(p).unwrap())
        .collect();
    assert_eq!(before, after);
}
