// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cv_core::{Infrastructure, JobSpec};
use std::path::PathBuf;
use yare::parameterized;

const PIPELINE: &str = r#"
name = "shop-release"
revision = 3

[[params]]
name = "region"
value = "us"

[[stages]]
name = "build"
parallel = true

[[stages.jobs]]
name = "compile"
type = "freestyle"
error_policy = "continue"

[stages.jobs.spec]
runtime = { infrastructure = "local" }

[[stages.jobs.spec.steps]]
name = "make"
type = "shell"
script = "make REGION={{.workflow.params.region}}"

[[stages]]
name = "ship"
approval = { kind = "manual", approvers = ["lead"], timeout_mins = 30 }
"#;

fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn loads_a_toml_definition() {
    let dir = tempfile::tempdir().unwrap();
    let def = load_definition(&write(&dir, "shop.toml", PIPELINE)).unwrap();

    assert_eq!(def.name, "shop-release");
    assert_eq!(def.revision, 3);
    assert_eq!(def.stages.len(), 2);
    assert!(def.stages[0].parallel);
    let job = &def.stages[0].jobs[0];
    assert_eq!(job.error_policy, cv_core::ErrorPolicy::Continue);
    let JobSpec::Freestyle(spec) = &job.spec else { panic!("expected a freestyle job") };
    assert_eq!(spec.runtime.infrastructure, Infrastructure::Local);
    assert_eq!(def.stages[1].approval.as_ref().unwrap().timeout_mins, 30);
}

#[test]
fn json_files_are_parsed_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let toml_def = load_definition(&write(&dir, "shop.toml", PIPELINE)).unwrap();
    let json = serde_json::to_string(&toml_def).unwrap();

    let json_def = load_definition(&write(&dir, "shop.JSON", &json)).unwrap();
    assert_eq!(json_def, toml_def);
}

#[test]
fn nameless_definition_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_definition(&write(&dir, "anon.toml", "revision = 1\n")).unwrap_err();
    assert!(err.to_string().starts_with("invalid TOML in"));
    assert!(format!("{:#}", err).contains("name"));

    let err = load_definition(&write(&dir, "blank.toml", "name = \"\"\n")).unwrap_err();
    assert!(err.to_string().ends_with("workflow has no name"));
}

#[test]
fn missing_file_names_the_path() {
    let err = load_definition(Path::new("/nonexistent/shop.toml")).unwrap_err();
    assert_eq!(err.to_string(), "failed to read /nonexistent/shop.toml");
}

#[test]
fn params_override_the_args_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "args.toml",
        "[[params]]\nkey = \"region\"\nvalue = \"us\"\n\n[[params]]\nkey = \"tier\"\nvalue = \"gold\"\n",
    );

    let args = load_args(Some(&path), &[KeyVal::new("region", "eu"), KeyVal::new("canary", "10")]).unwrap();

    let pairs: Vec<_> = args.params.iter().map(|p| (p.key.as_str(), p.value.as_str())).collect();
    assert_eq!(pairs, vec![("region", "eu"), ("tier", "gold"), ("canary", "10")]);
    assert!(args.jobs.is_empty());
}

#[test]
fn no_args_file_means_only_params() {
    let args = load_args(None, &[KeyVal::new("region", "eu")]).unwrap();
    assert_eq!(args.params, vec![KeyVal::new("region", "eu")]);
}

#[parameterized(
    simple = { "region=eu", Some(("region", "eu")) },
    empty_value = { "region=", Some(("region", "")) },
    value_with_equals = { "query=a=b", Some(("query", "a=b")) },
    no_equals = { "region", None },
    empty_key = { "=eu", None },
)]
fn parses_params(input: &str, expected: Option<(&str, &str)>) {
    let parsed = parse_param(input).ok();
    assert_eq!(parsed, expected.map(|(k, v)| KeyVal::new(k, v)));
}
