// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    plain_job   = { "echo {{.job.fs.REPORT}}",            "fs",            "REPORT" },
    module_key  = { "deploy {{.job.build.svc.api.IMAGE}}", "build.svc.api", "IMAGE" },
    spaced      = { "{{ .job.scan.RESULT }}",              "scan",          "RESULT" },
)]
fn output_refs_parse(text: &str, key: &str, output: &str) {
    let refs = output_refs(text);
    assert_eq!(refs, vec![OutputRef { job_key: key.into(), output: output.into() }]);
}

#[test]
fn output_ref_job_name_is_first_segment() {
    let r = OutputRef { job_key: "build.svc.api".into(), output: "IMAGE".into() };
    assert_eq!(r.job_name(), "build");
    assert_eq!(r.to_string(), "{{.job.build.svc.api.IMAGE}}");
}

#[test]
fn render_outputs_substitutes_all() {
    let text = "a={{.job.x.A}} b={{.job.y.z.B}}";
    let rendered = render_outputs(text, |r| Some(format!("{}:{}", r.job_key, r.output))).unwrap();
    assert_eq!(rendered, "a=x:A b=y.z:B");
}

#[test]
fn render_outputs_reports_first_missing() {
    let err = render_outputs("{{.job.x.A}} {{.job.y.B}}", |r| {
        (r.job_key == "x").then(|| "1".to_string())
    })
    .unwrap_err();
    assert_eq!(err.job_key, "y");
}

#[test]
fn render_params_leaves_unknown() {
    let params: HashMap<String, String> = [("env".to_string(), "prod".to_string())].into();
    assert_eq!(
        render_params("{{.workflow.params.env}}/{{.workflow.params.other}}", &params),
        "prod/{{.workflow.params.other}}"
    );
    assert_eq!(param_refs("{{.workflow.params.env}} {{.workflow.params.x}}"), vec!["env", "x"]);
}

#[test]
fn render_patch_substitutes_params() {
    let params: HashMap<&str, &str> = [("replicas", "3")].into();
    assert_eq!(
        render_patch(r#"{"spec":{"replicas":{{.replicas}}}}"#, &params),
        r#"{"spec":{"replicas":3}}"#
    );
}
