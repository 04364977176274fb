// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bash scripts for typed steps.
//!
//! Every script runs with `set -euo pipefail` in the job workspace.
//! Registry passwords reach `docker login` through environment variables
//! (see [`registry_password_env`]) so they never appear on a command line.

use cv_core::spec::StepSpec;
use cv_core::{JobContext, Registry, Repo, RepoSource, OUTPUTS_DIR_ENV};
use std::fmt::Write as _;

pub const ARTIFACTS_DIR_ENV: &str = "CONVEYOR_ARTIFACTS_DIR";
pub const WORKSPACE_ENV: &str = "CONVEYOR_WORKSPACE";

/// Output recorded by docker build steps.
pub const IMAGE_OUTPUT: &str = "IMAGE";

const PRELUDE: &str = "set -euo pipefail\n";

/// Name of the variable holding the password of `ctx.registries[index]`.
pub fn registry_password_env(index: usize) -> String {
    format!("CONVEYOR_REGISTRY_PASSWORD_{}", index)
}

/// Single-quote `s` for bash.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Whether `name` can be used as a shell variable name.
pub fn is_shell_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Script for a step, or `None` for steps the runner handles itself.
pub fn step_script(spec: &StepSpec, ctx: &JobContext) -> Option<String> {
    let body = match spec {
        StepSpec::Tools { .. } | StepSpec::Debug { .. } => return None,
        StepSpec::Shell { script } => shell(script, ctx),
        StepSpec::Git { repos } => git(repos),
        StepSpec::DockerBuild { context, dockerfile, image, build_args, registry_id } => {
            let mut out = logins(ctx, |r| r.id == *registry_id);
            let _ = writeln!(
                out,
                "docker build -t {} -f {} {} {}",
                shell_quote(image),
                shell_quote(dockerfile),
                build_args.trim(),
                shell_quote(context)
            );
            let _ = writeln!(out, "docker push {}", shell_quote(image));
            if ctx.outputs.iter().any(|o| o == IMAGE_OUTPUT) {
                let _ = writeln!(out, "{}", write_output(IMAGE_OUTPUT, &shell_quote(image)));
            }
            out
        }
        StepSpec::Archive { uploads, destination } => {
            let mut out = String::new();
            for upload in uploads {
                let dest = artifact_path(&[destination, &upload.dest]);
                let _ = writeln!(out, "mkdir -p {}", dest);
                let _ = writeln!(out, "cp -r {} {}/", shell_quote(&upload.src), dest);
            }
            out
        }
        StepSpec::JunitReport { report_dir } => {
            let dest = artifact_path(&["junit"]);
            format!(
                "test -d {dir} || {{ echo \"junit report dir {raw} not found\" >&2; exit 1; }}\n\
                 mkdir -p {dest}\ncp -r {dir}/. {dest}/\n",
                dir = shell_quote(report_dir),
                raw = report_dir.replace('"', ""),
                dest = dest
            )
        }
        StepSpec::TarArchive { paths, result_dir, file_name } => {
            let dest = artifact_path(&[result_dir]);
            let sources = if paths.is_empty() {
                ".".to_string()
            } else {
                paths.iter().map(|p| shell_quote(p)).collect::<Vec<_>>().join(" ")
            };
            format!(
                "mkdir -p {dest}\ntar -czf {file} {sources}\n",
                dest = dest,
                file = artifact_path(&[result_dir, file_name]),
                sources = sources
            )
        }
        StepSpec::SonarCheck { settings } => {
            let mut out = String::new();
            if !settings.parameter.trim().is_empty() {
                let _ = writeln!(
                    out,
                    "cat > sonar-project.properties <<'CONVEYOR_EOF'\n{}\nCONVEYOR_EOF",
                    settings.parameter.trim_end()
                );
            }
            out.push_str("sonar-scanner");
            if !settings.address.is_empty() {
                let _ = write!(out, " -Dsonar.host.url={}", shell_quote(&settings.address));
            }
            if settings.check_quality_gate {
                out.push_str(" -Dsonar.qualitygate.wait=true");
            }
            out.push('\n');
            out
        }
        StepSpec::DistributeImage { source_registry_id, target_registry_id, targets } => {
            let mut out =
                logins(ctx, |r| r.id == *source_registry_id || r.id == *target_registry_id);
            for target in targets {
                if target.target_image.is_empty() {
                    let _ = writeln!(
                        out,
                        "echo {}",
                        shell_quote(&format!("skipping {}: no target image", target.module))
                    );
                    continue;
                }
                let source = shell_quote(&target.source_image);
                let dest = shell_quote(&target.target_image);
                let _ = writeln!(out, "docker pull {}", source);
                let _ = writeln!(out, "docker tag {} {}", source, dest);
                let _ = writeln!(out, "docker push {}", dest);
            }
            out
        }
    };
    Some(format!("{}{}", PRELUDE, body))
}

/// User script between registry logins and the output epilogue.
fn shell(script: &str, ctx: &JobContext) -> String {
    let mut out = logins(ctx, |_| true);
    out.push_str(script.trim_end());
    out.push('\n');
    for name in &ctx.outputs {
        if !is_shell_name(name) {
            tracing::warn!(output = %name, "output name is not a shell variable; not captured");
            continue;
        }
        let _ = writeln!(
            out,
            "if [ -n \"${{{name}+x}}\" ]; then {}; fi",
            write_output(name, &format!("\"${}\"", name)),
            name = name
        );
    }
    out
}

fn write_output(name: &str, value: &str) -> String {
    format!("printf '%s' {} > \"${}/{}\"", value, OUTPUTS_DIR_ENV, name)
}

fn git(repos: &[Repo]) -> String {
    let mut out = String::new();
    for repo in repos {
        let dir = shell_quote(repo.checkout_dir());
        let _ = writeln!(
            out,
            "if [ -d {dir}/.git ]; then git -C {dir} fetch --tags origin; else git clone {addr} {dir}; fi",
            dir = dir,
            addr = shell_quote(&repo.clone_address())
        );
        if let Some(pr) = repo.pr {
            let head = match repo.source {
                RepoSource::Gitlab => format!("merge-requests/{}/head", pr),
                _ => format!("pull/{}/head", pr),
            };
            let _ = writeln!(
                out,
                "git -C {dir} fetch origin {spec}\ngit -C {dir} checkout -B {branch} FETCH_HEAD",
                dir = dir,
                spec = shell_quote(&head),
                branch = shell_quote(&repo.reference())
            );
        } else if !repo.tag.is_empty() {
            let _ = writeln!(out, "git -C {} checkout {}", dir, shell_quote(&format!("tags/{}", repo.tag)));
        } else if !repo.branch.is_empty() {
            let _ = writeln!(out, "git -C {} checkout {}", dir, shell_quote(&repo.branch));
        }
    }
    out
}

/// `docker login` lines for the context's registries accepted by `filter`.
fn logins(ctx: &JobContext, filter: impl Fn(&Registry) -> bool) -> String {
    let mut out = String::new();
    for (index, registry) in ctx.registries.iter().enumerate() {
        if registry.access_key.is_empty() || !filter(registry) {
            continue;
        }
        let _ = writeln!(
            out,
            "printf '%s' \"${}\" | docker login {} -u {} --password-stdin",
            registry_password_env(index),
            shell_quote(registry.host()),
            shell_quote(&registry.access_key)
        );
    }
    out
}

/// `"$CONVEYOR_ARTIFACTS_DIR"/a/b` with each part quoted.
fn artifact_path(parts: &[&str]) -> String {
    let mut out = format!("\"${}\"", ARTIFACTS_DIR_ENV);
    for part in parts.iter().map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        out.push('/');
        out.push_str(&shell_quote(part));
    }
    out
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
