// SPDX-FileCopyrightText: 2026 elmship contributors
// SPDX-License-Identifier: MIT

//! End-to-end tests over the public library surface.
//!
//! The Elm compiler is stood in for by executable stub scripts, so these
//! tests exercise the real process-spawning path without a toolchain.

use crate::unpack_fixture;
use elmship::{
    artifact::ArtifactManifest,
    config::{DeployProfile, DeployTarget, OutputLayout, DEPLOY_TO_VAR},
    hook::{BuildError, BuildHook, CompilerError, ElmCompiler},
    pipeline::{BuildStage, Pipeline, Stage, StageError},
};

use indoc::indoc;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{fs, path::Path};

#[cfg(unix)]
use crate::install_stub_compiler;

#[cfg(unix)]
const COMPILING_STUB: &str = indoc! {r#"
    #!/bin/sh
    printf '%s\n' "$@" > cli-args.txt
    out="$4"
    mkdir -p "$(dirname "$out")"
    printf 'compiled from %s\n' "$2" > "$out"
"#};

#[cfg(unix)]
const FAILING_STUB: &str = indoc! {r#"
    #!/bin/sh
    echo '-- TYPE MISMATCH -- problem in src/Main.elm' >&2
    exit 1
"#};

#[cfg(unix)]
#[sealed_test]
fn hook_invokes_compiler_with_fixed_arguments() -> anyhow::Result<()> {
    unpack_fixture(indoc! {r#"
        -- src/Main.elm --
        module Main exposing (main)
    "#})?;
    let stub = install_stub_compiler(COMPILING_STUB)?;

    let profile = DeployProfile::default();
    let hook = BuildHook::new(&profile, ElmCompiler::new(stub));
    hook.run()?;

    let args = fs::read_to_string("cli-args.txt")?;
    assert_eq!(
        args,
        "make\nsrc/Main.elm\n--output\npublic/index.html\n--optimize\n"
    );
    assert_eq!(
        fs::read_to_string("public/index.html")?,
        "compiled from src/Main.elm\n"
    );

    Ok(())
}

#[cfg(unix)]
#[sealed_test]
fn hook_is_idempotent_and_discards_stale_output() -> anyhow::Result<()> {
    unpack_fixture(indoc! {r#"
        -- src/Main.elm --
        module Main exposing (main)
        -- public/index.html --
        stale artifact from a previous partial build
        -- public/leftover.js --
        stale leftover
    "#})?;
    let stub = install_stub_compiler(COMPILING_STUB)?;

    let profile = DeployProfile::default();
    let hook = BuildHook::new(&profile, ElmCompiler::new(stub));

    hook.run()?;
    let first = fs::read("public/index.html")?;
    hook.run()?;
    let second = fs::read("public/index.html")?;

    assert_eq!(first, second);
    assert!(!Path::new("public/leftover.js").exists());

    Ok(())
}

#[cfg(unix)]
#[sealed_test]
fn compile_failure_aborts_with_verbatim_diagnostics() -> anyhow::Result<()> {
    unpack_fixture(indoc! {r#"
        -- src/Main.elm --
        module Main exposing (main
    "#})?;
    let stub = install_stub_compiler(FAILING_STUB)?;

    let profile = DeployProfile::default();
    let hook = BuildHook::new(&profile, ElmCompiler::new(stub));
    let error = hook.run().unwrap_err();

    match &error {
        BuildError::Compile(CompilerError::Exit { code, output }) => {
            assert_eq!(*code, Some(1));
            assert_eq!(output, "-- TYPE MISMATCH -- problem in src/Main.elm");
        }
        other => panic!("expected compile failure, got {other:?}"),
    }
    assert!(!Path::new("public/index.html").exists());

    Ok(())
}

#[cfg(unix)]
#[sealed_test]
fn failed_build_keeps_collaborator_stages_from_running() -> anyhow::Result<()> {
    struct PackageStage;

    impl Stage for PackageStage {
        fn name(&self) -> &str {
            "package"
        }

        fn run(&mut self) -> Result<(), StageError> {
            panic!("packaging ran after a failed build");
        }
    }

    let stub = install_stub_compiler(FAILING_STUB)?;
    let mut pipeline = Pipeline::new()
        .with_stage(BuildStage::new(
            DeployProfile::default(),
            ElmCompiler::new(stub),
        ))
        .with_stage(PackageStage);

    assert!(pipeline.run().is_err());

    Ok(())
}

#[cfg(unix)]
#[sealed_test]
fn profile_file_drives_layout_and_exclusions() -> anyhow::Result<()> {
    unpack_fixture(indoc! {r#"
        -- deploy.toml --
        output = "dist-bundle"
        keep_releases = 3
        tarball_exclude = ["*.map"]
        -- src/Main.elm --
        module Main exposing (main)
    "#})?;
    let stub = install_stub_compiler(COMPILING_STUB)?;

    let profile: DeployProfile = fs::read_to_string("deploy.toml")?.parse()?;
    assert_eq!(profile.output, OutputLayout::DistBundle);
    assert_eq!(profile.keep_releases, 3);

    let hook = BuildHook::new(&profile, ElmCompiler::new(stub));
    hook.run()?;
    fs::write("public/dist/elm.js.map", "sourcemap")?;

    let manifest = ArtifactManifest::collect(&profile)?;
    let expect: Vec<std::path::PathBuf> = vec!["elm.js".into()];
    assert_eq!(manifest.files(), expect);

    Ok(())
}

#[sealed_test]
fn unset_deploy_target_aborts_before_any_side_effect() {
    std::env::remove_var(DEPLOY_TO_VAR);

    let result = DeployTarget::from_env();

    assert!(result.is_err());
    assert!(!Path::new("public").exists());
}
