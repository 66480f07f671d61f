// SPDX-FileCopyrightText: 2026 elmship contributors
// SPDX-License-Identifier: MIT

use elmship::{
    artifact::ArtifactManifest,
    config::{DeployProfile, DeployTarget},
    hook::{BuildHook, ElmCompiler},
    pipeline::{BuildStage, Pipeline},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{fs, path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  elmship [options] <elmship-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Build(opts) => run_build(opts),
            Command::Clean(opts) => run_clean(opts),
            Command::Deploy(opts) => run_deploy(opts),
            Command::Manifest(opts) => run_manifest(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Clean the build output directory, then compile the application.
    #[command(override_usage = "elmship build [options]")]
    Build(ProfileOptions),

    /// Remove the build output directory only.
    #[command(override_usage = "elmship clean [options]")]
    Clean(ProfileOptions),

    /// Run the deploy pipeline: build first, then hand off to the
    /// deployment workflow.
    #[command(override_usage = "elmship deploy [options]")]
    Deploy(ProfileOptions),

    /// Print the artifact file list the packaging step would read.
    #[command(override_usage = "elmship manifest [options]")]
    Manifest(ProfileOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ProfileOptions {
    /// Path to deploy profile file.
    #[arg(short, long, value_name = "path", default_value = "deploy.toml")]
    pub profile: PathBuf,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn load_profile(opts: &ProfileOptions) -> Result<DeployProfile> {
    if !opts.profile.exists() {
        warn!(
            "profile {} not found, using defaults",
            opts.profile.display()
        );
        return Ok(DeployProfile::default());
    }

    let data = fs::read_to_string(&opts.profile)?;
    Ok(data.parse()?)
}

fn run_build(opts: ProfileOptions) -> Result<()> {
    let profile = load_profile(&opts)?;
    let hook = BuildHook::new(&profile, ElmCompiler::default());
    let output = hook.run()?;
    if !output.is_empty() {
        info!("{output}");
    }

    Ok(())
}

fn run_clean(opts: ProfileOptions) -> Result<()> {
    let profile = load_profile(&opts)?;
    let hook = BuildHook::new(&profile, ElmCompiler::default());
    hook.clean()?;

    Ok(())
}

fn run_deploy(opts: ProfileOptions) -> Result<()> {
    // INVARIANT: Resolve deployment target before any side effect occurs.
    let target = DeployTarget::from_env()?;
    let profile = load_profile(&opts)?;

    let mut pipeline = Pipeline::new().with_stage(BuildStage::new(
        profile.clone(),
        ElmCompiler::default(),
    ));
    pipeline.run()?;

    let manifest = ArtifactManifest::collect(&profile)?;
    print!("{manifest}");
    info!(
        "hand off {} files to deployment target {target}, keeping {} releases",
        manifest.files().len(),
        profile.keep_releases
    );

    Ok(())
}

fn run_manifest(opts: ProfileOptions) -> Result<()> {
    let profile = load_profile(&opts)?;
    let manifest = ArtifactManifest::collect(&profile)?;
    print!("{manifest}");

    Ok(())
}
