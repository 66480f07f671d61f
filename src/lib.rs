// SPDX-FileCopyrightText: 2026 elmship contributors
// SPDX-License-Identifier: MIT

//! Local pre-deploy build pipeline for Elm single-page applications.
//!
//! elmship guarantees that, immediately before a release-based deployment
//! workflow begins its starting phase, a fresh and correctly built artifact
//! exists in the build output directory, produced from the current source
//! tree by the external Elm compiler.
//!
//! # Pipeline Shape
//!
//! A deploy invocation is an ordered list of stages run strictly one after
//! another. The build stage always comes first: it removes the previous
//! build output tree, recreates it where the layout requires, and invokes
//! `elm make` with a fixed argument list. Any cleanup or compile failure
//! aborts the whole deploy before packaging, transfer, or release pruning
//! can run. Running the pipeline twice over an unchanged source tree yields
//! byte-identical artifacts.
//!
//! # Collaborator Contract
//!
//! Packaging, transfer, and release-retention pruning belong to the
//! surrounding deployment workflow. elmship exposes their inputs: the
//! [`ArtifactManifest`] lists exactly the files packaging reads from the
//! build output directory (after tarball exclusions), and the
//! [`DeployTarget`] is resolved from the environment before any side effect
//! occurs so a misconfigured deploy never gets as far as a build.

pub mod artifact;
pub mod config;
pub mod hook;
pub mod pipeline;

pub use artifact::ArtifactManifest;
pub use config::{DeployProfile, DeployTarget, OutputLayout, DEPLOY_TO_VAR};
pub use hook::{BuildHook, Compiler, ElmCompiler};
pub use pipeline::{BuildStage, Pipeline, Stage};
