// SPDX-FileCopyrightText: 2026 elmship contributors
// SPDX-License-Identifier: MIT

//! Ordered deploy pipeline.
//!
//! The deployment workflow is modeled as an explicit ordered list of stages
//! that the top-level deploy routine invokes sequentially, rather than as
//! lifecycle hooks registered by convention. The build stage always sits at
//! the front of the list, so its hard dependency edge — a fresh artifact
//! must exist before any release-preparation stage runs — is enforced by the
//! caller's ordering, not by implicit registration.
//!
//! A failed stage terminates the pipeline immediately: packaging, transfer,
//! and pruning stages appended by the deployment collaborator never observe
//! a half-built output tree.

use crate::{
    artifact::ArtifactError,
    config::{ConfigError, DeployProfile},
    hook::{BuildError, BuildHook, Compiler, ElmCompiler},
};

use tracing::{info, instrument};

/// One sequential phase of a deploy invocation.
pub trait Stage {
    /// Human-readable stage name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Execute the stage to completion.
    ///
    /// # Errors
    ///
    /// - Return [`StageError`] to abort this and every downstream stage.
    fn run(&mut self) -> Result<(), StageError>;
}

/// Ordered list of deploy stages.
///
/// Stages execute in insertion order. The first failure stops the pipeline;
/// no downstream stage runs after a failed one, and the failure carries the
/// offending stage's name.
#[derive(Default)]
pub struct Pipeline<'a> {
    stages: Vec<Box<dyn Stage + 'a>>,
}

impl<'a> Pipeline<'a> {
    /// Construct new empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage to the end of the pipeline.
    pub fn with_stage(mut self, stage: impl Stage + 'a) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Execute every stage in insertion order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// - Return [`PipelineError::Stage`] naming the stage that failed.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&mut self) -> Result<()> {
        for stage in &mut self.stages {
            info!("run deploy stage {:?}", stage.name());
            stage
                .run()
                .map_err(|source| PipelineError::Stage(stage.name().to_string(), source))?;
        }

        Ok(())
    }
}

/// Build stage: the unskippable front of every deploy pipeline.
///
/// Wraps the [`BuildHook`] so that cleanup and compilation run before any
/// other stage of a deploy invocation, with no per-invocation opt-out.
#[derive(Debug)]
pub struct BuildStage<C = ElmCompiler>
where
    C: Compiler,
{
    profile: DeployProfile,
    compiler: C,
}

impl<C> BuildStage<C>
where
    C: Compiler,
{
    /// Construct new build stage.
    pub fn new(profile: DeployProfile, compiler: C) -> Self {
        Self { profile, compiler }
    }
}

impl<C> Stage for BuildStage<C>
where
    C: Compiler,
{
    fn name(&self) -> &str {
        "build"
    }

    fn run(&mut self) -> Result<(), StageError> {
        let hook = BuildHook::new(&self.profile, &self.compiler);
        let output = hook.run()?;
        if !output.is_empty() {
            info!("{output}");
        }

        Ok(())
    }
}

/// All possible error types for a single deploy stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Build hook fails during cleanup or compilation.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Configuration resolution fails.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Artifact manifest collection fails.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Collaborator-defined stage fails with a plain I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Pipeline error types.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage failed; every downstream stage was skipped.
    #[error("deploy stage {0:?} failed")]
    Stage(String, #[source] StageError),
}

/// Friendly result alias :3
type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputLayout;
    use crate::hook::CompilerError;

    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::{cell::RefCell, fs, path::Path, rc::Rc};

    struct RecordingStage {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
        fail: bool,
    }

    impl Stage for RecordingStage {
        fn name(&self) -> &str {
            self.name
        }

        fn run(&mut self) -> Result<(), StageError> {
            self.log.borrow_mut().push(self.name);
            if self.fail {
                return Err(StageError::Io(std::io::Error::other("boom")));
            }

            Ok(())
        }
    }

    struct FakeCompiler {
        fail: bool,
    }

    impl Compiler for FakeCompiler {
        fn make(&self, _: &Path, artifact: &Path) -> Result<String, CompilerError> {
            if self.fail {
                return Err(CompilerError::Exit {
                    code: Some(1),
                    output: "-- TYPE MISMATCH -- src/Main.elm".into(),
                });
            }

            if let Some(parent) = artifact.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(artifact, "compiled")?;

            Ok(String::new())
        }
    }

    #[test]
    fn stages_run_in_insertion_order() -> anyhow::Result<()> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = Pipeline::new()
            .with_stage(RecordingStage {
                name: "package",
                log: Rc::clone(&log),
                fail: false,
            })
            .with_stage(RecordingStage {
                name: "transfer",
                log: Rc::clone(&log),
                fail: false,
            })
            .with_stage(RecordingStage {
                name: "prune",
                log: Rc::clone(&log),
                fail: false,
            });

        pipeline.run()?;

        assert_eq!(*log.borrow(), vec!["package", "transfer", "prune"]);

        Ok(())
    }

    #[test]
    fn first_failure_skips_downstream_stages() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = Pipeline::new()
            .with_stage(RecordingStage {
                name: "package",
                log: Rc::clone(&log),
                fail: true,
            })
            .with_stage(RecordingStage {
                name: "transfer",
                log: Rc::clone(&log),
                fail: false,
            });

        let error = pipeline.run().unwrap_err();
        let PipelineError::Stage(stage, _) = error;

        assert_eq!(stage, "package");
        assert_eq!(*log.borrow(), vec!["package"]);
    }

    #[sealed_test]
    fn failed_build_stage_stops_whole_deploy() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = Pipeline::new()
            .with_stage(BuildStage::new(
                DeployProfile::default(),
                FakeCompiler { fail: true },
            ))
            .with_stage(RecordingStage {
                name: "package",
                log: Rc::clone(&log),
                fail: false,
            });

        let error = pipeline.run().unwrap_err();
        let PipelineError::Stage(stage, _) = &error;

        assert_eq!(stage, "build");
        assert!(log.borrow().is_empty());
        assert!(!Path::new("public/index.html").exists());
    }

    #[sealed_test]
    fn build_stage_produces_artifact_before_later_stages() -> anyhow::Result<()> {
        struct ArtifactChecker;

        impl Stage for ArtifactChecker {
            fn name(&self) -> &str {
                "package"
            }

            fn run(&mut self) -> Result<(), StageError> {
                assert!(Path::new("public/dist/elm.js").exists());
                Ok(())
            }
        }

        let profile = DeployProfile {
            output: OutputLayout::DistBundle,
            ..Default::default()
        };
        let mut pipeline = Pipeline::new()
            .with_stage(BuildStage::new(profile, FakeCompiler { fail: false }))
            .with_stage(ArtifactChecker);

        pipeline.run()?;

        Ok(())
    }
}
