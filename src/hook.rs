// SPDX-FileCopyrightText: 2026 elmship contributors
// SPDX-License-Identifier: MIT

//! Pre-deploy build hook.
//!
//! The build hook guarantees that a fresh, correctly built artifact exists in
//! the build output directory before the deployment workflow begins its
//! starting phase. It is a two-step pipeline with a single terminal outcome
//! per invocation: cleanup of the previous output tree, then a blocking
//! invocation of the external Elm compiler. Ordering is mandatory. The
//! cleanup step exists specifically to prevent stale artifacts from a
//! previous partial or failed build from being silently reused.
//!
//! Both failure modes abort the deploy identically, but they are kept as
//! distinct error kinds for diagnostics: a filesystem error during cleanup
//! versus a non-zero compiler exit. Compiler diagnostics are surfaced
//! verbatim, since they are the operator's primary debugging signal.
//!
//! Known hazard, unhandled: concurrent invocations racing on the same build
//! output directory. Mutual exclusion belongs to the surrounding deployment
//! workflow, not this hook.

use crate::config::DeployProfile;

use std::{
    ffi::{OsStr, OsString},
    fs,
    io::ErrorKind,
    path::Path,
    process::Command,
};
use tracing::{debug, info, instrument};

/// External compiler capability.
///
/// A single operation: compile the entry point into the artifact path, return
/// the captured diagnostics on success. Behind this seam the build step can
/// be tested with a fake compiler without touching a real toolchain.
pub trait Compiler {
    /// Compile `entry` into `artifact`.
    ///
    /// Blocks until the compiler exits. Returns combined captured output.
    ///
    /// # Errors
    ///
    /// - Return [`CompilerError::Exit`] on non-zero compiler exit, carrying
    ///   the verbatim captured output.
    /// - Return [`CompilerError::Spawn`] if the compiler process cannot be
    ///   started at all.
    fn make(&self, entry: &Path, artifact: &Path) -> Result<String, CompilerError>;
}

impl<C> Compiler for &C
where
    C: Compiler + ?Sized,
{
    fn make(&self, entry: &Path, artifact: &Path) -> Result<String, CompilerError> {
        (**self).make(entry, artifact)
    }
}

/// The Elm compiler binary.
///
/// Invokes `elm make <entry> --output <artifact> --optimize` as a blocking
/// child process. The argument list is fixed and non-configurable: the
/// compiled output's behavior (minification, dead-code elimination) depends
/// on these exact flags, so nothing may be silently added or removed.
#[derive(Debug, Clone)]
pub struct ElmCompiler {
    program: OsString,
}

impl ElmCompiler {
    /// Construct compiler invoking a specific binary.
    ///
    /// Useful for pointing the hook at a stub binary under test. Production
    /// callers want [`Default`].
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Exact argument list passed to the compiler binary.
    pub fn make_args(entry: &Path, artifact: &Path) -> Vec<OsString> {
        vec![
            "make".into(),
            entry.as_os_str().to_os_string(),
            "--output".into(),
            artifact.as_os_str().to_os_string(),
            "--optimize".into(),
        ]
    }
}

impl Default for ElmCompiler {
    fn default() -> Self {
        Self::new("elm")
    }
}

impl Compiler for ElmCompiler {
    #[instrument(skip(self), level = "debug")]
    fn make(&self, entry: &Path, artifact: &Path) -> Result<String, CompilerError> {
        debug!(
            "compile {} into {}",
            entry.display(),
            artifact.display()
        );
        syscall_non_interactive(self.program.as_os_str(), Self::make_args(entry, artifact))
    }
}

/// Pre-deploy build hook over a compiler seam.
///
/// Borrows the deploy profile for the lifetime of one deploy invocation; all
/// configuration is resolved by the caller up front, the hook performs no
/// ambient lookups of its own.
#[derive(Debug)]
pub struct BuildHook<'a, C = ElmCompiler>
where
    C: Compiler,
{
    profile: &'a DeployProfile,
    compiler: C,
}

impl<'a, C> BuildHook<'a, C>
where
    C: Compiler,
{
    /// Construct new build hook.
    pub fn new(profile: &'a DeployProfile, compiler: C) -> Self {
        Self { profile, compiler }
    }

    /// Remove the build output directory, recreating it where the layout
    /// nests output under a subdirectory.
    ///
    /// Safe to call when the directory does not exist; the missing path is a
    /// no-op, not an error. Any other filesystem error is fatal — the hook
    /// never proceeds to compile over a partially deleted tree. The recreate
    /// step creates all missing parent directories.
    ///
    /// # Errors
    ///
    /// - Return [`BuildError::Cleanup`] if removal or recreation fails.
    #[instrument(skip(self), level = "debug")]
    pub fn clean(&self) -> Result<()> {
        let build_dir = self.profile.output.build_dir();
        debug!("remove build output directory {}", build_dir.display());

        match fs::remove_dir_all(build_dir) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => return Err(BuildError::Cleanup(error)),
        }

        if self.profile.output.recreates_build_dir() {
            debug!("recreate empty {}", build_dir.display());
            mkdirp::mkdirp(build_dir).map_err(BuildError::Cleanup)?;
        }

        Ok(())
    }

    /// Invoke the compiler with the fixed argument list.
    ///
    /// Depends on [`clean`](Self::clean) having completed first; call
    /// [`run`](Self::run) to get that ordering enforced. Blocks until the
    /// compiler exits. Non-zero exit is fatal and surfaces the compiler's
    /// diagnostics verbatim.
    ///
    /// # Errors
    ///
    /// - Return [`BuildError::Compile`] if the compiler fails to spawn or
    ///   exits non-zero.
    pub fn build(&self) -> Result<String> {
        let entry = self.profile.entry_point.as_path();
        let artifact = self.profile.output.artifact_path();
        Ok(self.compiler.make(entry, artifact)?)
    }

    /// Run the full hook: cleanup, then compile, strictly in that order.
    ///
    /// Idempotent over an unchanged source tree: two consecutive runs
    /// produce byte-identical artifacts.
    ///
    /// # Errors
    ///
    /// - Return [`BuildError::Cleanup`] if the cleanup step fails; the
    ///   compiler is never invoked in that case.
    /// - Return [`BuildError::Compile`] if the compiler step fails.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self) -> Result<String> {
        info!(
            "build {} into {}",
            self.profile.entry_point.display(),
            self.profile.output.artifact_path().display()
        );
        self.clean()?;
        self.build()
    }
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String, CompilerError> {
    let output = Command::new(cmd.as_ref()).args(args).output()?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(stdout.as_str());
    }

    if !stderr.is_empty() {
        message.push_str(stderr.as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        return Err(CompilerError::Exit {
            code: output.status.code(),
            output: message,
        });
    }

    Ok(message)
}

/// Compiler invocation error types.
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    /// Compiler process cannot be spawned.
    #[error(transparent)]
    Spawn(#[from] std::io::Error),

    /// Compiler exited non-zero; `output` holds its verbatim diagnostics.
    #[error("compiler exited with status {code:?}\n{output}")]
    Exit { code: Option<i32>, output: String },
}

/// Build hook error types.
///
/// Cleanup and compile failures are distinguished for diagnostics only; both
/// abort the deploy identically.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Filesystem removal or recreation of the build output directory fails.
    #[error("cannot clean build output directory")]
    Cleanup(#[source] std::io::Error),

    /// External compiler fails to spawn or exits non-zero.
    #[error(transparent)]
    Compile(#[from] CompilerError),
}

/// Friendly result alias :3
type Result<T, E = BuildError> = std::result::Result<T, E>;
