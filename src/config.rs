// SPDX-FileCopyrightText: 2026 elmship contributors
// SPDX-License-Identifier: MIT

//! Deploy profile layout.
//!
//! Specify the layout for the deploy profile that elmship uses to simplify
//! the process of serialization and deserialization. File I/O is left to the
//! caller to figure out.
//!
//! A __deploy profile__ collects every knob the build pipeline reads: the
//! compiler entry point, the output layout of the built artifact, how many
//! historical releases the deployment collaborator should retain, and which
//! paths to exclude from the packaged tarball. All values are read once at
//! process start and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::{
    env,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Environment variable naming the deployment target path.
pub const DEPLOY_TO_VAR: &str = "ELMSHIP_DEPLOY_TO";

/// Deploy profile layout.
///
/// A deploy profile details how a single Elm application should be built and
/// handed off to the release-based deployment workflow. Every field carries a
/// default that matches the stock single-page application layout, so an empty
/// profile file is a valid profile.
///
/// # General Layout
///
/// ```toml
/// entry_point = "src/Main.elm"
/// output = "single-file"
/// keep_releases = 5
/// tarball_exclude = []
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployProfile {
    /// Entry point source file handed to the Elm compiler.
    pub entry_point: PathBuf,

    /// Layout of the compiled artifact inside the build output directory.
    pub output: OutputLayout,

    /// Number of historical releases the deployment target keeps around.
    pub keep_releases: u32,

    /// Glob patterns for paths omitted from the packaged artifact.
    pub tarball_exclude: Vec<String>,
}

impl DeployProfile {
    /// Validate every tarball exclusion pattern parses as a glob.
    ///
    /// Exclusion patterns are only consulted when the artifact manifest is
    /// collected, long after the profile was loaded. Validating them up front
    /// keeps a typo from surfacing at packaging time.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ExcludeGlob`] for the first pattern that fails
    ///   to parse.
    pub fn validate_excludes(&self) -> Result<()> {
        for pattern in &self.tarball_exclude {
            glob::Pattern::new(pattern).map_err(|source| ConfigError::ExcludeGlob {
                pattern: pattern.clone(),
                source,
            })?;
        }

        Ok(())
    }
}

impl Default for DeployProfile {
    fn default() -> Self {
        Self {
            entry_point: PathBuf::from("src/Main.elm"),
            output: OutputLayout::default(),
            keep_releases: 5,
            tarball_exclude: Vec::new(),
        }
    }
}

impl FromStr for DeployProfile {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut profile: DeployProfile =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on entry point field.
        profile.entry_point = PathBuf::from(
            shellexpand::full(profile.entry_point.to_string_lossy().as_ref())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned(),
        );

        profile.validate_excludes()?;

        Ok(profile)
    }
}

impl Display for DeployProfile {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Layout of the compiled artifact inside the build output directory.
///
/// The two layouts differ only in where the compiler writes its artifact,
/// and whether the cleanup step recreates an empty directory afterwards.
/// Neither layout is canonical, so the choice lives in the deploy profile.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLayout {
    /// Compile to a single `public/index.html` page.
    #[default]
    SingleFile,

    /// Compile to a `public/dist/elm.js` bundle inside a nested directory.
    DistBundle,
}

impl OutputLayout {
    /// Directory tree that cleanup removes and packaging reads.
    pub fn build_dir(&self) -> &'static Path {
        match self {
            Self::SingleFile => Path::new("public"),
            Self::DistBundle => Path::new("public/dist"),
        }
    }

    /// Exact path handed to the compiler's `--output` argument.
    pub fn artifact_path(&self) -> &'static Path {
        match self {
            Self::SingleFile => Path::new("public/index.html"),
            Self::DistBundle => Path::new("public/dist/elm.js"),
        }
    }

    /// Whether cleanup recreates the build directory as an empty directory.
    ///
    /// Only the nested bundle layout needs this: the compiler creates the
    /// single-file layout's output path on its own.
    pub fn recreates_build_dir(&self) -> bool {
        matches!(self, Self::DistBundle)
    }
}

/// Path acting as the deployment target for the packaged artifact.
///
/// Resolved once from the environment before any filesystem or process side
/// effect occurs. The pipeline itself never transfers anything here; the
/// value exists so a misconfigured deploy aborts before the build runs
/// instead of after it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DeployTarget(PathBuf);

impl DeployTarget {
    /// Resolve deployment target from [`DEPLOY_TO_VAR`].
    ///
    /// Performs shell expansion on the resolved value. An unset or empty
    /// variable is a fatal configuration error.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoDeployTarget`] if the variable is unset or
    ///   empty.
    /// - Return [`ConfigError::ShellExpansion`] if expansion fails.
    pub fn from_env() -> Result<Self> {
        let raw = env::var(DEPLOY_TO_VAR).unwrap_or_default();
        if raw.is_empty() {
            return Err(ConfigError::NoDeployTarget);
        }

        let expanded = shellexpand::full(raw.as_str())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned();

        Ok(Self(PathBuf::from(expanded)))
    }

    /// Construct deployment target from a known path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Treat deployment target as [`Path`] slice.
    pub fn as_path(&self) -> &Path {
        self.0.as_path()
    }
}

impl Display for DeployTarget {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_path().to_string_lossy().as_ref())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize deploy profile.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize deploy profile.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Deployment target variable is unset or empty.
    #[error("required environment variable {DEPLOY_TO_VAR} is unset or empty")]
    NoDeployTarget,

    /// Tarball exclusion pattern is not a valid glob.
    #[error("invalid tarball exclusion pattern {pattern:?}")]
    ExcludeGlob {
        pattern: String,
        source: glob::PatternError,
    },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
