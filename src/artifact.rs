// SPDX-FileCopyrightText: 2026 elmship contributors
// SPDX-License-Identifier: MIT

//! Artifact manifest for the packaging collaborator.
//!
//! The packaging side of the deployment workflow reads the entire build
//! output directory tree as the deployable artifact, minus any path matching
//! the profile's tarball exclusion globs. This module makes that contract
//! concrete: it walks the build tree, applies the exclusions, and yields the
//! sorted relative file list that packaging would put into the tarball.
//!
//! Exclusion matches both whole paths and directory prefixes — an excluded
//! directory excludes its entire subtree.

use crate::config::DeployProfile;

use ignore::WalkBuilder;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};
use tracing::debug;

/// File listing of the deployable artifact tree.
///
/// Paths are relative to the build output directory and sorted, so two
/// manifests over identical trees compare equal.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct ArtifactManifest {
    files: Vec<PathBuf>,
}

impl ArtifactManifest {
    /// Collect the manifest for a deploy profile's build output directory.
    ///
    /// A missing build directory yields an empty manifest rather than an
    /// error, mirroring the cleanup step's tolerance of the missing path.
    /// Dotfiles are listed too, and symlinks are followed; the packaging
    /// step reads the whole tree, so nothing gets skipped unless an
    /// exclusion glob says so.
    ///
    /// # Errors
    ///
    /// - Return [`ArtifactError::ExcludeGlob`] if an exclusion pattern fails
    ///   to parse.
    /// - Return [`ArtifactError::Walk`] if the directory walk fails.
    pub fn collect(profile: &DeployProfile) -> Result<Self> {
        let build_dir = profile.output.build_dir();
        if !build_dir.exists() {
            debug!("build output directory {} is absent", build_dir.display());
            return Ok(Self::default());
        }

        let excludes = profile
            .tarball_exclude
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|source| ArtifactError::ExcludeGlob {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut files = Vec::new();
        let walker = WalkBuilder::new(build_dir)
            .standard_filters(false)
            .follow_links(true)
            .build();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_some_and(|kind| kind.is_file()) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(build_dir) else {
                continue;
            };

            if is_excluded(relative, &excludes) {
                debug!("exclude {} from artifact", relative.display());
                continue;
            }

            files.push(relative.to_path_buf());
        }

        files.sort();

        Ok(Self { files })
    }

    /// Relative paths of every file packaging would include.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Whether the manifest lists no files at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Display for ArtifactManifest {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        for file in &self.files {
            writeln!(fmt, "{}", file.display())?;
        }

        Ok(())
    }
}

fn is_excluded(relative: &Path, excludes: &[glob::Pattern]) -> bool {
    excludes.iter().any(|pattern| {
        // INVARIANT: A pattern matching any ancestor excludes the subtree.
        relative
            .ancestors()
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .any(|ancestor| pattern.matches_path(ancestor))
    })
}

/// Artifact manifest error types.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Directory walk over the build output tree fails.
    #[error(transparent)]
    Walk(#[from] ignore::Error),

    /// Tarball exclusion pattern is not a valid glob.
    #[error("invalid tarball exclusion pattern {pattern:?}")]
    ExcludeGlob {
        pattern: String,
        source: glob::PatternError,
    },
}

/// Friendly result alias :3
type Result<T, E = ArtifactError> = std::result::Result<T, E>;
