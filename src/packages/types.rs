//! Package types and their resolution.
//!
//! A package's type comes from, in order: the type the user set for its
//! path, the type declared in the workspace manifest, or `Other`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::autoproj::{ManifestLoader, Workspace};

/// Closed set of package types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    /// C/C++ package built with CMake or autotools
    Cxx,
    /// Ruby package
    Ruby,
    /// Orogen component package
    Orogen,
    /// Anything else
    Other,
    /// Workspace configuration
    Config,
    /// No package
    Invalid,
}

/// Manifest type strings and the variant they map to.
const MANIFEST_TYPES: &[(&str, PackageType)] = &[
    ("Autobuild::CMake", PackageType::Cxx),
    ("Autobuild::Autotools", PackageType::Cxx),
    ("Autobuild::Ruby", PackageType::Ruby),
    ("Autobuild::Orogen", PackageType::Orogen),
];

impl PackageType {
    /// Types a user may pick for a package.
    pub const PICKABLE: [Self; 4] = [Self::Cxx, Self::Ruby, Self::Orogen, Self::Other];

    /// Identifier used for persistence and lookup.
    pub const fn id(self) -> &'static str {
        match self {
            Self::Cxx => "cxx",
            Self::Ruby => "ruby",
            Self::Orogen => "orogen",
            Self::Other => "other",
            Self::Config => "config",
            Self::Invalid => "invalid",
        }
    }

    /// Label shown to the user.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cxx => "C/C++",
            Self::Ruby => "Ruby",
            Self::Orogen => "Orogen",
            Self::Other => "Other",
            Self::Config => "Configuration",
            Self::Invalid => "Invalid",
        }
    }

    /// Map a manifest type string, unknown strings become `Other`.
    pub fn from_manifest(declared: &str) -> Self {
        MANIFEST_TYPES
            .iter()
            .find(|(name, _)| *name == declared)
            .map_or(Self::Other, |(_, kind)| *kind)
    }

    /// Look a type up by identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        [Self::Cxx, Self::Ruby, Self::Orogen, Self::Other, Self::Config, Self::Invalid]
            .into_iter()
            .find(|kind| kind.id() == id)
    }

    /// Whether packages of this type can be built and debugged.
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Config | Self::Invalid)
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a package type was determined.
#[derive(Debug)]
pub enum TypeResolution {
    /// The user set the type explicitly.
    UserOverride(PackageType),

    /// The manifest declares the package with this type.
    Manifest(PackageType),

    /// The manifest loaded but does not list the package.
    NotInManifest,

    /// The manifest could not be loaded.
    ManifestUnavailable(anyhow::Error),
}

impl TypeResolution {
    /// The effective type. Missing or unloadable manifests yield `Other`.
    pub fn package_type(&self) -> PackageType {
        match self {
            Self::UserOverride(kind) | Self::Manifest(kind) => *kind,
            Self::NotInManifest | Self::ManifestUnavailable(_) => PackageType::Other,
        }
    }
}

/// Resolves the type of packages inside autoproj workspaces.
pub struct PackageTypeResolver<'a> {
    loader: &'a dyn ManifestLoader,
}

impl<'a> PackageTypeResolver<'a> {
    /// Create a resolver reading manifests through `loader`.
    pub fn new(loader: &'a dyn ManifestLoader) -> Self {
        Self { loader }
    }

    /// Resolve the type of the package at `path` in `ws`.
    ///
    /// `user_type` is the type the user set for `path`, if any. The
    /// manifest is fetched again on every call.
    pub async fn resolve(
        &self,
        ws: &Workspace,
        path: &Path,
        user_type: Option<PackageType>,
    ) -> TypeResolution {
        if let Some(kind) = user_type {
            return TypeResolution::UserOverride(kind);
        }

        let manifest = match self.loader.load(ws).await {
            Ok(manifest) => manifest,
            Err(e) => return TypeResolution::ManifestUnavailable(e),
        };

        match manifest.find_by_path(ws, path) {
            Some(pkg) => TypeResolution::Manifest(PackageType::from_manifest(&pkg.kind)),
            None => TypeResolution::NotInManifest,
        }
    }
}
