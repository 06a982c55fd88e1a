//! Completion of launch configurations with workspace data.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{
    expand_autoproj_paths, has_autoproj_paths, EnvironmentEntry, InterpretedDebugConfig,
    NativeDebugConfig,
};
use crate::context::Context;
use crate::packages::{Package, PackageType, RockPackage};
use crate::{Error, Result};

/// Completes launch configurations of one debugger type.
///
/// [`resolve_debug_configuration`](Self::resolve_debug_configuration) looks
/// the rock package of the folder up and hands it to
/// [`resolve_for_package`](Self::resolve_for_package). Configurations of
/// folders that are not rock packages come back unchanged.
#[async_trait]
pub trait ConfigurationProvider: Send + Sync {
    /// Configuration type handled by this provider.
    type Config: Send;

    /// Complete `config` for `pkg`.
    async fn resolve_for_package(
        &self,
        ctx: &Context,
        pkg: &RockPackage,
        config: Self::Config,
    ) -> Result<Self::Config>;

    /// Rock package of `folder`, if it is one with a known type.
    async fn resolve_package(&self, ctx: &Context, folder: Option<&Path>) -> Option<RockPackage> {
        let folder = folder?;
        match ctx.get_package_by_path(folder).await {
            Package::Rock(pkg) if pkg.package_type() != PackageType::Other => Some(pkg),
            _ => None,
        }
    }

    /// Complete `config` for the package of `folder`.
    async fn resolve_debug_configuration(
        &self,
        ctx: &Context,
        folder: Option<&Path>,
        config: Self::Config,
    ) -> Result<Self::Config> {
        match self.resolve_package(ctx, folder).await {
            Some(pkg) => self.resolve_for_package(ctx, &pkg, config).await,
            None => Ok(config),
        }
    }
}

/// Runs gdb through a stub that enters the autoproj environment.
#[derive(Debug, Clone)]
pub struct CxxConfigurationProvider {
    stubs_dir: PathBuf,
}

impl CxxConfigurationProvider {
    /// Create a provider using the debugger stubs in `stubs_dir`.
    pub fn new(stubs_dir: impl Into<PathBuf>) -> Self {
        Self { stubs_dir: stubs_dir.into() }
    }
}

/// Find `program` under the package directories when it is not a path to
/// an existing file.
fn find_program(program: &Path, builddir: &Path, prefix: &Path) -> Option<PathBuf> {
    let search = [
        builddir.to_path_buf(),
        prefix.to_path_buf(),
        builddir.join("test"),
        builddir.join("src"),
        prefix.join("bin"),
    ];
    search.iter().map(|dir| dir.join(program)).find(|candidate| candidate.exists())
}

#[async_trait]
impl ConfigurationProvider for CxxConfigurationProvider {
    type Config = NativeDebugConfig;

    async fn resolve_for_package(
        &self,
        ctx: &Context,
        pkg: &RockPackage,
        mut config: NativeDebugConfig,
    ) -> Result<NativeDebugConfig> {
        let ws = pkg.workspace();
        let info = pkg.info(ctx.manifests()).await?;

        let debugger =
            config.mi_debugger_path.clone().unwrap_or_else(|| PathBuf::from(&config.mi_mode));
        config.mi_debugger_path = Some(self.stubs_dir.join(&config.mi_mode));
        config.environment.extend([
            EnvironmentEntry::new(
                "VSCODE_ROCK_AUTOPROJ_PATH",
                ws.autoproj_exe_path().display().to_string(),
            ),
            EnvironmentEntry::new("VSCODE_ROCK_AUTOPROJ_DEBUGGER", debugger.display().to_string()),
            EnvironmentEntry::new("AUTOPROJ_CURRENT_ROOT", ws.root().display().to_string()),
        ]);

        let program = config.program.to_string_lossy().into_owned();
        if has_autoproj_paths(&program) {
            config.program = PathBuf::from(expand_autoproj_paths(&info, &program));
        }
        if let Some(cwd) = config.cwd.as_ref().map(|c| c.to_string_lossy().into_owned()) {
            if has_autoproj_paths(&cwd) {
                config.cwd = Some(PathBuf::from(expand_autoproj_paths(&info, &cwd)));
            }
        }

        if !config.program.exists() {
            match find_program(&config.program, &info.builddir, &info.prefix) {
                Some(found) => config.program = found,
                None => {
                    tracing::debug!(program = %config.program.display(), "Program not found in package directories");
                }
            }
        }
        if config.cwd.is_none() {
            config.cwd = config.program.parent().map(Path::to_path_buf);
        }
        Ok(config)
    }
}

/// Runs Ruby scripts through the autoproj bundler wrapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct RubyConfigurationProvider;

#[async_trait]
impl ConfigurationProvider for RubyConfigurationProvider {
    type Config = InterpretedDebugConfig;

    async fn resolve_for_package(
        &self,
        ctx: &Context,
        pkg: &RockPackage,
        mut config: InterpretedDebugConfig,
    ) -> Result<InterpretedDebugConfig> {
        let ws = pkg.workspace();
        config.use_bundler = true;
        config.path_to_bundler = Some(ws.autoproj_exe_path());
        config.env.insert("AUTOPROJ_CURRENT_ROOT".to_string(), ws.root().display().to_string());

        let name = config.program.to_string_lossy().into_owned();
        config.program = ctx.bridge().which(ws, &name).await.map_err(Error::Bridge)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::autoproj::PackageInfo;
    use crate::testing::TestSetup;

    fn cmake_package(setup: &TestSetup) -> PathBuf {
        let path = setup.package_dir("one", "drivers/iodrivers_base");
        setup.manifests.add_package(
            "drivers/iodrivers_base",
            "Autobuild::CMake",
            PackageInfo {
                srcdir: path.clone(),
                builddir: path.join("build"),
                prefix: setup.root().join("one/install"),
            },
        );
        path
    }

    #[tokio::test]
    async fn test_resolve_package() {
        let setup = TestSetup::new();
        let cxx = setup.package_dir("one", "cxx");
        let unknown = setup.package_dir("one", "unknown");
        setup.manifests.add_package("cxx", "Autobuild::CMake", PackageInfo::default());
        setup.manifests.add_package("unknown", "", PackageInfo::default());
        let ctx = setup.context_with_folders(&[&cxx, &unknown]);

        let provider = RubyConfigurationProvider;
        assert!(provider.resolve_package(&ctx, None).await.is_none());
        assert_eq!(provider.resolve_package(&ctx, Some(&cxx)).await.unwrap().path(), cxx);
        assert!(provider.resolve_package(&ctx, Some(&unknown)).await.is_none());
    }

    #[tokio::test]
    async fn test_non_rock_folder_is_unchanged() {
        let setup = TestSetup::new();
        let ctx = setup.context();
        let config = NativeDebugConfig::launch("test");

        let provider = CxxConfigurationProvider::new("/stubs");
        let resolved = provider
            .resolve_debug_configuration(&ctx, Some(Path::new("/tmp")), config.clone())
            .await
            .unwrap();
        assert_eq!(resolved, config);
    }

    #[tokio::test]
    async fn test_cxx_environment_and_stub() {
        let setup = TestSetup::new();
        let path = cmake_package(&setup);
        let ctx = setup.context_with_folders(&[&path]);
        let root = setup.root().join("one");

        let provider = CxxConfigurationProvider::new("/stubs");
        let config = NativeDebugConfig::launch("/usr/bin/true");
        let resolved =
            provider.resolve_debug_configuration(&ctx, Some(&path), config).await.unwrap();

        assert_eq!(resolved.mi_debugger_path, Some(PathBuf::from("/stubs/gdb")));
        let names: Vec<_> = resolved.environment.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["VSCODE_ROCK_AUTOPROJ_PATH", "VSCODE_ROCK_AUTOPROJ_DEBUGGER", "AUTOPROJ_CURRENT_ROOT"]
        );
        assert_eq!(
            resolved.environment[0].value,
            root.join(".autoproj/bin/autoproj").display().to_string()
        );
        assert_eq!(resolved.environment[1].value, "gdb");
        assert_eq!(resolved.environment[2].value, root.display().to_string());
        assert_eq!(resolved.cwd.as_deref(), Some(Path::new("/usr/bin")));
    }

    #[tokio::test]
    async fn test_cxx_keeps_configured_debugger() {
        let setup = TestSetup::new();
        let path = cmake_package(&setup);
        let ctx = setup.context_with_folders(&[&path]);

        let mut config = NativeDebugConfig::launch("/usr/bin/true");
        config.mi_debugger_path = Some("/opt/gdb/bin/gdb".into());
        let resolved = CxxConfigurationProvider::new("/stubs")
            .resolve_debug_configuration(&ctx, Some(&path), config)
            .await
            .unwrap();
        assert_eq!(resolved.environment[1].value, "/opt/gdb/bin/gdb");
        assert_eq!(resolved.mi_debugger_path, Some(PathBuf::from("/stubs/gdb")));
    }

    #[tokio::test]
    async fn test_cxx_searches_package_directories() {
        let setup = TestSetup::new();
        let path = cmake_package(&setup);
        fs::create_dir_all(path.join("build/test")).unwrap();
        fs::write(path.join("build/test/test_suite"), "").unwrap();
        let ctx = setup.context_with_folders(&[&path]);

        let mut config = NativeDebugConfig::launch("test_suite");
        config.cwd = Some("/somewhere".into());
        let resolved = CxxConfigurationProvider::new("/stubs")
            .resolve_debug_configuration(&ctx, Some(&path), config)
            .await
            .unwrap();
        assert_eq!(resolved.program, path.join("build/test/test_suite"));
        assert_eq!(resolved.cwd, Some(PathBuf::from("/somewhere")));

        let missing = CxxConfigurationProvider::new("/stubs")
            .resolve_debug_configuration(&ctx, Some(&path), NativeDebugConfig::launch("nope"))
            .await
            .unwrap();
        assert_eq!(missing.program, PathBuf::from("nope"));
    }

    #[tokio::test]
    async fn test_cxx_expands_path_tokens() {
        let setup = TestSetup::new();
        let path = cmake_package(&setup);
        let ctx = setup.context_with_folders(&[&path]);

        let mut config = NativeDebugConfig::launch("${rock:buildDir}/test/test_suite");
        config.cwd = Some("${rock:srcDir}".into());
        let resolved = CxxConfigurationProvider::new("/stubs")
            .resolve_debug_configuration(&ctx, Some(&path), config)
            .await
            .unwrap();
        assert_eq!(resolved.program, path.join("build/test/test_suite"));
        assert_eq!(resolved.cwd, Some(path));
    }

    #[tokio::test]
    async fn test_cxx_surfaces_manifest_failure() {
        let setup = TestSetup::new();
        let path = setup.package_dir("one", "pkg");
        let mut ctx = setup.context_with_folders(&[&path]);
        ctx.selection.set_package_type(&path, PackageType::Cxx).unwrap();
        setup.manifests.set_failure("manifest is gone");

        let err = CxxConfigurationProvider::new("/stubs")
            .resolve_debug_configuration(&ctx, Some(&path), NativeDebugConfig::launch("x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "manifest is gone");
    }

    #[tokio::test]
    async fn test_ruby_configuration() {
        let setup = TestSetup::new();
        let path = setup.package_dir("one", "tools/syskit");
        setup.manifests.add_package("tools/syskit", "Autobuild::Ruby", PackageInfo::default());
        let ctx = setup.context_with_folders(&[&path]);
        let root = setup.root().join("one");

        let resolved = RubyConfigurationProvider
            .resolve_debug_configuration(&ctx, Some(&path), InterpretedDebugConfig::launch("syskit"))
            .await
            .unwrap();
        assert!(resolved.use_bundler);
        assert_eq!(resolved.path_to_bundler, Some(root.join(".autoproj/bin/autoproj")));
        assert_eq!(resolved.env["AUTOPROJ_CURRENT_ROOT"], root.display().to_string());
        assert_eq!(resolved.program, root.join("bin/syskit"));
    }

    #[tokio::test]
    async fn test_ruby_surfaces_which_failure() {
        let setup = TestSetup::new();
        let path = setup.package_dir("one", "tools/syskit");
        setup.manifests.add_package("tools/syskit", "Autobuild::Ruby", PackageInfo::default());
        setup.bridge.set_failure("which failed");
        let ctx = setup.context_with_folders(&[&path]);

        let err = RubyConfigurationProvider
            .resolve_debug_configuration(&ctx, Some(&path), InterpretedDebugConfig::launch("syskit"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "which failed");
    }
}
