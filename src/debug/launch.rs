//! Tasks that must run before a debugger can attach.

use crate::context::Context;
use crate::packages::{Package, PackageType, RockPackage};
use crate::tasks::TaskDescriptor;

/// Provides the `rock-run` task of the selected orogen package.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreLaunchTaskProvider;

impl PreLaunchTaskProvider {
    /// Task deploying the debugging target of `pkg` under gdbserver.
    ///
    /// Only orogen packages with a picked target have one.
    pub fn task(pkg: &RockPackage, ctx: &Context) -> Option<TaskDescriptor> {
        if pkg.package_type() != PackageType::Orogen {
            return None;
        }
        let target = ctx.selection.debugging_target(pkg.path())?;
        let ws = pkg.workspace();
        let relative = pkg.path().strip_prefix(ws.root()).unwrap_or(pkg.path());
        let conf = ctx.selection.debug_config(pkg.path());

        let mut args = vec!["exec".to_string(), "rock-run".to_string()];
        if conf.orogen.start {
            args.push("--start".to_string());
        }
        if conf.orogen.gui {
            args.push("--gui".to_string());
        }
        args.push("--gdbserver".to_string());
        if let Some(dir) = &conf.orogen.conf_dir {
            args.push("--conf-dir".to_string());
            args.push(dir.display().to_string());
        }
        args.push(target.name().to_string());

        let name = format!("Run {} (gdbserver)", relative.display());
        let task = TaskDescriptor::rock(name, ws, args)
            .with_cwd(conf.cwd)
            .with_scope(ctx.host().workspace_folder(pkg.path()));
        Some(task)
    }

    /// Tasks of the selected package, at most one.
    pub async fn provide_tasks(ctx: &Context) -> Vec<TaskDescriptor> {
        match ctx.get_selected_package().await {
            Package::Rock(pkg) => Self::task(&pkg, ctx).into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{OrogenDebugConfig, RockDebugConfig};
    use crate::debug::DebuggingTarget;
    use crate::testing::TestSetup;

    #[tokio::test]
    async fn test_empty_workspace_provides_nothing() {
        let setup = TestSetup::new();
        let ctx = setup.context();
        assert!(PreLaunchTaskProvider::provide_tasks(&ctx).await.is_empty());
    }

    #[tokio::test]
    async fn test_orogen_task() {
        let setup = TestSetup::new();
        let path = setup.package_dir("one", "drivers/orogen/iodrivers_base");
        let mut ctx = setup.context_with_folders(&[&path]);
        ctx.set_selected_package(&path).unwrap();
        ctx.selection.set_package_type(&path, PackageType::Orogen).unwrap();
        ctx.selection
            .set_debugging_target(&path, DebuggingTarget::new("task1", "/bin/deployment"))
            .unwrap();
        ctx.selection
            .set_debug_config(
                &path,
                RockDebugConfig {
                    cwd: Some(path.clone()),
                    args: vec!["--test".to_string()],
                    orogen: OrogenDebugConfig {
                        start: true,
                        gui: true,
                        conf_dir: Some("/conf".into()),
                    },
                },
            )
            .unwrap();

        let tasks = PreLaunchTaskProvider::provide_tasks(&ctx).await;
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.name, "Run drivers/orogen/iodrivers_base (gdbserver)");
        assert_eq!(task.source, "rock");
        assert_eq!(task.command_path, setup.root().join("one/.autoproj/bin/autoproj"));
        assert_eq!(
            task.args,
            vec!["exec", "rock-run", "--start", "--gui", "--gdbserver", "--conf-dir", "/conf", "task1"]
        );
        assert_eq!(task.cwd.as_deref(), Some(path.as_path()));
        assert_eq!(task.scope.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_orogen_task_flags_follow_settings() {
        let setup = TestSetup::new();
        let path = setup.package_dir("one", "orogen_pkg");
        let mut ctx = setup.context_with_folders(&[&path]);
        ctx.selection.set_package_type(&path, PackageType::Orogen).unwrap();
        ctx.selection.set_debugging_target(&path, DebuggingTarget::new("task1", "/bin/d")).unwrap();

        let Package::Rock(pkg) = ctx.get_package_by_path(&path).await else {
            panic!("expected a rock package");
        };
        let task = PreLaunchTaskProvider::task(&pkg, &ctx).unwrap();
        assert_eq!(task.args, vec!["exec", "rock-run", "--gdbserver", "task1"]);
        assert_eq!(task.cwd.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_no_task_without_target_or_for_other_types() {
        let setup = TestSetup::new();
        let path = setup.package_dir("one", "pkg");
        let mut ctx = setup.context_with_folders(&[&path]);
        ctx.set_selected_package(&path).unwrap();

        ctx.selection.set_package_type(&path, PackageType::Orogen).unwrap();
        assert!(PreLaunchTaskProvider::provide_tasks(&ctx).await.is_empty());

        ctx.selection.set_debugging_target(&path, DebuggingTarget::new("t", "/t")).unwrap();
        ctx.selection.set_package_type(&path, PackageType::Cxx).unwrap();
        assert!(PreLaunchTaskProvider::provide_tasks(&ctx).await.is_empty());
    }
}
