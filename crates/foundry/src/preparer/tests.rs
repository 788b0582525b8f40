//! Unit tests for the experiment preparer.

use std::sync::Arc;

use foundry_plugins::packager::MANIFEST_BACKUP_FILE;
use foundry_plugins::test_support::{FakeImageBuilder, FakePackageTool};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::registry::MANAGED_MARKER;
use crate::tests::support::{
    WEB_PAGE_DIR, WORKER_DIR, Workspace, controller_dir, file_names, read_json,
};

#[fixture]
fn workspace() -> Workspace {
    Workspace::new()
}

fn preparer(
    workspace: &Workspace,
    tool: FakePackageTool,
    images: FakeImageBuilder,
) -> ExperimentPreparer<FakePackageTool, FakeImageBuilder> {
    ExperimentPreparer::new(
        ComponentPackager::new(Arc::new(tool), UniqueNamer),
        Arc::new(images),
        UniqueNamer,
        workspace.layout().clone(),
    )
}

async fn load(plugin_dir: &Path) -> PluginDescriptor {
    PluginDescriptor::load(&plugin_dir.join("experiment.json"))
        .await
        .expect("descriptor")
}

#[rstest]
#[tokio::test]
async fn prepares_every_component(workspace: Workspace) {
    let plugin_dir = workspace.add_plugin("stroop", 2);
    let descriptor = load(&plugin_dir).await;
    let preparer = preparer(&workspace, FakePackageTool::new(), FakeImageBuilder::new());

    let prepared = preparer
        .prepare(&plugin_dir, descriptor)
        .await
        .expect("prepare");

    assert_eq!(prepared.plugin(), "stroop");
    let mounts: Vec<&str> = prepared
        .controllers()
        .iter()
        .map(ControllerEntry::mount_path)
        .collect();
    assert_eq!(mounts, ["/stroop/0", "/stroop/1"], "descriptor order kept");
    assert!(
        prepared
            .controllers()
            .iter()
            .all(|entry| entry.name().starts_with("foundry-ctl-"))
    );
    assert!(prepared.web_module().name().starts_with("foundry-web-"));
    assert_eq!(prepared.web_module().short_name(), "stroop");

    let service = prepared.service();
    assert!(service.name().starts_with("foundry-wkr-"));
    assert_eq!(service.image(), Some(service.name()));
    assert_eq!(service.definition().get(MANAGED_MARKER), Some(&json!(true)));
    assert_eq!(service.definition().get("restart"), Some(&json!("always")));

    assert_eq!(file_names(workspace.layout().controller_staging()).len(), 2);
    assert_eq!(file_names(workspace.layout().web_staging()).len(), 1);
}

#[rstest]
#[tokio::test]
async fn worker_image_is_tagged_with_the_service_name(workspace: Workspace) {
    let plugin_dir = workspace.add_plugin("flanker", 1);
    let descriptor = load(&plugin_dir).await;
    let images = Arc::new(FakeImageBuilder::new());
    let preparer = ExperimentPreparer::new(
        ComponentPackager::new(Arc::new(FakePackageTool::new()), UniqueNamer),
        Arc::clone(&images),
        UniqueNamer,
        workspace.layout().clone(),
    );

    let prepared = preparer
        .prepare(&plugin_dir, descriptor)
        .await
        .expect("prepare");

    assert_eq!(
        images.builds(),
        [(
            plugin_dir.join(WORKER_DIR),
            prepared.service().name().to_owned()
        )]
    );
}

#[rstest]
#[tokio::test]
async fn plugin_without_controllers_still_converges(workspace: Workspace) {
    let plugin_dir = workspace.add_plugin("nback", 0);
    let descriptor = load(&plugin_dir).await;
    let preparer = preparer(&workspace, FakePackageTool::new(), FakeImageBuilder::new());

    let prepared = preparer
        .prepare(&plugin_dir, descriptor)
        .await
        .expect("prepare");

    assert!(prepared.controllers().is_empty());
    assert!(file_names(workspace.layout().controller_staging()).is_empty());
}

#[rstest]
#[tokio::test]
async fn web_page_failure_is_tagged_with_the_plugin(workspace: Workspace) {
    let plugin_dir = workspace.add_plugin("stroop", 1);
    let descriptor = load(&plugin_dir).await;
    let preparer = preparer(
        &workspace,
        FakePackageTool::new().failing_build(WEB_PAGE_DIR),
        FakeImageBuilder::new(),
    );

    let err = preparer
        .prepare(&plugin_dir, descriptor)
        .await
        .expect_err("web page build fails");

    assert_eq!(err.plugin(), Some("stroop"));
    assert!(matches!(
        err,
        AssemblyError::Experiment {
            source: PluginError::Build { ref dir, .. },
            ..
        } if dir == &plugin_dir.join(WEB_PAGE_DIR)
    ));
}

#[rstest]
#[tokio::test]
async fn worker_failure_is_an_image_error(workspace: Workspace) {
    let plugin_dir = workspace.add_plugin("stroop", 1);
    let descriptor = load(&plugin_dir).await;
    let preparer = preparer(
        &workspace,
        FakePackageTool::new(),
        FakeImageBuilder::new().failing(WORKER_DIR),
    );

    let err = preparer
        .prepare(&plugin_dir, descriptor)
        .await
        .expect_err("image build fails");

    assert!(matches!(
        err,
        AssemblyError::Experiment {
            source: PluginError::Image { ref tag, .. },
            ..
        } if tag.starts_with("foundry-wkr-")
    ));
}

#[rstest]
#[tokio::test]
async fn only_the_first_of_several_failures_is_reported(workspace: Workspace) {
    let plugin_dir = workspace.add_plugin("stroop", 2);
    let descriptor = load(&plugin_dir).await;
    let preparer = preparer(
        &workspace,
        FakePackageTool::new()
            .failing_pack(controller_dir(0))
            .failing_pack(controller_dir(1)),
        FakeImageBuilder::new(),
    );

    let err = preparer
        .prepare(&plugin_dir, descriptor)
        .await
        .expect_err("controllers fail");

    assert!(matches!(
        err,
        AssemblyError::Experiment {
            source: PluginError::Package { .. },
            ..
        }
    ));
}

#[rstest]
#[tokio::test]
async fn failure_waits_for_slower_components(workspace: Workspace) {
    let plugin_dir = workspace.add_plugin("stroop", 2);
    let descriptor = load(&plugin_dir).await;
    let tool = FakePackageTool::new()
        .failing_build(WEB_PAGE_DIR)
        .slow_build(controller_dir(1), 100);
    let preparer = preparer(&workspace, tool, FakeImageBuilder::new());

    let err = preparer
        .prepare(&plugin_dir, descriptor)
        .await
        .expect_err("web page fails");

    assert!(matches!(err, AssemblyError::Experiment { .. }));
    assert_eq!(file_names(workspace.layout().controller_staging()).len(), 2);
    let component = plugin_dir.join(controller_dir(1));
    assert!(!component.join(MANIFEST_BACKUP_FILE).exists());
    assert_eq!(
        read_json(&component.join("package.json"))["name"],
        json!("stroop-controller-1")
    );
}
