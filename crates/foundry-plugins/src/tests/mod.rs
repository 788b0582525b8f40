//! Crate-level tests combining descriptors with the packager.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::descriptor::{ComponentRole, PluginDescriptor};
use crate::namer::UniqueNamer;
use crate::packager::{ComponentPackager, MANIFEST_FILE};
use crate::test_support::FakePackageTool;

const DESCRIPTOR: &str = r#"{
    "shortName": "flanker",
    "experimentName": "Flanker Task",
    "apiControllers": [
        { "location": "api/a", "mountPath": "/flanker/a" },
        { "location": "api/b", "mountPath": "/flanker/b" }
    ],
    "webPage": { "location": "web" },
    "worker": { "location": "worker" }
}"#;

fn write_component(dir: &Path, name: &str) {
    std::fs::create_dir_all(dir).expect("create component dir");
    std::fs::write(
        dir.join(MANIFEST_FILE),
        format!("{{ \"name\": \"{name}\", \"version\": \"0.1.0\" }}"),
    )
    .expect("write manifest");
}

#[tokio::test]
async fn packages_every_npm_component_of_a_plugin_with_distinct_names() {
    let root = tempfile::tempdir().expect("temp dir");
    let plugin_dir = root.path().join("flanker");
    let staging = root.path().join("staging");
    let descriptor = PluginDescriptor::from_json_str(DESCRIPTOR).expect("descriptor");

    let specs: Vec<_> = descriptor
        .component_specs(&plugin_dir)
        .into_iter()
        .filter(|spec| spec.role() != ComponentRole::Worker)
        .collect();
    for spec in &specs {
        write_component(spec.source_dir(), "flanker-part");
    }

    let packager = ComponentPackager::new(Arc::new(FakePackageTool::new()), UniqueNamer);
    let mut names = HashSet::new();
    for spec in &specs {
        let packaged = packager.package(spec, &staging).await.expect("package");
        assert!(packaged.name().starts_with(spec.role().name_prefix()));
        names.insert(packaged.into_name());
    }

    assert_eq!(names.len(), 3, "two controllers and one web page");
    let staged = std::fs::read_dir(&staging).expect("read staging").count();
    assert_eq!(staged, 3);
}
