//! Filesystem fixtures shared by the crate's unit tests.

use std::fs;
use std::path::{Path, PathBuf};

use foundry_config::CoreLayout;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Directory name of the web page inside every fixture plugin.
pub(crate) const WEB_PAGE_DIR: &str = "webpage";
/// Directory name of the worker inside every fixture plugin.
pub(crate) const WORKER_DIR: &str = "worker-image";

/// Temporary plugins root plus core application.
pub(crate) struct Workspace {
    _dir: TempDir,
    plugins_root: PathBuf,
    layout: CoreLayout,
}

impl Workspace {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let plugins_root = dir.path().join("experiments");
        fs::create_dir_all(&plugins_root).expect("plugins root");
        let layout = CoreLayout::new(dir.path().join("core"));
        fs::create_dir_all(layout.api_dir()).expect("api project");
        fs::create_dir_all(layout.web_dir()).expect("web project");
        fs::create_dir_all(layout.controller_staging()).expect("controller staging");
        fs::create_dir_all(layout.web_staging()).expect("web staging");
        Self {
            _dir: dir,
            plugins_root,
            layout,
        }
    }

    pub(crate) fn plugins_root(&self) -> &Path {
        &self.plugins_root
    }

    pub(crate) const fn layout(&self) -> &CoreLayout {
        &self.layout
    }

    /// Writes a plugin with `controllers` controllers, a web page, and a
    /// worker, returning its directory.
    pub(crate) fn add_plugin(&self, short_name: &str, controllers: usize) -> PathBuf {
        let plugin_dir = self.plugins_root.join(short_name);
        let api_controllers: Vec<Value> = (0..controllers)
            .map(|index| {
                let location = controller_dir(index);
                write_manifest(&plugin_dir.join(&location), &format!("{short_name}-{location}"));
                json!({ "location": location, "mountPath": format!("/{short_name}/{index}") })
            })
            .collect();
        write_manifest(
            &plugin_dir.join(WEB_PAGE_DIR),
            &format!("{short_name}-{WEB_PAGE_DIR}"),
        );
        let worker_dir = plugin_dir.join(WORKER_DIR);
        fs::create_dir_all(&worker_dir).expect("worker dir");
        fs::write(worker_dir.join("Dockerfile"), "FROM scratch\n").expect("Dockerfile");

        let descriptor = json!({
            "shortName": short_name,
            "experimentName": format!("{short_name} experiment"),
            "tagline": "A fixture experiment",
            "apiControllers": api_controllers,
            "webPage": { "location": WEB_PAGE_DIR },
            "worker": { "location": WORKER_DIR, "service": { "restart": "always" } },
        });
        fs::write(plugin_dir.join("experiment.json"), descriptor.to_string())
            .expect("descriptor");
        plugin_dir
    }
}

/// Directory name of the controller at `index` inside a fixture plugin.
pub(crate) fn controller_dir(index: usize) -> String {
    format!("controller-{index}")
}

fn write_manifest(dir: &Path, name: &str) {
    fs::create_dir_all(dir).expect("component dir");
    let manifest = json!({ "name": name, "version": "1.0.0" });
    fs::write(dir.join("package.json"), format!("{manifest:#}\n")).expect("manifest");
}

/// Reads and parses a JSON document.
pub(crate) fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read document")).expect("parse document")
}

/// Sorted file names inside `dir`.
pub(crate) fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
