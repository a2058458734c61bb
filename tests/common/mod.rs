pub use buildgate_test_utils::builders;
pub use buildgate_test_utils::fake_tool;
pub use buildgate_test_utils::init_tracing;

use std::sync::Arc;

use buildgate::config::ConfigFile;
use buildgate::fs::mock::MockFileSystem;
use buildgate::types::Environment;
use builders::{AppConfigBuilder, ConfigFileBuilder};

/// Config with a single app named `name` rooted at `/srv/<name>`.
#[allow(dead_code)]
pub fn single_app_config(name: &str, environment: Environment) -> ConfigFile {
    ConfigFileBuilder::new()
        .environment(environment)
        .base_dir("/srv")
        .with_app(name, AppConfigBuilder::new().build())
        .build()
}

#[allow(dead_code)]
pub fn mock_fs() -> (MockFileSystem, Arc<dyn buildgate::fs::FileSystem>) {
    let fs = MockFileSystem::new();
    let shared: Arc<dyn buildgate::fs::FileSystem> = Arc::new(fs.clone());
    (fs, shared)
}
