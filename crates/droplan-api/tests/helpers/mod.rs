//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p droplan-api --test files_test` or
//! `cargo test -p droplan-api`. Each test gets its own temporary storage
//! directory, so tests are fully isolated and need no external services.

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use droplan_api::setup::routes;
use droplan_api::state::AppState;
use droplan_core::Config;
use droplan_registry::Registry;
use std::sync::Arc;
use tempfile::TempDir;

/// Test application: server plus the temp dir backing its storage.
pub struct TestApp {
    pub server: TestServer,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Setup test app over an isolated storage directory.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_config(|config| config).await
}

/// Setup test app with a tweaked configuration (e.g. trusted proxies).
pub async fn setup_test_app_with_config(adjust: impl FnOnce(Config) -> Config) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

    let config = adjust(Config::new(3000, temp_dir.path()));

    let registry = Registry::open(temp_dir.path())
        .await
        .expect("Failed to open registry");
    let state = Arc::new(AppState::new(config, registry));

    let app = routes::setup_routes(state).expect("Failed to setup routes");
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        _temp_dir: temp_dir,
    }
}

/// Multipart form for a file upload, optionally tagged with a device.
pub fn upload_form(
    filename: &str,
    contents: &[u8],
    device_id: Option<&str>,
    device_name: Option<&str>,
) -> MultipartForm {
    let mut form = MultipartForm::new().add_part(
        "file",
        Part::bytes(contents.to_vec()).file_name(filename.to_string()),
    );
    if let Some(id) = device_id {
        form = form.add_text("deviceId", id.to_string());
    }
    if let Some(name) = device_name {
        form = form.add_text("deviceName", name.to_string());
    }
    form
}
