//! Shared fixtures for repository tests.

use tempfile::TempDir;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::hub::CampusHub;
use crate::session::Session;

pub(crate) struct TestHub {
    pub hub: CampusHub,
    _temp_dir: TempDir, // Keep alive for duration of test
}

pub(crate) async fn setup_hub() -> TestHub {
    let temp_dir = TempDir::new().unwrap();
    let hub = CampusHub::open_at(
        &temp_dir.path().join("test.db"),
        &temp_dir.path().join("blobs"),
        "https://cdn.campus.test",
        DEFAULT_PAGE_SIZE,
    )
    .await
    .unwrap();

    TestHub {
        hub,
        _temp_dir: temp_dir,
    }
}

/// Signs up `{name}@campus.edu` with a capitalized display name.
pub(crate) async fn sign_up(hub: &CampusHub, name: &str) -> Session {
    let mut display_name = name.to_string();
    if let Some(first) = display_name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }

    hub.sign_up(&format!("{}@campus.edu", name), "secret123", &display_name)
        .await
        .unwrap()
}
