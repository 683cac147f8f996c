//! Shared test helpers

#![allow(dead_code)]

mod mock_service;

pub use mock_service::{MockRepositoryService, ServiceCall};

use push_pilot::types::{PullRequest, PushEvent};
use push_pilot::workflow::WorkflowSettings;
use serde_json::json;
use std::path::PathBuf;

/// Ref of the default trigger branch
pub const TRIGGER_REF: &str = "refs/heads/mass-bump-versions";

/// Settings matching the out-of-the-box configuration
pub fn default_settings() -> WorkflowSettings {
    WorkflowSettings::default()
}

/// A push of `git_ref` to acme/widgets
pub fn push_event(git_ref: &str) -> PushEvent {
    PushEvent {
        git_ref: git_ref.to_string(),
        deleted: false,
        repository_owner: "acme".to_string(),
        repository_name: "widgets".to_string(),
        pull_request_number: None,
        installation_id: Some(7),
        delivery_id: Some("test-delivery".to_string()),
    }
}

/// An open PR from `head` into `base`
pub fn make_pr(number: u64, head: &str, base: &str) -> PullRequest {
    PullRequest {
        number,
        html_url: format!("https://github.com/acme/widgets/pull/{number}"),
        head_ref: head.to_string(),
        base_ref: base.to_string(),
        title: "[skip ci] chore: Mass bump versions".to_string(),
    }
}

/// A trimmed-down GitHub push payload
pub fn push_payload(git_ref: &str, deleted: bool) -> String {
    json!({
        "ref": git_ref,
        "before": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
        "after": "0000000000000000000000000000000000000000",
        "created": false,
        "deleted": deleted,
        "forced": false,
        "repository": {
            "id": 1296269,
            "name": "widgets",
            "full_name": "acme/widgets",
            "owner": { "name": "acme", "login": "acme", "id": 1 }
        },
        "pusher": { "name": "octocat", "email": "octocat@example.com" },
        "installation": { "id": 7, "node_id": "MDIzOkludGVncmF0aW9uSW5zdGFsbGF0aW9uNw==" },
        "commits": []
    })
    .to_string()
}

/// Path to a file under `tests/fixtures`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
