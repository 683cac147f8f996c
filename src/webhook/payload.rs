//! Push payload decoding

use crate::error::{Error, Result};
use crate::types::PushEvent;
use serde::Deserialize;

#[derive(Deserialize)]
struct PushPayload {
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    deleted: bool,
    repository: RepositoryPayload,
    installation: Option<InstallationPayload>,
    pull_request: Option<PullRequestPayload>,
}

#[derive(Deserialize)]
struct RepositoryPayload {
    name: String,
    owner: OwnerPayload,
}

// Push payloads carry both `login` and `name` on the owner; older hook
// formats only had `name`.
#[derive(Deserialize)]
struct OwnerPayload {
    login: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct InstallationPayload {
    id: u64,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    number: u64,
}

/// Decode a `push` delivery body into a [`PushEvent`]
pub fn parse_push_event(body: &[u8], delivery_id: Option<String>) -> Result<PushEvent> {
    let payload: PushPayload =
        serde_json::from_slice(body).map_err(|e| Error::Payload(e.to_string()))?;

    let owner = payload
        .repository
        .owner
        .login
        .or(payload.repository.owner.name)
        .ok_or_else(|| Error::Payload("repository owner has no login".to_string()))?;

    Ok(PushEvent {
        git_ref: payload.git_ref,
        deleted: payload.deleted,
        repository_owner: owner,
        repository_name: payload.repository.name,
        pull_request_number: payload.pull_request.map(|pr| pr.number),
        installation_id: payload.installation.map(|i| i.id),
        delivery_id,
    })
}
