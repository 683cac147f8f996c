//! GitHub repository service authenticated as a GitHub App

use crate::auth::{AppAuthenticator, AppCredentials};
use crate::error::Result;
use crate::platform::RepositoryService;
use crate::types::{MergeMethod, MergeResult, PullRequest, RepoTarget};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

// REST shapes, limited to the fields we read

#[derive(Deserialize)]
struct ApiPullRequest {
    number: u64,
    html_url: Option<String>,
    title: Option<String>,
    head: ApiBranchRef,
    base: ApiBranchRef,
}

#[derive(Deserialize)]
struct ApiBranchRef {
    #[serde(rename = "ref")]
    ref_field: String,
}

impl From<ApiPullRequest> for PullRequest {
    fn from(pr: ApiPullRequest) -> Self {
        Self {
            number: pr.number,
            html_url: pr.html_url.unwrap_or_default(),
            head_ref: pr.head.ref_field,
            base_ref: pr.base.ref_field,
            title: pr.title.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct ApiMergeResponse {
    merged: bool,
    sha: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
struct ListPullsParams<'a> {
    state: &'static str,
    head: String,
    base: &'a str,
}

#[derive(Serialize)]
struct CreatePullBody<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Serialize)]
struct MergePullBody<'a> {
    merge_method: &'static str,
    commit_title: &'a str,
}

/// Octocrab client bound to one installation token
struct InstallationClient {
    token: String,
    client: Octocrab,
}

/// GitHub service using octocrab with installation tokens
pub struct GitHubAppService {
    auth: AppAuthenticator,
    clients: Mutex<HashMap<u64, InstallationClient>>,
    installations: Mutex<HashMap<(String, String), u64>>,
}

impl GitHubAppService {
    /// Create a new GitHub service for the given app identity
    pub fn new(credentials: AppCredentials, api_base: &str) -> Result<Self> {
        Ok(Self {
            auth: AppAuthenticator::new(credentials, api_base)?,
            clients: Mutex::new(HashMap::new()),
            installations: Mutex::new(HashMap::new()),
        })
    }

    /// The app authenticator backing this service
    pub const fn authenticator(&self) -> &AppAuthenticator {
        &self.auth
    }

    async fn resolve_installation(&self, target: &RepoTarget) -> Result<u64> {
        if let Some(id) = target.installation_id {
            return Ok(id);
        }

        let key = (target.owner.clone(), target.repo.clone());
        if let Some(id) = self.installations.lock().await.get(&key) {
            return Ok(*id);
        }

        let id = self
            .auth
            .installation_id(&target.owner, &target.repo)
            .await?;
        self.installations.lock().await.insert(key, id);
        Ok(id)
    }

    /// Get an octocrab client for the target's installation
    ///
    /// Clients are rebuilt only when the installation token rotates.
    async fn client_for(&self, target: &RepoTarget) -> Result<Octocrab> {
        let installation_id = self.resolve_installation(target).await?;
        let token = self.auth.installation_token(installation_id).await?;

        let mut clients = self.clients.lock().await;
        if let Some(cached) = clients.get(&installation_id)
            && cached.token == token.token
        {
            return Ok(cached.client.clone());
        }

        debug!(installation_id, "building installation client");
        let client = Octocrab::builder()
            .base_uri(self.auth.api_base())?
            .personal_token(token.token.clone())
            .build()?;
        clients.insert(
            installation_id,
            InstallationClient {
                token: token.token,
                client: client.clone(),
            },
        );
        Ok(client)
    }
}

#[async_trait]
impl RepositoryService for GitHubAppService {
    async fn find_open_pull_request(
        &self,
        target: &RepoTarget,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequest>> {
        debug!(%target, head, base, "finding open PR");
        let client = self.client_for(target).await?;
        let params = ListPullsParams {
            state: "open",
            head: format!("{}:{head}", target.owner),
            base,
        };

        let prs: Vec<ApiPullRequest> = client
            .get(
                format!("/repos/{}/{}/pulls", target.owner, target.repo),
                Some(&params),
            )
            .await?;

        let result = prs.into_iter().next().map(PullRequest::from);
        if let Some(ref pr) = result {
            debug!(pr_number = pr.number, "found open PR");
        } else {
            debug!("no open PR found");
        }
        Ok(result)
    }

    async fn create_pull_request(
        &self,
        target: &RepoTarget,
        head: &str,
        base: &str,
        title: &str,
    ) -> Result<PullRequest> {
        debug!(%target, head, base, "creating PR");
        let client = self.client_for(target).await?;
        let body = CreatePullBody { title, head, base };

        let pr: ApiPullRequest = client
            .post(
                format!("/repos/{}/{}/pulls", target.owner, target.repo),
                Some(&body),
            )
            .await?;

        let result = PullRequest::from(pr);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn merge_pull_request(
        &self,
        target: &RepoTarget,
        number: u64,
        method: MergeMethod,
        commit_title: &str,
    ) -> Result<MergeResult> {
        debug!(%target, pr_number = number, %method, "merging PR");
        let client = self.client_for(target).await?;
        let body = MergePullBody {
            merge_method: method.as_str(),
            commit_title,
        };

        let response: ApiMergeResponse = client
            .put(
                format!(
                    "/repos/{}/{}/pulls/{number}/merge",
                    target.owner, target.repo
                ),
                Some(&body),
            )
            .await?;

        let merge_result = MergeResult {
            merged: response.merged,
            sha: response.sha,
            message: response.message,
        };
        debug!(
            pr_number = number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    async fn delete_ref(&self, target: &RepoTarget, git_ref: &str) -> Result<()> {
        debug!(%target, git_ref, "deleting ref");
        let client = self.client_for(target).await?;

        // 204 No Content on success, so skip body decoding
        let response = client
            ._delete(
                format!(
                    "/repos/{}/{}/git/refs/{git_ref}",
                    target.owner, target.repo
                ),
                None::<&()>,
            )
            .await?;
        octocrab::map_github_error(response).await?;

        debug!(git_ref, "deleted ref");
        Ok(())
    }
}
