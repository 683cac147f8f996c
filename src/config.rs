//! Runtime configuration
//!
//! Every setting can be given as a flag or an environment variable; a `.env`
//! file is loaded into the environment by the binary before parsing.

use crate::auth::AppCredentials;
use crate::error::{Error, Result};
use crate::types::MergeMethod;
use crate::webhook::ServerSettings;
use crate::workflow::WorkflowSettings;
use clap::Parser;
use clap::builder::BoolishValueParser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// GitHub App webhook receiver that turns pushes to a branch into a PR,
/// merges it and deletes the branch
#[derive(Debug, Clone, Parser)]
#[command(name = "push-pilot", version)]
pub struct Config {
    /// GitHub App id
    #[arg(long, env = "APP_ID")]
    pub app_id: u64,

    /// Path to the app's PEM private key
    #[arg(long, env = "PRIVATE_KEY_PATH")]
    pub private_key_path: PathBuf,

    /// Secret used to sign webhook deliveries
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: String,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Path that receives webhook deliveries
    #[arg(long, env = "WEBHOOK_PATH", default_value = "/api/webhook")]
    pub webhook_path: String,

    /// Branch whose pushes trigger the workflow
    #[arg(long, env = "TARGET_BRANCH", default_value = "mass-bump-versions")]
    pub target_branch: String,

    /// Branch the pull request merges into
    #[arg(long, env = "BASE_BRANCH", default_value = "master")]
    pub base_branch: String,

    /// Title for the pull request and its merge commit
    #[arg(
        long,
        env = "PR_TITLE",
        default_value = "[skip ci] chore: Mass bump versions"
    )]
    pub pr_title: String,

    /// Merge method: squash, merge or rebase
    #[arg(long, env = "MERGE_METHOD", default_value = "squash")]
    pub merge_method: MergeMethod,

    /// Delete the branch after merging
    #[arg(
        long,
        env = "DELETE_BRANCH",
        default_value = "true",
        value_parser = BoolishValueParser::new(),
        action = clap::ArgAction::Set
    )]
    pub delete_branch: bool,

    /// GitHub REST API base URL (GitHub Enterprise: https://HOST/api/v3)
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub github_api_url: Url,

    /// Maximum workflow runs in flight at once
    #[arg(long, env = "MAX_IN_FLIGHT", default_value_t = 16)]
    pub max_in_flight: usize,

    /// Seconds allowed for reading and answering one delivery
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,
}

impl Config {
    /// Reject values that parse but can't work
    pub fn validate(&self) -> Result<()> {
        if self.webhook_secret.trim().is_empty() {
            return Err(Error::Config("WEBHOOK_SECRET must not be empty".to_string()));
        }
        if !self.webhook_path.starts_with('/') {
            return Err(Error::Config(format!(
                "WEBHOOK_PATH must start with '/', got '{}'",
                self.webhook_path
            )));
        }
        if self.target_branch.trim().is_empty() || self.base_branch.trim().is_empty() {
            return Err(Error::Config(
                "TARGET_BRANCH and BASE_BRANCH must not be empty".to_string(),
            ));
        }
        if self.target_branch == self.base_branch {
            return Err(Error::Config(format!(
                "TARGET_BRANCH and BASE_BRANCH are both '{}'",
                self.target_branch
            )));
        }
        if self.max_in_flight == 0 {
            return Err(Error::Config("MAX_IN_FLIGHT must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Read the private key and build the app identity
    pub fn load_credentials(&self) -> Result<AppCredentials> {
        AppCredentials::load(self.app_id, &self.private_key_path)
    }

    /// Workflow settings derived from this config
    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            target_branch: self.target_branch.clone(),
            base_branch: self.base_branch.clone(),
            pr_title: self.pr_title.clone(),
            merge_method: self.merge_method,
            delete_branch: self.delete_branch,
        }
    }

    /// Server settings derived from this config
    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            host: self.host,
            port: self.port,
            webhook_path: self.webhook_path.clone(),
            max_in_flight: self.max_in_flight,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
