//! GitHub REST API client.

use crate::collaborators::{CollaboratorReport, CollaboratorSet, Permission};
use crate::error::{MigrationError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Hosting operations the pipeline relies on.
#[async_trait]
pub trait HostingPort: Send + Sync {
    /// Whether `owner/repo` exists.
    async fn repository_exists(&self, owner: &str, repo: &str) -> Result<bool>;

    /// Create `owner/repo` and attach collaborators one by one.
    ///
    /// Only creation failures are returned as errors; collaborator failures are counted.
    async fn create_repository_with_collaborators(
        &self,
        owner: &str,
        repo: &str,
        private: bool,
        collaborators: &CollaboratorSet,
    ) -> Result<CollaboratorReport>;

    /// Whether GitHub Actions may run in `owner/repo`.
    async fn actions_enabled(&self, owner: &str, repo: &str) -> Result<bool>;

    /// Allow or forbid GitHub Actions in `owner/repo`.
    async fn set_actions_enabled(&self, owner: &str, repo: &str, enabled: bool) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    private: bool,
    description: String,
    auto_init: bool,
}

#[derive(Debug, Serialize)]
struct CollaboratorRequest {
    permission: Permission,
}

#[derive(Debug, Serialize, Deserialize)]
struct ActionsPermissions {
    enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
struct GitHubErrorBody {
    #[serde(default)]
    errors: Vec<GitHubFieldError>,
}

#[derive(Debug, Deserialize)]
struct GitHubFieldError {
    field: Option<String>,
    code: Option<String>,
}

impl GitHubErrorBody {
    /// The repository name is already taken under this owner.
    fn is_name_conflict(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.field.as_deref() == Some("name") && e.code.as_deref() == Some("custom"))
    }
}

/// Client for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    personal_owner_override: bool,
}

impl GitHubClient {
    /// Create a client for the public API.
    pub fn new(token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("rehome/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MigrationError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
            token,
            personal_owner_override: false,
        })
    }

    /// Point the client at another API root (GitHub Enterprise, mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Always create repositories under the authenticated user's account.
    pub fn with_personal_owner_override(mut self, enabled: bool) -> Self {
        self.personal_owner_override = enabled;
        self
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(MigrationError::MissingCredential)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.token()?;
        Ok(self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept", "application/vnd.github.v3+json"))
    }

    async fn send(builder: RequestBuilder) -> Result<Response> {
        builder
            .send()
            .await
            .map_err(|e| MigrationError::NetworkError(e.to_string()))
    }

    async fn describe_failure(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("Request failed with status {status}: {body}")
    }

    /// `GET /repos/{owner}/{repo}`: 200 exists, 404 does not.
    pub async fn repository_exists(&self, owner: &str, repo: &str) -> Result<bool> {
        let response = Self::send(self.request(Method::GET, &format!("/repos/{owner}/{repo}"))?).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(MigrationError::ApiError(
                Self::describe_failure(response).await,
            )),
        }
    }

    /// Login of the token's owner.
    pub async fn current_user(&self) -> Result<String> {
        let response = Self::send(self.request(Method::GET, "/user")?).await?;
        if !response.status().is_success() {
            return Err(MigrationError::ApiError(
                Self::describe_failure(response).await,
            ));
        }

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| MigrationError::ApiError(e.to_string()))?;
        Ok(user.login)
    }

    /// `GET /orgs/{owner}`: 200 organization, 404 not one.
    pub async fn is_organization(&self, owner: &str) -> Result<bool> {
        let response = Self::send(self.request(Method::GET, &format!("/orgs/{owner}"))?).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(MigrationError::ApiError(
                Self::describe_failure(response).await,
            )),
        }
    }

    /// Create `owner/repo`, routing between the personal and organization endpoints.
    ///
    /// A name conflict is treated as success.
    pub async fn create_repository(&self, owner: &str, repo: &str, private: bool) -> Result<()> {
        self.token()?;
        let path = self.creation_path(owner).await?;

        let body = CreateRepoRequest {
            name: repo,
            private,
            description: format!("Repository created automatically for {repo}"),
            auto_init: false,
        };

        info!(%owner, %repo, private, endpoint = %path, "Creating repository");
        let response = Self::send(self.request(Method::POST, &path)?.json(&body)).await?;
        let status = response.status();

        if status == StatusCode::CREATED {
            info!(%owner, %repo, "Repository created");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let parsed: GitHubErrorBody = serde_json::from_str(&text).unwrap_or_default();
            if parsed.is_name_conflict() {
                info!(%owner, %repo, "Repository already exists");
                return Ok(());
            }
        }

        Err(MigrationError::CreationFailed(format!(
            "Request failed with status {status}: {text}"
        )))
    }

    async fn creation_path(&self, owner: &str) -> Result<String> {
        if self.personal_owner_override {
            debug!(%owner, "Personal owner configured, using user endpoint");
            return Ok("/user/repos".to_string());
        }

        let login = self.current_user().await?;
        if login == owner {
            return Ok("/user/repos".to_string());
        }

        match self.is_organization(owner).await {
            Ok(true) => Ok(format!("/orgs/{owner}/repos")),
            Ok(false) => Err(MigrationError::ForeignUserRepositoryDenied(
                owner.to_string(),
            )),
            Err(e) => {
                warn!(%owner, error = %e, "Organization lookup failed, assuming organization");
                Ok(format!("/orgs/{owner}/repos"))
            }
        }
    }

    /// `PUT /repos/{owner}/{repo}/collaborators/{username}`
    pub async fn add_collaborator(
        &self,
        owner: &str,
        repo: &str,
        username: &str,
        permission: Permission,
    ) -> Result<()> {
        let path = format!("/repos/{owner}/{repo}/collaborators/{username}");
        let response = Self::send(
            self.request(Method::PUT, &path)?
                .json(&CollaboratorRequest { permission }),
        )
        .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::NO_CONTENT => {
                info!(%owner, %repo, %username, %permission, "Added collaborator");
                Ok(())
            }
            _ => Err(MigrationError::CollaboratorAddFailed {
                username: username.to_string(),
                reason: Self::describe_failure(response).await,
            }),
        }
    }

    /// `GET /repos/{owner}/{repo}/actions/permissions`
    pub async fn actions_enabled(&self, owner: &str, repo: &str) -> Result<bool> {
        let path = format!("/repos/{owner}/{repo}/actions/permissions");
        let response = Self::send(self.request(Method::GET, &path)?).await?;
        if response.status() != StatusCode::OK {
            return Err(MigrationError::ApiError(
                Self::describe_failure(response).await,
            ));
        }

        let permissions: ActionsPermissions = response
            .json()
            .await
            .map_err(|e| MigrationError::ApiError(e.to_string()))?;
        Ok(permissions.enabled)
    }

    /// `PUT /repos/{owner}/{repo}/actions/permissions`
    pub async fn set_actions_enabled(&self, owner: &str, repo: &str, enabled: bool) -> Result<()> {
        let path = format!("/repos/{owner}/{repo}/actions/permissions");
        let response = Self::send(
            self.request(Method::PUT, &path)?
                .json(&ActionsPermissions { enabled }),
        )
        .await?;

        if response.status() != StatusCode::NO_CONTENT {
            return Err(MigrationError::ApiError(
                Self::describe_failure(response).await,
            ));
        }

        info!(%owner, %repo, enabled, "Updated Actions permissions");
        Ok(())
    }
}

#[async_trait]
impl HostingPort for GitHubClient {
    async fn repository_exists(&self, owner: &str, repo: &str) -> Result<bool> {
        GitHubClient::repository_exists(self, owner, repo).await
    }

    async fn create_repository_with_collaborators(
        &self,
        owner: &str,
        repo: &str,
        private: bool,
        collaborators: &CollaboratorSet,
    ) -> Result<CollaboratorReport> {
        self.create_repository(owner, repo, private).await?;

        let mut report = CollaboratorReport::default();
        for collaborator in collaborators.iter() {
            match self
                .add_collaborator(owner, repo, &collaborator.username, collaborator.permission)
                .await
            {
                Ok(()) => report.added += 1,
                Err(e) => {
                    warn!(%owner, %repo, error = %e, "Collaborator not added");
                    report.failed.push(collaborator.username.clone());
                }
            }
        }

        if report.attempted() > 0 {
            info!(
                %owner,
                %repo,
                added = report.added,
                failed = report.failed.len(),
                "Collaborators processed"
            );
        }
        Ok(report)
    }

    async fn actions_enabled(&self, owner: &str, repo: &str) -> Result<bool> {
        GitHubClient::actions_enabled(self, owner, repo).await
    }

    async fn set_actions_enabled(&self, owner: &str, repo: &str, enabled: bool) -> Result<()> {
        GitHubClient::set_actions_enabled(self, owner, repo, enabled).await
    }
}
