use std::{path::Path, sync::Arc};

use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    client::{service::log_failure, ClientConfig, ClientError, GitlabApi},
    config::AppConfig,
    logging::{init_logging, LoggingConfig},
    result::{AppError, Result},
    server::{ApiServer, ServerConfig},
    webhook::AppState,
    workflow::Workflow,
};

pub struct AppComponents {
    pub server: ApiServer,
    pub api: GitlabApi,
    pub _log_guard: Option<WorkerGuard>,
}

pub fn initialize_app(
    config_path: &Path,
    server_config: ServerConfig,
    debug: bool,
) -> Result<AppComponents> {
    let log_guard = initialize_logging()?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gitlab-autolabel starting up");

    let config = Arc::new(load_config(config_path)?);
    let api = create_api(&config, debug)?;

    let workflow = Workflow::new(config, Arc::new(api.clone()));
    let server = ApiServer::new(server_config, AppState::new(workflow));

    Ok(AppComponents { server, api, _log_guard: log_guard })
}

/// Load and validate the configuration file
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    let config = AppConfig::load_path(config_path)?;
    info!(
        path = %config_path.display(),
        url = %config.connection.url,
        project_id = %config.connection.project_id,
        identifiers = config.patterns.issue_identifiers.len(),
        "Configuration loaded"
    );
    Ok(config)
}

fn initialize_logging() -> Result<Option<WorkerGuard>> {
    init_logging(&LoggingConfig::from_env()).map_err(|e| AppError::Logging(e.to_string()))
}

fn create_api(config: &AppConfig, debug: bool) -> Result<GitlabApi> {
    let client_config = ClientConfig::from(&config.connection).with_debug_logging(debug);
    Ok(GitlabApi::new(client_config)?)
}

/// Fetch the configured project once so a wrong project id or token shows up
/// in the log at startup. The server starts either way.
pub async fn check_project_access(api: &GitlabApi) -> bool {
    match api.get_project().await {
        Ok(project) => {
            info!(
                project_id = %project.id,
                path = %project.path_with_namespace,
                "Connected to GitLab project"
            );
            true
        },
        Err(ClientError::NotFound { .. }) => {
            error!(
                "GitLab project not found. Probably an invalid project id or project access token"
            );
            false
        },
        Err(e) => {
            log_failure("fetch project", &e);
            false
        },
    }
}
