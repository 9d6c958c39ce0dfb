//! Test: Environment stage - defaults, required values, vault file

use crate::helpers::*;
use deploy_pipeline::core::context::{ENV_REGISTRY, ENV_SSH_HOST_DOMAIN};
use deploy_pipeline::core::inputs::*;
use deploy_pipeline::stages::materialize;
use deploy_pipeline::{ConfigError, PipelineError, PipelineRun, RunState};

#[tokio::test]
async fn test_host_domain_default_and_override() {
    let fixture = Fixture::ubuntu();

    let out = materialize(&full_provider(), &fixture.config).await.unwrap();
    assert_eq!(out.environment.get(ENV_SSH_HOST_DOMAIN), Some("host1.example.com"));

    let provider = full_provider().with_input(INPUT_SSH_HOST_DOMAIN, "sso.example.org");
    let out = materialize(&provider, &fixture.config).await.unwrap();
    assert_eq!(out.environment.get(ENV_SSH_HOST_DOMAIN), Some("sso.example.org"));
}

#[tokio::test]
async fn test_optional_values_default_to_empty() {
    let fixture = Fixture::ubuntu();

    let out = materialize(&full_provider(), &fixture.config).await.unwrap();

    assert_eq!(out.environment.get(ENV_REGISTRY), Some(""));
    assert_eq!(out.handoff.sudo_password.expose(), "");
    assert_eq!(out.handoff.domain, "example.com");
}

#[tokio::test]
async fn test_each_required_secret_is_enforced() {
    for name in [SECRET_SSH_USER, SECRET_SSH_PRIVATE_KEY, SECRET_ANSIBLE_VAULT_PASSWORD] {
        let fixture = Fixture::ubuntu();
        let provider = full_provider().without_secret(name);

        let err = materialize(&provider, &fixture.config).await.unwrap_err();

        assert!(
            matches!(err, PipelineError::Configuration(ConfigError::MissingSecret(n)) if n == name),
            "{} should be required, got {}",
            name,
            err
        );
        assert!(!fixture.vault_file().exists());
    }
}

#[tokio::test]
async fn test_vault_secret_round_trips_exactly() {
    let fixture = Fixture::ubuntu();
    let secret = "  spaced\tand\nmulti-line\n\n";
    let provider = full_provider().with_secret(SECRET_ANSIBLE_VAULT_PASSWORD, secret);

    materialize(&provider, &fixture.config).await.unwrap();

    assert_eq!(std::fs::read(fixture.vault_file()).unwrap(), secret.as_bytes());
}

#[cfg(unix)]
#[tokio::test]
async fn test_vault_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = Fixture::ubuntu();
    materialize(&full_provider(), &fixture.config).await.unwrap();

    let mode = std::fs::metadata(fixture.vault_file()).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
}

/// A used run passed back in is replaced rather than corrupted
#[tokio::test]
async fn test_reused_run_starts_fresh() {
    let fixture = Fixture::ubuntu();
    let controller =
        deploy_pipeline::PipelineController::new(RecordingRunner::new(), fixture.config.clone());

    let mut run = PipelineRun::new();
    controller.execute(&full_provider(), &mut run).await.unwrap();
    let first_id = run.execution_id;

    controller.execute(&full_provider(), &mut run).await.unwrap();
    assert_ne!(run.execution_id, first_id);
    assert_eq!(run.state, RunState::Deployed);
}

/// A config assembled in code is validated before anything runs
#[tokio::test]
async fn test_empty_install_step_fails_before_any_process() {
    let mut fixture = Fixture::ubuntu();
    fixture.config.install_steps[2].command.clear();
    let runner = RecordingRunner::new();

    let result = run_pipeline(&fixture, &full_provider(), runner.clone()).await;

    assert!(matches!(
        result.error(),
        PipelineError::Configuration(ConfigError::Invalid(_))
    ));
    assert!(runner.calls().is_empty());
    assert!(!fixture.vault_file().exists());
    assert_eq!(result.run.state, RunState::Failed { stage: deploy_pipeline::Stage::Environment });
}
