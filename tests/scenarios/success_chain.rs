//! Test: Success Chain - all four stages complete in order

use crate::helpers::*;
use deploy_pipeline::core::context::{ENV_SSH_HOST_DOMAIN, ENV_SUDO_PASSWORD};
use deploy_pipeline::core::inputs::{INPUT_REGISTRY, SECRET_SSH_USER, SECRET_SUDO_PASSWORD};
use deploy_pipeline::core::StageStatus;
use deploy_pipeline::{ExecutionStatus, PipelineEvent, RunState, Stage};
use std::fs;

/// Ubuntu host, every process exits 0
#[tokio::test]
async fn test_end_to_end_deploy() {
    let fixture = Fixture::ubuntu();
    let runner = RecordingRunner::new();

    let result = run_pipeline(&fixture, &full_provider(), runner.clone()).await;

    assert!(result.result.is_ok(), "pipeline failed: {:?}", result.result);
    assert_eq!(result.run.state, RunState::Deployed);
    assert_eq!(result.run.status, ExecutionStatus::Completed);
    assert_eq!(result.run.completed_stages(), 4);

    // 4 install steps, the inventory script, the playbook
    assert_eq!(
        runner.rendered(),
        vec![
            "sudo apt-get update".to_string(),
            "sudo apt-get install -y python3-pip jq".to_string(),
            "pip3 install ansible jinja2 hvac".to_string(),
            "ansible-galaxy collection install community.hashi_vault".to_string(),
            "bash scripts/ansible_playbook_hosts_setup.sh".to_string(),
            "ansible-playbook -i hosts/inventory playbooks/deploy-docker-keycloak.yml \
             -e ansible_become_pass= -e domain=example.com -D"
                .to_string(),
        ]
    );

    let deploy = deploy_call(&runner);
    assert!(deploy.has_args(&["-e", "domain=example.com"]));
    assert_eq!(deploy.working_dir(), Some(fixture.config.working_dir.as_path()));
}

/// Every downstream process sees the exported environment
#[tokio::test]
async fn test_environment_reaches_every_process() {
    let fixture = Fixture::ubuntu();
    let runner = RecordingRunner::new();

    run_pipeline(&fixture, &full_provider(), runner.clone())
        .await
        .result
        .unwrap();

    for call in runner.calls() {
        let env = call.env();
        assert_eq!(
            env.get(ENV_SSH_HOST_DOMAIN).map(String::as_str),
            Some("host1.example.com"),
            "{} is missing SSH_HOST_DOMAIN",
            call
        );
        assert_eq!(env.get(ENV_SUDO_PASSWORD).map(String::as_str), Some(""));
        assert_eq!(env.len(), 7);
    }
}

/// The vault file exists with the exact secret before the playbook runs
#[tokio::test]
async fn test_vault_file_written() {
    let fixture = Fixture::ubuntu();

    run_pipeline(&fixture, &full_provider(), RecordingRunner::new())
        .await
        .result
        .unwrap();

    let content = fs::read_to_string(fixture.vault_file()).unwrap();
    assert_eq!(content, "correct horse battery staple");
}

/// Sudo password and registry are threaded through when supplied
#[tokio::test]
async fn test_sudo_password_threaded_to_playbook() {
    let fixture = Fixture::new(DEBIAN_OS_RELEASE);
    let runner = RecordingRunner::new();
    let provider = full_provider()
        .with_secret(SECRET_SUDO_PASSWORD, "s3cret-sudo")
        .with_input(INPUT_REGISTRY, "registry.example.com");

    run_pipeline(&fixture, &provider, runner.clone())
        .await
        .result
        .unwrap();

    let deploy = deploy_call(&runner);
    assert!(deploy.has_args(&["-e", "ansible_become_pass=s3cret-sudo"]));
    assert_eq!(
        deploy.env().get("REGISTRY").map(String::as_str),
        Some("registry.example.com")
    );
    // Never in rendered output
    assert!(runner.rendered().iter().all(|r| !r.contains("s3cret-sudo")));
}

/// A short login name appearing inside commands and paths is left alone
#[tokio::test]
async fn test_login_name_does_not_mangle_commands() {
    let fixture = Fixture::ubuntu();
    let runner = RecordingRunner::new().fail_call(1, 100);
    let provider = full_provider().with_secret(SECRET_SSH_USER, "u");

    let result = run_pipeline(&fixture, &provider, runner.clone()).await;

    assert_eq!(
        result.error().to_string(),
        "Toolchain setup failed: apt-update: `sudo apt-get update` exited with code 100"
    );

    let fixture = Fixture::ubuntu();
    let runner = RecordingRunner::new();
    let provider = full_provider().with_secret(SECRET_SSH_USER, "deploy");

    run_pipeline(&fixture, &provider, runner.clone())
        .await
        .result
        .unwrap();

    let rendered = deploy_call(&runner).to_string();
    assert!(rendered.contains("playbooks/deploy-docker-keycloak.yml"), "{}", rendered);
}

/// Events follow the stage order exactly
#[tokio::test]
async fn test_event_sequence() {
    let fixture = Fixture::ubuntu();

    let result = run_pipeline(&fixture, &full_provider(), RecordingRunner::new()).await;

    let mut started = Vec::new();
    let mut completed = Vec::new();
    for event in &result.events {
        match event {
            PipelineEvent::StageStarted { stage } => started.push(*stage),
            PipelineEvent::StageCompleted { stage } => completed.push(*stage),
            _ => {}
        }
    }
    assert_eq!(started, Stage::ALL.to_vec());
    assert_eq!(completed, Stage::ALL.to_vec());

    assert!(matches!(
        result.events.first(),
        Some(PipelineEvent::PipelineStarted { .. })
    ));
    assert!(matches!(
        result.events.last(),
        Some(PipelineEvent::PipelineCompleted {
            status: ExecutionStatus::Completed,
            ..
        })
    ));
    assert!(result
        .run
        .stages
        .iter()
        .all(|r| r.status == StageStatus::Completed));
}
