//! Full check → prompt → fetch → extract → patch flow against a mock server.

use super::harness::linux_amd64;
use super::{tar_gz, FakeInstall, RecordingPrompter, ReleaseServer};
use plandex_update::upgrade::Platform;
use plandex_update::{check_for_upgrade, Error, Spinner, UpdateOutcome, UpgradeStage};
use semver::Version;
use std::time::Duration;
use wiremock::ResponseTemplate;

const OLD_IMAGE: &[u8] = b"#!/bin/sh\necho old\n";
const NEW_IMAGE: &[u8] = b"#!/bin/sh\necho new\n";

#[tokio::test]
async fn test_confirmed_upgrade_replaces_executable() {
    let server = ReleaseServer::start().await;
    server.publish_tags(&["server/v2.1.0", "cli/v2.3.0"]).await;
    server
        .publish_archive(
            "2.3.0",
            &linux_amd64(),
            tar_gz(&[("README.md", b"docs"), ("plandex", NEW_IMAGE)]),
            1,
        )
        .await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "2.2.4", Vec::new());
    let prompter = RecordingPrompter::answering(true);

    let outcome = check_for_upgrade(&session, &prompter, &mut Spinner::hidden()).await;

    assert!(
        matches!(outcome, UpdateOutcome::Applied { ref version } if *version == Version::new(2, 3, 0)),
        "unexpected outcome: {outcome:?}"
    );
    assert_eq!(
        prompter.shown(),
        vec![(Version::new(2, 2, 4), Version::new(2, 3, 0))]
    );
    assert_eq!(install.content(), NEW_IMAGE);
    assert_eq!(install.files(), vec!["plandex".to_string()]);
}

#[tokio::test]
async fn test_declined_upgrade_touches_nothing() {
    let server = ReleaseServer::start().await;
    server.publish_tags(&["cli/v2.3.0"]).await;
    server
        .publish_archive("2.3.0", &linux_amd64(), tar_gz(&[("plandex", NEW_IMAGE)]), 0)
        .await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "2.2.4", Vec::new());
    let prompter = RecordingPrompter::answering(false);

    let outcome = check_for_upgrade(&session, &prompter, &mut Spinner::hidden()).await;

    assert!(matches!(outcome, UpdateOutcome::Declined { answered: true }));
    assert_eq!(prompter.shown().len(), 1);
    assert_eq!(install.content(), OLD_IMAGE);
    assert_eq!(install.files(), vec!["plandex".to_string()]);
}

#[tokio::test]
async fn test_same_version_is_up_to_date() {
    let server = ReleaseServer::start().await;
    server.publish_tags(&["cli/v2.2.4"]).await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "2.2.4", Vec::new());
    let prompter = RecordingPrompter::answering(true);

    let outcome = check_for_upgrade(&session, &prompter, &mut Spinner::hidden()).await;

    assert!(matches!(outcome, UpdateOutcome::UpToDate));
    assert!(prompter.shown().is_empty());
}

#[tokio::test]
async fn test_older_remote_is_up_to_date() {
    let server = ReleaseServer::start().await;
    server.publish_tags(&["cli/v2.2.3"]).await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "2.2.4", Vec::new());
    let prompter = RecordingPrompter::answering(true);

    let outcome = check_for_upgrade(&session, &prompter, &mut Spinner::hidden()).await;
    assert!(matches!(outcome, UpdateOutcome::UpToDate));
    assert!(prompter.shown().is_empty());
}

#[tokio::test]
async fn test_development_build_makes_no_request() {
    let server = ReleaseServer::start().await;
    server.expect_no_requests().await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "development", Vec::new());
    let prompter = RecordingPrompter::answering(true);

    let outcome = check_for_upgrade(&session, &prompter, &mut Spinner::hidden()).await;

    assert!(matches!(outcome, UpdateOutcome::NoUpdateChecked));
    assert!(prompter.shown().is_empty());
}

#[tokio::test]
async fn test_skip_toggle_makes_no_request() {
    let server = ReleaseServer::start().await;
    server.expect_no_requests().await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install
        .session(server.config(), "2.2.4", Vec::new())
        .with_skip(true);

    let outcome = check_for_upgrade(
        &session,
        &RecordingPrompter::answering(true),
        &mut Spinner::hidden(),
    )
    .await;
    assert!(matches!(outcome, UpdateOutcome::NoUpdateChecked));
}

#[tokio::test]
async fn test_listing_without_cli_tag_is_up_to_date() {
    let server = ReleaseServer::start().await;
    server.publish_tags(&["server/v2.1.0", "v1.0.0"]).await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "2.2.4", Vec::new());

    let outcome = check_for_upgrade(
        &session,
        &RecordingPrompter::answering(true),
        &mut Spinner::hidden(),
    )
    .await;
    assert!(matches!(outcome, UpdateOutcome::UpToDate));
}

#[tokio::test]
async fn test_registry_error_is_up_to_date() {
    let server = ReleaseServer::start().await;
    server
        .publish_listing(ResponseTemplate::new(403).set_body_string("rate limited"))
        .await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "2.2.4", Vec::new());

    let outcome = check_for_upgrade(
        &session,
        &RecordingPrompter::answering(true),
        &mut Spinner::hidden(),
    )
    .await;
    assert!(matches!(outcome, UpdateOutcome::UpToDate));
    assert_eq!(install.content(), OLD_IMAGE);
}

#[tokio::test]
async fn test_malformed_remote_version_is_up_to_date() {
    let server = ReleaseServer::start().await;
    server.publish_tags(&["cli/vnext"]).await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "2.2.4", Vec::new());

    let outcome = check_for_upgrade(
        &session,
        &RecordingPrompter::answering(true),
        &mut Spinner::hidden(),
    )
    .await;
    assert!(matches!(outcome, UpdateOutcome::UpToDate));
}

#[tokio::test]
async fn test_slow_registry_times_out_softly() {
    let server = ReleaseServer::start().await;
    let mut config = server.config();
    config.check_timeout_secs = 1;
    server
        .publish_listing(ReleaseServer::slow_response(config.check_timeout()))
        .await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(config, "2.2.4", Vec::new());
    let prompter = RecordingPrompter::answering(true);

    let started = std::time::Instant::now();
    let outcome = check_for_upgrade(&session, &prompter, &mut Spinner::hidden()).await;

    assert!(matches!(outcome, UpdateOutcome::UpToDate));
    assert!(prompter.shown().is_empty());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_first_listed_tag_wins() {
    let server = ReleaseServer::start().await;
    server.publish_tags(&["cli/v2.3.0", "cli/v9.0.0"]).await;
    server
        .publish_archive("2.3.0", &linux_amd64(), tar_gz(&[("plandex", NEW_IMAGE)]), 1)
        .await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "2.2.4", Vec::new());
    let prompter = RecordingPrompter::answering(true);

    let outcome = check_for_upgrade(&session, &prompter, &mut Spinner::hidden()).await;

    assert!(
        matches!(outcome, UpdateOutcome::Applied { ref version } if *version == Version::new(2, 3, 0))
    );
}

#[tokio::test]
async fn test_archive_without_binary_is_fatal() {
    let server = ReleaseServer::start().await;
    server.publish_tags(&["cli/v2.3.0"]).await;
    server
        .publish_archive("2.3.0", &linux_amd64(), tar_gz(&[("README", b"docs")]), 1)
        .await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "2.2.4", Vec::new());

    let outcome = check_for_upgrade(
        &session,
        &RecordingPrompter::answering(true),
        &mut Spinner::hidden(),
    )
    .await;

    assert!(
        matches!(
            outcome,
            UpdateOutcome::Failed {
                stage: UpgradeStage::Extracting,
                error: Error::Archive(_)
            }
        ),
        "unexpected outcome: {outcome:?}"
    );
    assert_eq!(install.content(), OLD_IMAGE);
    assert_eq!(install.files(), vec!["plandex".to_string()]);
}

#[tokio::test]
async fn test_missing_archive_is_fatal() {
    let server = ReleaseServer::start().await;
    server.publish_tags(&["cli/v2.3.0"]).await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install.session(server.config(), "2.2.4", Vec::new());

    let outcome = check_for_upgrade(
        &session,
        &RecordingPrompter::answering(true),
        &mut Spinner::hidden(),
    )
    .await;

    assert!(matches!(
        outcome,
        UpdateOutcome::Failed {
            stage: UpgradeStage::Downloading,
            error: Error::Network(_)
        }
    ));
    assert_eq!(install.content(), OLD_IMAGE);
}

#[tokio::test]
async fn test_windows_expects_exe_entry() {
    let windows = Platform::from_rust_target("windows", "x86_64");
    let server = ReleaseServer::start().await;
    server.publish_tags(&["cli/v2.3.0"]).await;
    server
        .publish_archive(
            "2.3.0",
            &windows,
            tar_gz(&[("plandex", b"unix image"), ("plandex.exe", b"pe image")]),
            1,
        )
        .await;

    let install = FakeInstall::new(OLD_IMAGE);
    let session = install
        .session(server.config(), "2.2.4", Vec::new())
        .with_platform(windows);

    let outcome = check_for_upgrade(
        &session,
        &RecordingPrompter::answering(true),
        &mut Spinner::hidden(),
    )
    .await;

    assert!(matches!(outcome, UpdateOutcome::Applied { .. }));
    assert_eq!(install.content(), b"pe image");
}
