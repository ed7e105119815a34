use std::sync::Arc;

use super::fake_daemon::{Call, FakeDaemon, Hold};
use crate::services::bridge::{
    AppIdentity, BridgeError, BridgeService, CommandState, CommandTranslator, CommandVerb,
    ErrorKind, PlaybackStatus,
};

fn translator(daemon: &Arc<FakeDaemon>) -> CommandTranslator {
    let (service, _signals) = BridgeService::new(daemon.clone(), AppIdentity::default());
    service.commands()
}

#[tokio::test]
async fn volume_outside_unit_range_is_rejected_without_requests() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);

    for level in [1.5, -0.1, f64::NAN] {
        let error = commands.set_volume(level).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::OutOfRange);
    }

    assert_eq!(daemon.calls(), Vec::<Call>::new());
}

#[tokio::test]
async fn volume_inside_range_is_forwarded() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);

    commands.set_volume(0.25).unwrap().await.unwrap();
    commands.set_volume(1.0).unwrap().await.unwrap();

    assert_eq!(
        daemon.calls(),
        vec![Call::SetVolume(0.25), Call::SetVolume(1.0)]
    );
}

#[tokio::test]
async fn play_pause_branches_on_status_queried_at_issue_time() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);
    daemon.set_status(PlaybackStatus::Playing);
    daemon.hold(Hold::Status);

    let handle = commands.play_pause();
    daemon.wait_for_calls(1).await;
    daemon.set_status(PlaybackStatus::Paused);
    daemon.release();

    handle.await.unwrap();
    assert_eq!(daemon.calls(), vec![Call::Status, Call::Play]);
}

#[tokio::test]
async fn play_pause_pauses_when_daemon_is_playing() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);
    daemon.set_status(PlaybackStatus::Playing);

    commands.play_pause().await.unwrap();

    assert_eq!(daemon.calls(), vec![Call::Status, Call::Pause]);
}

#[tokio::test]
async fn play_pause_starts_a_stopped_daemon() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);

    commands.play_pause().await.unwrap();

    assert_eq!(daemon.calls(), vec![Call::Status, Call::Play]);
}

#[tokio::test]
async fn next_and_previous_move_the_playlist_then_tickle() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);

    commands.next().await.unwrap();
    commands.previous().await.unwrap();

    assert_eq!(
        daemon.calls(),
        vec![
            Call::SetNextRelative(1),
            Call::Tickle,
            Call::SetNextRelative(-1),
            Call::Tickle,
        ]
    );
}

#[tokio::test]
async fn daemon_error_fails_the_command() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);
    daemon.fail_requests("no playlist");

    let error = commands.stop().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::DaemonRequestFailed);
    match error {
        BridgeError::DaemonRequestFailed { verb, reason } => {
            assert_eq!(verb, CommandVerb::Stop);
            assert!(reason.contains("no playlist"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(commands.pending().is_empty());
}

#[tokio::test]
async fn failed_first_step_skips_the_rest() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);
    daemon.fail_requests("end of playlist");

    assert!(commands.next().await.is_err());
    assert_eq!(daemon.calls(), vec![Call::SetNextRelative(1)]);
}

#[tokio::test]
async fn unsupported_verbs_succeed_without_requests() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);

    commands
        .set_position("/org/mpris/MediaPlayer2/Track/4", 10_000_000)
        .await
        .unwrap();
    commands.open_uri("file:///music/a.ogg").await.unwrap();
    commands.raise().await.unwrap();

    assert_eq!(daemon.calls(), Vec::<Call>::new());
}

#[tokio::test]
async fn outstanding_command_is_listed_until_answered() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);
    daemon.hold(Hold::Everything);

    let handle = commands.play();
    daemon.wait_for_calls(1).await;

    let pending = commands.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].verb, CommandVerb::Play);
    assert_eq!(pending[0].state, CommandState::Issued);
    assert_eq!(pending[0].id, handle.id());

    daemon.release();
    handle.await.unwrap();
    assert!(commands.pending().is_empty());
}

#[tokio::test]
async fn command_ids_are_unique_and_ordered() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);

    let first = commands.raise();
    let second = commands.stop();

    assert_eq!(first.id().generation, second.id().generation);
    assert!(first.id().sequence < second.id().sequence);
    second.await.unwrap();
}

#[tokio::test]
async fn abandon_all_resolves_outstanding_commands() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);
    daemon.hold(Hold::Everything);

    let handle = commands.play();
    daemon.wait_for_calls(1).await;
    commands.abandon_all();

    assert_eq!(
        handle.await,
        Err(BridgeError::Abandoned {
            verb: CommandVerb::Play
        })
    );
    assert!(commands.pending().is_empty());

    daemon.release();
    tokio::task::yield_now().await;
    assert!(commands.pending().is_empty());
}

#[tokio::test]
async fn commands_after_abandon_all_are_not_sent() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);
    commands.abandon_all();

    let error = commands.pause().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Abandoned);
    assert_eq!(daemon.calls(), Vec::<Call>::new());
}

#[tokio::test]
async fn dropped_handle_still_completes_the_request() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);
    daemon.hold(Hold::Everything);

    let handle = commands.stop();
    daemon.wait_for_calls(1).await;
    drop(handle);
    assert_eq!(commands.pending().len(), 1);

    daemon.release();
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while !commands.pending().is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert_eq!(daemon.calls(), vec![Call::Stop]);
}

#[tokio::test]
async fn dropped_next_still_tickles() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);
    daemon.hold(Hold::Everything);

    let handle = commands.next();
    daemon.wait_for_calls(1).await;
    drop(handle);

    daemon.release();
    daemon.wait_for_calls(2).await;
    daemon.release();

    assert_eq!(daemon.calls(), vec![Call::SetNextRelative(1), Call::Tickle]);
}

#[tokio::test]
async fn abandoned_next_still_tickles() {
    let (daemon, _events) = FakeDaemon::new();
    let commands = translator(&daemon);
    daemon.hold(Hold::Everything);

    let handle = commands.next();
    daemon.wait_for_calls(1).await;
    commands.abandon_all();

    assert_eq!(
        handle.await,
        Err(BridgeError::Abandoned {
            verb: CommandVerb::Next
        })
    );

    daemon.release();
    daemon.wait_for_calls(2).await;
    daemon.release();

    assert_eq!(daemon.calls(), vec![Call::SetNextRelative(1), Call::Tickle]);
}
