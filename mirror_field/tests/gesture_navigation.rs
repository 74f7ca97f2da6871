use mirror_field::core_modules::landmarks::HandLandmarks;
use mirror_field::{
    AppConfig, Frame, GestureLoop, GestureState, LandmarkPublisher, LoggingNavigator,
    NavigationTarget, Navigator, ScriptedTracker,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

fn open_hand() -> HandLandmarks {
    HandLandmarks::posed((320.0, 400.0), 60.0, [150.0; 5], 40.0)
}

fn fist() -> HandLandmarks {
    HandLandmarks::posed((320.0, 400.0), 60.0, [60.0; 5], 10.0)
}

/// Pushes one frame through the publisher every 100 ms for `seconds`.
async fn run_frames<T: mirror_field::HandTracker>(publisher: &mut LandmarkPublisher<T>, seconds: u64) {
    let frame = Frame::filled(8, 8, [0, 0, 0, 255]);
    for _ in 0..seconds * 10 {
        publisher.process(&frame);
        sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn open_then_idle_navigates_away_and_back() {
    let mut config = AppConfig::default();
    config.field.seed = Some(11);

    // Open for 6 s, then nothing at all.
    let tracker = ScriptedTracker::new(vec![vec![open_hand()]]);
    let (mut publisher, landmarks) = LandmarkPublisher::new(tracker);
    let (nav_tx, mut nav_rx) = mpsc::unbounded_channel();
    let gestures = GestureLoop::spawn(&config, landmarks, nav_tx);

    run_frames(&mut publisher, 6).await;
    let first = nav_rx.try_recv().unwrap();
    assert_eq!(first.trigger, GestureState::Open);
    assert!(matches!(first.target, NavigationTarget::Page(_)));

    let (mut idle, idle_landmarks) = LandmarkPublisher::new(ScriptedTracker::default());
    drop(publisher);
    gestures.join().await;
    assert!(nav_rx.recv().await.is_none());

    let (nav_tx, mut nav_rx) = mpsc::unbounded_channel();
    let _idle_loop = GestureLoop::spawn(&config, idle_landmarks, nav_tx);
    run_frames(&mut idle, 61).await;

    let mut navigator = LoggingNavigator::default();
    while let Ok(request) = nav_rx.try_recv() {
        navigator.navigate(&request);
    }
    assert_eq!(navigator.history().len(), 1);
    assert_eq!(navigator.history()[0].trigger, GestureState::None);
    assert_eq!(navigator.history()[0].target, NavigationTarget::Home(config.navigation.home.clone()));
}

#[tokio::test(start_paused = true)]
async fn flickering_gestures_never_navigate() {
    let config = AppConfig::default();
    // Alternates open and fist every 2 s; no pose is ever held for 5 s.
    let tracker = ScriptedTracker::stretched(vec![vec![open_hand()], vec![fist()]], 20);
    let (mut publisher, landmarks) = LandmarkPublisher::new(tracker);
    let (nav_tx, mut nav_rx) = mpsc::unbounded_channel();
    let gestures = GestureLoop::spawn(&config, landmarks, nav_tx);

    run_frames(&mut publisher, 20).await;
    assert!(nav_rx.try_recv().is_err());
    gestures.stop();
}
