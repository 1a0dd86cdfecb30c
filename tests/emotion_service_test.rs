//! Integration tests for the emotion service client against an in-process
//! fake service.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::routing::get;
use axum::Router;
use crossbeam_channel::{bounded, unbounded};
use fidget_sentinel::config::Config;
use fidget_sentinel::emotion_client::{
    EmotionClient, EmotionDispatcher, EmotionError, EmotionServiceConfig,
};
use fidget_sentinel::face::{
    EmotionLabel, FacePipeline, NoopFaceDetector, PredictionDispatcher, PredictionRequest,
};
use fidget_sentinel::fusion::{FusionLoop, LoopChannels, StopReason};
use fidget_sentinel::source::{FrameSource, VideoFrame};
use fidget_sentinel::stats::create_shared_stats;
use fidget_sentinel::TerminalRenderer;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ANGRY_REPLY: &str = r#"{"predictions": {"angry": 0.8, "disgust": 0.0, "fear": 0.05,
    "happy": 0.5, "sad": 0.1, "surprise": 0.994, "neutral": 0.02}, "emotion": "angry"}"#;

#[derive(Clone, Copy)]
enum Reply {
    Prediction,
    ServiceError,
    Malformed,
    Silent,
    Hangup,
}

type Seen = Arc<Mutex<Vec<serde_json::Value>>>;

async fn handle(mut socket: WebSocket, reply: Reply, seen: Seen) {
    if let Reply::Hangup = reply {
        return;
    }
    let Some(Ok(Message::Text(text))) = socket.recv().await else {
        return;
    };
    if let Ok(value) = serde_json::from_str(&text) {
        seen.lock().unwrap().push(value);
    }

    let body = match reply {
        Reply::Prediction => ANGRY_REPLY.to_string(),
        Reply::ServiceError => r#"{"error": "No face detected"}"#.to_string(),
        Reply::Malformed => r#"{"predictions": "not a map"}"#.to_string(),
        Reply::Silent => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            return;
        }
        Reply::Hangup => unreachable!(),
    };
    let _ = socket.send(Message::Text(body)).await;
    // Leave the closing to the client.
    while let Some(Ok(_)) = socket.recv().await {}
}

async fn spawn_service(reply: Reply) -> (SocketAddr, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let handler_seen = seen.clone();

    let app = Router::new().route(
        "/",
        get(move |ws: WebSocketUpgrade| {
            let seen = handler_seen.clone();
            async move { ws.on_upgrade(move |socket| handle(socket, reply, seen)) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake service");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, seen)
}

fn client_for(addr: SocketAddr, timeout: Duration) -> EmotionClient {
    EmotionClient::new(EmotionServiceConfig::new(format!("ws://{addr}")).with_timeout(timeout))
        .expect("Valid service config")
}

const IMAGE: &str = "data:image/jpeg;base64,AAEC";

#[tokio::test]
async fn test_prediction_round_trip() {
    let (addr, seen) = spawn_service(Reply::Prediction).await;
    let client = client_for(addr, Duration::from_secs(5));

    let prediction = client.predict(IMAGE).await.expect("Prediction expected");
    assert_eq!(prediction.emotion, "angry");
    assert_eq!(prediction.predictions.angry, 0.8);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["event"], "localhost:subscribe");
    assert_eq!(seen[0]["data"]["image"], IMAGE);
}

#[tokio::test]
async fn test_each_request_uses_its_own_connection() {
    let (addr, seen) = spawn_service(Reply::Prediction).await;
    let client = client_for(addr, Duration::from_secs(5));

    for _ in 0..3 {
        client.predict(IMAGE).await.expect("Prediction expected");
    }
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_service_error_reply() {
    let (addr, _) = spawn_service(Reply::ServiceError).await;
    let client = client_for(addr, Duration::from_secs(5));

    let err = client.predict(IMAGE).await.unwrap_err();
    assert!(matches!(err, EmotionError::Service(ref msg) if msg == "No face detected"));
}

#[tokio::test]
async fn test_malformed_reply() {
    let (addr, _) = spawn_service(Reply::Malformed).await;
    let client = client_for(addr, Duration::from_secs(5));

    let err = client.predict(IMAGE).await.unwrap_err();
    assert!(matches!(err, EmotionError::Malformed(_)));
}

#[tokio::test]
async fn test_silent_service_times_out() {
    let (addr, _) = spawn_service(Reply::Silent).await;
    let client = client_for(addr, Duration::from_millis(200));

    let err = client.predict(IMAGE).await.unwrap_err();
    assert!(matches!(err, EmotionError::Timeout(_)));
}

#[tokio::test]
async fn test_hangup_before_reply() {
    let (addr, _) = spawn_service(Reply::Hangup).await;
    let client = client_for(addr, Duration::from_secs(5));

    let err = client.predict(IMAGE).await.unwrap_err();
    assert!(
        matches!(
            err,
            EmotionError::Closed | EmotionError::Receive(_) | EmotionError::Send(_)
        ),
        "Unexpected error: {err}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dispatcher_reports_back() {
    let (addr, _) = spawn_service(Reply::Prediction).await;
    let (reply_tx, reply_rx) = unbounded();
    let dispatcher = EmotionDispatcher::new(
        client_for(addr, Duration::from_secs(5)),
        tokio::runtime::Handle::current(),
        reply_tx,
    );

    dispatcher.dispatch(PredictionRequest {
        tick_id: 7,
        image: IMAGE.to_string(),
    });

    let response = tokio::task::spawn_blocking(move || reply_rx.recv_timeout(Duration::from_secs(5)))
        .await
        .expect("Blocking task panicked")
        .expect("No response from dispatcher");
    assert_eq!(response.tick_id, 7);
    assert!(response.result.is_ok());
}

struct StillCamera;

impl FrameSource for StillCamera {
    fn capture(&mut self) -> Option<VideoFrame> {
        Some(VideoFrame {
            width: 640,
            height: 480,
            mime: "image/jpeg".to_string(),
            data: vec![0, 1, 2],
        })
    }
}

fn run_loop_against(reply: Option<Reply>) -> (fidget_sentinel::DisplayState, u64) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    let url = match reply {
        Some(reply) => {
            let (addr, _) = runtime.block_on(spawn_service(reply));
            format!("ws://{addr}")
        }
        // Nothing listens on a freshly released port.
        None => {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);
            format!("ws://{addr}")
        }
    };

    let mut config = Config::default();
    config.emotion_service = EmotionServiceConfig::new(url).with_timeout(Duration::from_secs(2));

    let (reply_tx, reply_rx) = unbounded();
    let client = EmotionClient::new(config.emotion_service.clone()).unwrap();
    let dispatcher = EmotionDispatcher::new(client, runtime.handle().clone(), reply_tx);

    let (_pose_tx, pose_rx) = unbounded();
    let (shutdown_tx, shutdown_rx) = bounded(1);
    let channels = LoopChannels {
        poses: pose_rx,
        predictions: reply_rx,
        shutdown: shutdown_rx,
    };
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(800));
        let _ = shutdown_tx.send(());
    });

    let stats = create_shared_stats();
    let pipeline = FacePipeline::new(StillCamera, NoopFaceDetector, dispatcher);
    let mut fusion = FusionLoop::new(
        &config,
        pipeline,
        TerminalRenderer::new(Vec::new()),
        stats.clone(),
    );
    assert_eq!(fusion.run(&channels), StopReason::Shutdown);

    (fusion.display().clone(), stats.summary().ticks_dispatched)
}

#[test]
fn test_loop_shows_service_prediction() {
    let (display, ticks) = run_loop_against(Some(Reply::Prediction));
    assert!(ticks >= 2);
    assert_eq!(display.percent(EmotionLabel::Angry), 80);
    assert_eq!(display.percent(EmotionLabel::Happy), 50);
    assert_eq!(display.percent(EmotionLabel::Surprise), 99);
    assert_eq!(display.label(), "angry");
}

#[test]
fn test_loop_survives_unreachable_service() {
    let (display, ticks) = run_loop_against(None);
    assert!(ticks >= 2);
    assert_eq!(display.update_count(), 0);
    assert_eq!(display.label(), "Neutral");
    assert_eq!(display.percent(EmotionLabel::Angry), 0);
}
