use std::{fmt::Display, sync::Arc, time::Duration};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use rand::{rngs::OsRng, Rng};
use tokio::sync::mpsc::{self, UnboundedSender};

use super::{
    boosters::{DraftEvent, DraftRun},
    store::DraftStore,
    Draft, DraftError, DraftRequest, DraftResult,
};

/// Delays that let a client animate a draft as it happens.
#[derive(Clone, Debug, PartialEq)]
pub struct Pacing {
    pub booster_delay: Duration,
    pub pick_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            booster_delay: Duration::from_millis(1000),
            pick_delay: Duration::from_millis(800),
        }
    }
}

impl Pacing {
    fn delay(&self, event: &DraftEvent) -> Duration {
        match event {
            DraftEvent::BoosterOpened { .. } => self.booster_delay,
            DraftEvent::Pick { .. } => self.pick_delay,
        }
    }
}

/// Drive a draft to completion, forwarding each event and pausing after it.
/// If the receiving side goes away the run is abandoned and `Ok(None)` is
/// returned; nothing of a cancelled draft is kept.
pub async fn animate<R: Rng>(
    mut run: DraftRun<R>,
    pacing: &Pacing,
    chan: &UnboundedSender<DraftEvent>,
) -> Result<Option<Vec<DraftResult>>, DraftError> {
    for event in run.by_ref() {
        let event = event?;
        let delay = pacing.delay(&event);
        if chan.send(event).is_err() {
            return Ok(None);
        }
        tokio::time::sleep(delay).await;
        if chan.is_closed() {
            return Ok(None);
        }
    }
    Ok(Some(run.into_results()))
}

#[derive(serde::Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum DraftServerMessage {
    Event(DraftEvent),
    Finished(Draft),
    Failed(String),
}

async fn send<K>(sink: &mut K, message: &DraftServerMessage) -> Result<(), String>
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    let text = serde_json::to_string(message).map_err(|e| e.to_string())?;
    sink.send(Message::Text(text))
        .await
        .map_err(|e| e.to_string())
}

/// Wait for the client's draft request, skipping pings. None if the client
/// leaves first.
async fn next_request<S, E>(stream: &mut S) -> Option<Result<DraftRequest, String>>
where
    S: Stream<Item = Result<Message, E>> + Unpin,
{
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                return Some(
                    serde_json::from_str(&text).map_err(|e| format!("Invalid draft request: {e}")),
                )
            }
            Message::Close(_) => return None,
            _ => {}
        }
    }
    None
}

/// Serve one animated draft over a websocket. The client sends a single
/// draft request and receives every event as it happens, then the saved
/// draft. Closing the socket mid-draft cancels it.
pub async fn run_session(socket: WebSocket, store: Arc<DraftStore>, pacing: Pacing) {
    let (sink, stream) = socket.split();
    serve_draft(sink, stream, &store, pacing, OsRng).await;
}

/// The session proper, over any message sink and stream.
async fn serve_draft<K, S, E, R>(
    mut sink: K,
    mut stream: S,
    store: &DraftStore,
    pacing: Pacing,
    rng: R,
) where
    K: Sink<Message> + Unpin,
    K::Error: Display,
    S: Stream<Item = Result<Message, E>> + Unpin,
    R: Rng + Send + 'static,
{
    let request = match next_request(&mut stream).await {
        Some(Ok(request)) => request,
        Some(Err(e)) => {
            send(&mut sink, &DraftServerMessage::Failed(e)).await.ok();
            return;
        }
        None => return,
    };

    let run = match DraftRun::new(&request.available_units, &request.settings, rng) {
        Ok(run) => run,
        Err(e) => {
            send(&mut sink, &DraftServerMessage::Failed(e.to_string()))
                .await
                .ok();
            return;
        }
    };
    tracing::info!("Starting animated draft \"{}\".", request.name);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut task = tokio::spawn(async move { animate(run, &pacing, &tx).await });

    let outcome = loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                if let Err(e) = send(&mut sink, &DraftServerMessage::Event(event)).await {
                    tracing::debug!("Draft client unreachable: {e}");
                    task.abort();
                    return;
                }
            }
            message = stream.next() => match message {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    tracing::info!("Draft \"{}\" cancelled by client.", request.name);
                    task.abort();
                    return;
                }
                _ => {}
            },
            outcome = &mut task => break outcome,
        }
    };

    while let Ok(event) = rx.try_recv() {
        if send(&mut sink, &DraftServerMessage::Event(event)).await.is_err() {
            return;
        }
    }

    let reply = match outcome {
        Ok(Ok(Some(results))) => {
            let draft = request.finish(results);
            match store.insert(draft.clone()).await {
                Ok(()) => {
                    tracing::info!("Saved draft {}.", draft.id);
                    DraftServerMessage::Finished(draft)
                }
                Err(e) => DraftServerMessage::Failed(format!("Failed to save draft: {e}")),
            }
        }
        Ok(Ok(None)) => return,
        Ok(Err(e)) => DraftServerMessage::Failed(e.to_string()),
        Err(e) => {
            tracing::error!("Draft task failed: {e}");
            DraftServerMessage::Failed("Draft generation failed.".to_string())
        }
    };
    send(&mut sink, &reply).await.ok();
}

#[cfg(test)]
mod test {
    use std::convert::Infallible;

    use axum::extract::ws::Message;
    use futures_util::{stream, StreamExt};
    use rand::{rngs::StdRng, SeedableRng};
    use tokio::sync::mpsc;

    use crate::{
        draft::{
            boosters::{DraftEvent, DraftRun},
            store::DraftStore,
            BoosterConfig, DraftSettings, DraftUnitWithQuantity,
        },
        units::Unit,
    };

    use super::{animate, serve_draft, DraftServerMessage, Pacing};

    fn run() -> DraftRun<StdRng> {
        let pool = [DraftUnitWithQuantity {
            unit: Unit::sample("Infantry", 25),
            quantity: 4,
        }];
        let settings = DraftSettings {
            number_of_players: 2,
            boosters_per_player: 1,
            booster_configs: vec![BoosterConfig {
                unit_type: "Infantry".to_string(),
                quantity: 2,
            }],
            ..Default::default()
        };
        DraftRun::new(&pool, &settings, StdRng::seed_from_u64(8)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_animate_paced() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = tokio::time::Instant::now();
        let results = animate(run(), &Pacing::default(), &tx)
            .await
            .unwrap()
            .unwrap();

        // Two boosters opened, four picks.
        assert_eq!(start.elapsed().as_millis(), 2 * 1000 + 4 * 800);
        assert_eq!(results.iter().map(|r| r.units.len()).sum::<usize>(), 4);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 6);
        assert!(matches!(events[0], DraftEvent::BoosterOpened { booster: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_animate_cancelled() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let outcome = animate(run(), &Pacing::default(), &tx).await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_draft() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move { animate(run(), &Pacing::default(), &tx).await });

        // Watch the first booster open and one pick, then leave.
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        drop(rx);

        assert_eq!(task.await.unwrap().unwrap(), None);
    }

    #[test]
    fn test_message_json() {
        let json = serde_json::to_value(DraftServerMessage::Failed("nope".to_string())).unwrap();
        assert_eq!(json["type"], "failed");
        assert_eq!(json["data"], "nope");
    }

    fn request_text() -> String {
        serde_json::json!({
            "name": "Live",
            "settings": {
                "numberOfPlayers": 2,
                "boostersPerPlayer": 1,
                "boosterConfigs": [{"unitType": "Infantry", "quantity": 2}]
            },
            "availableUnits": [{"unit": Unit::sample("Infantry", 25), "quantity": 4}]
        })
        .to_string()
    }

    fn kinds(sent: &[Message]) -> Vec<String> {
        sent.iter()
            .map(|message| match message {
                Message::Text(text) => {
                    let json: serde_json::Value = serde_json::from_str(text).unwrap();
                    json["type"].as_str().unwrap().to_string()
                }
                other => panic!("unexpected message {other:?}"),
            })
            .collect()
    }

    async fn store() -> (DraftStore, std::path::PathBuf) {
        let dir = std::env::temp_dir()
            .join(format!("dialdraft-session-{}", uuid::Uuid::new_v4()));
        (DraftStore::load(&dir).await.unwrap(), dir)
    }

    /// Client messages followed by a connection that stays open.
    fn client(
        messages: Vec<Message>,
    ) -> impl futures_util::Stream<Item = Result<Message, Infallible>> + Unpin {
        stream::iter(messages.into_iter().map(Ok)).chain(stream::pending())
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_saves_draft() {
        let (store, dir) = store().await;
        let mut sent: Vec<Message> = Vec::new();
        serve_draft(
            &mut sent,
            client(vec![Message::Ping(Vec::new()), Message::Text(request_text())]),
            &store,
            Pacing::default(),
            StdRng::seed_from_u64(1),
        )
        .await;

        let sent = kinds(&sent);
        assert_eq!(sent.len(), 7);
        assert!(sent[..6].iter().all(|k| k == "event"));
        assert_eq!(sent[6], "finished");
        assert_eq!(store.list().await.len(), 1);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_cancelled_on_close() {
        let (store, dir) = store().await;
        let mut sent: Vec<Message> = Vec::new();
        let messages = stream::iter(
            [Message::Text(request_text()), Message::Close(None)]
                .into_iter()
                .map(Ok::<_, Infallible>),
        );
        serve_draft(
            &mut sent,
            messages,
            &store,
            Pacing::default(),
            StdRng::seed_from_u64(2),
        )
        .await;

        assert!(kinds(&sent).iter().all(|k| k == "event"));
        assert!(store.list().await.is_empty());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_save_failure() {
        let (store, dir) = store().await;
        tokio::fs::create_dir(dir.join("drafts.json")).await.unwrap();

        let mut sent: Vec<Message> = Vec::new();
        serve_draft(
            &mut sent,
            client(vec![Message::Text(request_text())]),
            &store,
            Pacing::default(),
            StdRng::seed_from_u64(3),
        )
        .await;

        assert_eq!(kinds(&sent).last().unwrap(), "failed");
        assert!(store.list().await.is_empty());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_session_bad_request() {
        let (store, dir) = store().await;
        let mut sent: Vec<Message> = Vec::new();
        serve_draft(
            &mut sent,
            client(vec![Message::Text("{}".to_string())]),
            &store,
            Pacing::default(),
            StdRng::seed_from_u64(4),
        )
        .await;

        assert_eq!(kinds(&sent), vec!["failed"]);
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
