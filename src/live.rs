//! Live update fan-out
//!
//! Dashboards subscribe over SSE and get poked whenever the game changes.
//! The payload carries no state; clients refetch `/api/state` on a poke.
//! With fewer than two viewers there is nobody racing anybody, so routine
//! pokes are suppressed and only forced events (round boundaries, roster
//! changes) go out.

use std::collections::HashMap;

use actix_web::web::Bytes;
use actix_web::{get, web, HttpResponse, Responder};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;
use uuid::Uuid;

const MIN_VIEWERS_FOR_PUSH: usize = 2;

const UPDATE_EVENT: Bytes = Bytes::from_static(b"event: update\ndata: scores\n\n");

#[derive(Default)]
pub struct UpdateHub {
    subscribers: Mutex<HashMap<Uuid, mpsc::UnboundedSender<Bytes>>>,
}

impl UpdateHub {
    pub async fn subscribe(&self) -> (Uuid, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.lock().await.insert(id, tx);
        (id, rx)
    }

    pub async fn unsubscribe(&self, id: Uuid) {
        self.subscribers.lock().await.remove(&id);
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Poke every subscriber. Dead channels are pruned as a side effect.
    pub async fn notify(&self, force: bool) {
        let mut subscribers = self.subscribers.lock().await;
        if !force && subscribers.len() < MIN_VIEWERS_FOR_PUSH {
            debug!(viewers = subscribers.len(), "update suppressed");
            return;
        }
        subscribers.retain(|_, tx| tx.send(UPDATE_EVENT).is_ok());
    }
}

#[get("/events")]
pub async fn subscribe_events(hub: web::Data<UpdateHub>) -> impl Responder {
    let (_id, rx) = hub.subscribe().await;
    let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, actix_web::Error>);
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}
