//! Ordered delivery of webhook events
//!
//! The webhook pushes every decoded event onto one channel before it
//! acknowledges the POST. A router task drains that channel and hands each
//! event to a worker owned by its user, so one user's events run strictly
//! in arrival order while different users proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use crate::models::InboundEvent;
use crate::utils::errors::{QuickyError, Result};
use super::events::ConversationHandler;

#[derive(Clone)]
pub struct EventQueue {
    sender: UnboundedSender<InboundEvent>,
}

impl EventQueue {
    /// Start the router task. Must be called inside a tokio runtime.
    pub fn spawn(handler: Arc<ConversationHandler>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(route_events(handler, receiver));
        Self { sender }
    }

    /// Queue events in the given order; returns how many were accepted
    pub fn enqueue(&self, events: Vec<InboundEvent>) -> Result<usize> {
        let count = events.len();
        for event in events {
            self.sender
                .send(event)
                .map_err(|_| QuickyError::QueueClosed)?;
        }
        Ok(count)
    }
}

async fn route_events(handler: Arc<ConversationHandler>, mut receiver: UnboundedReceiver<InboundEvent>) {
    let mut workers: HashMap<String, UnboundedSender<InboundEvent>> = HashMap::new();

    while let Some(event) = receiver.recv().await {
        let user_id = event.user_id.clone();
        let event = match workers.get(&user_id) {
            Some(worker) => match worker.send(event) {
                Ok(()) => continue,
                // worker gone; start a fresh one below
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let worker = spawn_worker(handler.clone(), user_id.clone());
        if worker.send(event).is_err() {
            warn!(user_id = %user_id, "Dropping event; user worker did not start");
            continue;
        }
        workers.insert(user_id, worker);
    }

    debug!("Event queue closed");
}

fn spawn_worker(handler: Arc<ConversationHandler>, user_id: String) -> UnboundedSender<InboundEvent> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<InboundEvent>();
    tokio::spawn(async move {
        debug!(user_id = %user_id, "User worker started");
        while let Some(event) = receiver.recv().await {
            handler.handle_inbound(event).await;
        }
    });
    sender
}
