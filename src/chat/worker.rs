//! Background worker that runs chat round trips off the UI thread
//!
//! The worker owns a single-threaded tokio runtime and handles one request
//! at a time. Results come back tagged with the request id that produced
//! them.

use super::ChatTransport;
use crate::error::TransportError;
use crate::messages::Message;
use crate::{HovorError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Commands sent to the chat worker
#[derive(Clone, Debug)]
pub enum ChatCommand {
    /// Run one completion for the given history
    Send {
        request_id: Uuid,
        messages: Vec<Message>,
    },
    /// Shutdown the worker
    Shutdown,
}

/// Events emitted by the chat worker
#[derive(Clone, Debug)]
pub enum ChatEvent {
    /// A request finished, successfully or not
    Reply {
        request_id: Uuid,
        result: std::result::Result<Message, TransportError>,
    },
    /// Worker shut down
    Shutdown,
}

/// Handle for interacting with a running chat worker
pub struct ChatHandle {
    command_tx: Sender<ChatCommand>,
    event_rx: Receiver<ChatEvent>,
    worker_handle: Option<JoinHandle<()>>,
}

impl ChatHandle {
    /// Queue a completion request
    pub fn send(&self, request_id: Uuid, messages: Vec<Message>) -> Result<()> {
        self.command_tx
            .send(ChatCommand::Send {
                request_id,
                messages,
            })
            .map_err(|e| HovorError::Channel(format!("Failed to send chat command: {}", e)))
    }

    /// Try to receive an event without blocking
    pub fn try_recv_event(&self) -> Option<ChatEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<ChatEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stop the worker and wait for its thread
    ///
    /// A request already in flight runs to completion first.
    pub fn shutdown(&mut self) -> Result<()> {
        let _ = self.command_tx.send(ChatCommand::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            handle
                .join()
                .map_err(|_| HovorError::Channel("Chat worker thread panicked".to_string()))?;
        }
        Ok(())
    }
}

/// Spawns the worker thread for a transport
pub struct ChatWorker {
    transport: Arc<dyn ChatTransport>,
}

impl ChatWorker {
    pub fn new(transport: impl ChatTransport) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Start the worker thread
    pub fn start(self) -> Result<ChatHandle> {
        let (command_tx, command_rx) = bounded::<ChatCommand>(16);
        let (event_tx, event_rx) = bounded::<ChatEvent>(16);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HovorError::Channel(format!("Failed to create runtime: {}", e)))?;

        let transport = self.transport;
        let worker_handle = std::thread::Builder::new()
            .name("hovor-chat".to_string())
            .spawn(move || worker_loop(runtime, transport, command_rx, event_tx))?;

        Ok(ChatHandle {
            command_tx,
            event_rx,
            worker_handle: Some(worker_handle),
        })
    }
}

fn worker_loop(
    runtime: tokio::runtime::Runtime,
    transport: Arc<dyn ChatTransport>,
    command_rx: Receiver<ChatCommand>,
    event_tx: Sender<ChatEvent>,
) {
    info!("Chat worker started");

    while let Ok(command) = command_rx.recv() {
        match command {
            ChatCommand::Send {
                request_id,
                messages,
            } => {
                debug!("Chat request {} with {} messages", request_id, messages.len());
                let result = runtime.block_on(transport.complete(&messages));

                if let Err(e) = &result {
                    error!("Chat request {} failed: {}", request_id, e);
                }

                if event_tx.send(ChatEvent::Reply { request_id, result }).is_err() {
                    error!("Event channel closed");
                    break;
                }
            }
            ChatCommand::Shutdown => {
                info!("Received shutdown command");
                break;
            }
        }
    }

    let _ = event_tx.send(ChatEvent::Shutdown);
    info!("Chat worker shutdown complete");
}
