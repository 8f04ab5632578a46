//! Client connections
//!
//! A [`Tunnel`] is one connected client as seen by the session core. The
//! transport (WebSocket, SSE, etc.) implements it, or drains a
//! [`ChannelTunnel`].

use serde::Serialize;
use tokio::sync::mpsc;

use crate::message::{SyncMessage, UpdateMessage};

/// Trait for sending messages through a communication tunnel
///
/// Sending never fails from the caller's point of view: a tunnel whose
/// client has gone away silently drops messages until it is detached.
pub trait Tunnel: Send + Sync {
    /// Sends an incremental update
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a full state snapshot, on connect or reconnect
    fn send_state(&self, state: &SyncMessage);

    /// Closes the tunnel
    fn close(self);
}

/// What a [`ChannelTunnel`] forwards to its receiver
#[derive(Debug, Clone, Serialize)]
pub enum Outgoing {
    /// An incremental update
    Update(UpdateMessage),
    /// A full state snapshot
    Sync(SyncMessage),
    /// The session core is done with this connection
    Close,
}

impl Outgoing {
    /// Converts the message to a JSON string for transmission
    ///
    /// Returns `None` for [`Outgoing::Close`], which has no payload.
    pub fn to_message(&self) -> Option<String> {
        match self {
            Self::Update(message) => Some(message.to_message()),
            Self::Sync(state) => Some(state.to_message()),
            Self::Close => None,
        }
    }
}

/// A tunnel backed by an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelTunnel {
    sender: mpsc::UnboundedSender<Outgoing>,
}

impl ChannelTunnel {
    /// Creates a tunnel and the receiver the transport drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, outgoing: Outgoing) {
        // receiver gone means the client disconnected
        let _ = self.sender.send(outgoing);
    }
}

impl Tunnel for ChannelTunnel {
    fn send_message(&self, message: &UpdateMessage) {
        self.forward(Outgoing::Update(message.clone()));
    }

    fn send_state(&self, state: &SyncMessage) {
        self.forward(Outgoing::Sync(state.clone()));
    }

    fn close(self) {
        self.forward(Outgoing::Close);
    }
}
