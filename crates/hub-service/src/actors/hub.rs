//! `HubActor` - singleton actor that owns all hub state.
//!
//! The actor owns:
//! - The session registry (at most one live connection per user id)
//! - The doctor presence state machine (ONLINE/BUSY/OFFLINE)
//! - Call arbitration for `call-start` / `call-end`
//! - The best-effort presence broadcaster
//!
//! All mutations funnel through one mailbox and are processed one message at
//! a time, so a `call-start` availability check and the BUSY transition it
//! guards can never interleave with another request for the same doctor.

use crate::directory::UserDirectory;
use crate::errors::HubError;
use crate::protocol::{CallRejectReason, ClientFrame, ServerFrame};

use super::messages::{HubMessage, HubStatus, SessionId};

use common::types::{Identity, PresenceStatus, Role, UserId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Channel buffer size for the hub mailbox.
const HUB_CHANNEL_BUFFER: usize = 1000;

/// Handle to the `HubActor`.
#[derive(Clone)]
pub struct HubActorHandle {
    sender: mpsc::Sender<HubMessage>,
    cancel_token: CancellationToken,
}

impl HubActorHandle {
    /// Admit an authenticated connection into the registry.
    ///
    /// Resolves once the registry entry, any presence transition, and the
    /// resulting broadcast have been applied.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Internal`] when the actor is gone.
    pub async fn register(
        &self,
        identity: Identity,
        session_id: SessionId,
        sender: mpsc::Sender<ServerFrame>,
    ) -> Result<(), HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubMessage::Register {
                identity,
                session_id,
                sender,
                respond_to: tx,
            })
            .await
            .map_err(|e| HubError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))
    }

    /// Remove a connection from the registry.
    ///
    /// A no-op inside the actor when the session id no longer matches the
    /// registered entry for the user.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Internal`] when the actor is gone.
    pub async fn deregister(&self, user_id: UserId, session_id: SessionId) -> Result<(), HubError> {
        self.sender
            .send(HubMessage::Deregister {
                user_id,
                session_id,
            })
            .await
            .map_err(|e| HubError::Internal(format!("channel send failed: {e}")))
    }

    /// Hand a parsed inbound frame to the actor for routing.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Internal`] when the actor is gone.
    pub async fn inbound(&self, from: Identity, frame: ClientFrame) -> Result<(), HubError> {
        self.sender
            .send(HubMessage::Inbound { from, frame })
            .await
            .map_err(|e| HubError::Internal(format!("channel send failed: {e}")))
    }

    /// Fetch current registry counters.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Internal`] when the actor is gone.
    pub async fn status(&self) -> Result<HubStatus, HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubMessage::GetStatus { respond_to: tx })
            .await
            .map_err(|e| HubError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))
    }

    /// Cancel the hub actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Get a child token, cancelled together with the hub.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

/// One registered connection.
struct Session {
    /// Identifies this physical connection among successive claims of the
    /// same user id.
    session_id: SessionId,
    /// Outbound channel to the connection's send task.
    sender: mpsc::Sender<ServerFrame>,
    /// Role captured at registration.
    role: Role,
    /// Registration timestamp (unix seconds).
    connected_at: i64,
}

/// The `HubActor` implementation.
pub struct HubActor {
    receiver: mpsc::Receiver<HubMessage>,
    cancel_token: CancellationToken,
    /// Registry: user id to the single live session.
    sessions: HashMap<UserId, Session>,
    /// System of record for profiles and persisted presence.
    directory: Arc<dyn UserDirectory>,
    /// Inbound frames processed since start.
    messages_processed: u64,
}

impl HubActor {
    /// Spawn the hub actor.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(directory: Arc<dyn UserDirectory>) -> (HubActorHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(HUB_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();

        let actor = Self {
            receiver,
            cancel_token: cancel_token.clone(),
            sessions: HashMap::new(),
            directory,
            messages_processed: 0,
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = HubActorHandle {
            sender,
            cancel_token,
        };

        (handle, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "hub.actor")]
    async fn run(mut self) {
        info!(target: "hub.actor", "HubActor started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "hub.actor",
                        sessions = self.sessions.len(),
                        "HubActor cancelled, shutting down"
                    );
                    break;
                }
                msg = self.receiver.recv() => {
                    match msg {
                        Some(msg) => self.handle_message(msg).await,
                        None => {
                            info!(target: "hub.actor", "HubActor channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_message(&mut self, msg: HubMessage) {
        match msg {
            HubMessage::Register {
                identity,
                session_id,
                sender,
                respond_to,
            } => {
                self.handle_register(identity, session_id, sender).await;
                if respond_to.send(()).is_err() {
                    debug!(target: "hub.actor", "Register response receiver dropped");
                }
            }
            HubMessage::Deregister {
                user_id,
                session_id,
            } => {
                self.handle_deregister(user_id, session_id).await;
            }
            HubMessage::Inbound { from, frame } => {
                self.messages_processed += 1;
                if let Err(e) = self.route_frame(from, frame).await {
                    // Per-frame errors are logged and dropped; the sender's
                    // connection stays open.
                    debug!(
                        target: "hub.actor",
                        from = %from.id,
                        error = %e,
                        "Dropped inbound frame"
                    );
                }
            }
            HubMessage::GetStatus { respond_to } => {
                let status = HubStatus {
                    sessions: self.sessions.len(),
                    messages_processed: self.messages_processed,
                };
                if respond_to.send(status).is_err() {
                    debug!(target: "hub.actor", "Status response receiver dropped");
                }
            }
        }
    }

    /// Admit a connection. Replaces any prior session for the same user id;
    /// the replaced connection is not closed, only unreachable for delivery.
    async fn handle_register(
        &mut self,
        identity: Identity,
        session_id: SessionId,
        sender: mpsc::Sender<ServerFrame>,
    ) {
        let session = Session {
            session_id,
            sender,
            role: identity.role,
            connected_at: chrono::Utc::now().timestamp(),
        };

        if let Some(replaced) = self.sessions.insert(identity.id, session) {
            info!(
                target: "hub.actor",
                user_id = %identity.id,
                old_session = %replaced.session_id,
                new_session = %session_id,
                "Session replaced by newer connection"
            );
        } else {
            info!(
                target: "hub.actor",
                user_id = %identity.id,
                session_id = %session_id,
                role = %identity.role,
                "Session registered"
            );
        }

        // Doctors come up ONLINE unless mid-call. A doctor reconnecting
        // while BUSY stays BUSY; the call is still in progress.
        if identity.role == Role::Doctor {
            let current = self
                .directory
                .get_by_id(identity.id)
                .await
                .map(|u| u.status);
            if current != Some(PresenceStatus::Busy) {
                self.set_presence(identity.id, PresenceStatus::Online).await;
            }
        }

        self.broadcast_presence().await;
    }

    /// Remove a connection, but only the exact session that is registered.
    /// A stale connection closing after replacement must not evict the
    /// replacement.
    async fn handle_deregister(&mut self, user_id: UserId, session_id: SessionId) {
        let Some(session) = self.sessions.get(&user_id) else {
            return;
        };
        if session.session_id != session_id {
            debug!(
                target: "hub.actor",
                user_id = %user_id,
                stale_session = %session_id,
                "Ignoring deregister for replaced session"
            );
            return;
        }

        let role = session.role;
        let connected_at = session.connected_at;
        self.sessions.remove(&user_id);
        info!(
            target: "hub.actor",
            user_id = %user_id,
            session_id = %session_id,
            connected_secs = chrono::Utc::now().timestamp() - connected_at,
            "Session deregistered"
        );

        // Disconnect forces a doctor OFFLINE regardless of BUSY; the peer
        // learns of the drop through the presence snapshot.
        if role == Role::Doctor {
            self.set_presence(user_id, PresenceStatus::Offline).await;
        }

        self.broadcast_presence().await;
    }

    /// Dispatch one inbound frame by type.
    async fn route_frame(&mut self, from: Identity, frame: ClientFrame) -> Result<(), HubError> {
        match frame {
            // Keepalive only; no state change, no response.
            ClientFrame::Heartbeat => Ok(()),

            ClientFrame::Chat { to, payload } => {
                let to = to.ok_or(HubError::RoutingMiss("chat missing 'to'"))?;
                self.send_to_user(to, ServerFrame::Chat {
                    from: from.id,
                    payload,
                });
                Ok(())
            }
            ClientFrame::Offer { to, payload } => {
                let to = to.ok_or(HubError::RoutingMiss("offer missing 'to'"))?;
                self.send_to_user(to, ServerFrame::Offer {
                    from: from.id,
                    payload,
                });
                Ok(())
            }
            ClientFrame::Answer { to, payload } => {
                let to = to.ok_or(HubError::RoutingMiss("answer missing 'to'"))?;
                self.send_to_user(to, ServerFrame::Answer {
                    from: from.id,
                    payload,
                });
                Ok(())
            }
            ClientFrame::IceCandidate { to, payload } => {
                let to = to.ok_or(HubError::RoutingMiss("ice-candidate missing 'to'"))?;
                self.send_to_user(to, ServerFrame::IceCandidate {
                    from: from.id,
                    payload,
                });
                Ok(())
            }

            ClientFrame::CallStart { to, payload } => self.handle_call_start(from, to, payload).await,
            ClientFrame::CallEnd { to, payload } => self.handle_call_end(from, to, payload).await,

            ClientFrame::Unknown => Err(HubError::UnknownType),
        }
    }

    /// Arbitrate a `call-start` request.
    ///
    /// The caller always receives a `call-response`. On success the doctor
    /// is marked BUSY before the incoming-call notification goes out, so a
    /// concurrent `call-start` for the same doctor sees BUSY and is
    /// rejected.
    async fn handle_call_start(
        &mut self,
        from: Identity,
        to: Option<UserId>,
        payload: Value,
    ) -> Result<(), HubError> {
        let Some(doctor_id) = to else {
            // No target means no one to answer for; same contract as the
            // other routing misses.
            return Err(HubError::RoutingMiss("call-start missing 'to'"));
        };

        let Some(target) = self.directory.get_by_id(doctor_id).await else {
            self.send_to_user(from.id, ServerFrame::call_rejected(CallRejectReason::DoctorNotFound));
            return Ok(());
        };

        if target.role != Role::Doctor {
            self.send_to_user(from.id, ServerFrame::call_rejected(CallRejectReason::NotADoctor));
            return Ok(());
        }

        if target.status != PresenceStatus::Online {
            self.send_to_user(
                from.id,
                ServerFrame::call_rejected(CallRejectReason::DoctorNotAvailable),
            );
            return Ok(());
        }

        self.set_presence(doctor_id, PresenceStatus::Busy).await;
        self.broadcast_presence().await;

        info!(
            target: "hub.actor",
            caller = %from.id,
            doctor = %doctor_id,
            "Call started"
        );

        self.send_to_user(doctor_id, ServerFrame::CallStart {
            from: from.id,
            payload,
        });
        self.send_to_user(from.id, ServerFrame::call_ok());
        Ok(())
    }

    /// Tear down a call. The notification relays unconditionally; a doctor
    /// named by `to` transitions back to ONLINE with no check of the
    /// current status (an already-ONLINE doctor is a harmless no-op write).
    async fn handle_call_end(
        &mut self,
        from: Identity,
        to: Option<UserId>,
        payload: Value,
    ) -> Result<(), HubError> {
        let peer = to.ok_or(HubError::RoutingMiss("call-end missing 'to'"))?;

        self.send_to_user(peer, ServerFrame::CallEnd {
            from: from.id,
            payload,
        });

        if let Some(peer_user) = self.directory.get_by_id(peer).await {
            if peer_user.role == Role::Doctor {
                self.set_presence(peer, PresenceStatus::Online).await;
                self.broadcast_presence().await;
            }
        }

        info!(
            target: "hub.actor",
            from = %from.id,
            peer = %peer,
            "Call ended"
        );
        Ok(())
    }

    /// Persist a presence status through the directory.
    async fn set_presence(&self, user_id: UserId, status: PresenceStatus) {
        if self.directory.update_status(user_id, status).await.is_none() {
            warn!(
                target: "hub.presence",
                user_id = %user_id,
                status = %status,
                "Presence update for unknown user skipped"
            );
        } else {
            debug!(
                target: "hub.presence",
                user_id = %user_id,
                status = %status,
                "Presence updated"
            );
        }
    }

    /// Push the full roster snapshot to every registered session.
    ///
    /// Single attempt per session; a full or closed channel drops that
    /// delivery and the session catches up on the next snapshot.
    async fn broadcast_presence(&self) {
        let roster = self.directory.list_public().await;
        let frame = ServerFrame::Users { payload: roster };

        for (user_id, session) in &self.sessions {
            if let Err(e) = session.sender.try_send(frame.clone()) {
                debug!(
                    target: "hub.presence",
                    user_id = %user_id,
                    error = %e,
                    "Presence snapshot delivery dropped"
                );
            }
        }
    }

    /// Best-effort delivery to one user's registered session.
    fn send_to_user(&self, to: UserId, frame: ServerFrame) {
        match self.sessions.get(&to) {
            Some(session) => {
                if let Err(e) = session.sender.try_send(frame) {
                    debug!(
                        target: "hub.actor",
                        to = %to,
                        error = %e,
                        "Frame delivery dropped"
                    );
                }
            }
            None => {
                debug!(
                    target: "hub.actor",
                    to = %to,
                    "Frame for unconnected user dropped"
                );
            }
        }
    }
}
