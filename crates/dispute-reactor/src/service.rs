//! Runs a [`ProtocolReactor`] on its own task, feeding it from the chain observer's event stream
//! and from commands sent through a [`ReactorService`].

use futures::{Stream, StreamExt};
use rollup_validator_primitives::{buf::Address, types::Authority};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    errors::{ReactorErr, ShutdownErr},
    events::ReactorEvent,
    interfaces::{DisputeGraph, LedgerClient, PathProver},
    reactor::ProtocolReactor,
};

/// Message types that can be sent to the reactor task.
#[derive(Debug)]
pub enum ReactorMessage<L> {
    /// React to an event that did not come through the event stream.
    Event(ReactorEvent),

    /// Registers a new local staker.
    AddStaker {
        /// Client used to bind the rollup contract for the staker.
        client: L,

        /// The staker's signing authority.
        authority: Authority,

        /// Channel to send the response back.
        respond_to: oneshot::Sender<Result<Address, ReactorErr>>,
    },

    /// Waits for in-flight submissions and stops the reactor task.
    Shutdown {
        /// Channel to send the response back.
        respond_to: oneshot::Sender<Result<(), ShutdownErr>>,
    },
}

/// Handle to a reactor running in its own task.
///
/// All events and registrations go through the same task, so they are applied one at a time in
/// the order the task receives them. Once the handle is dropped, the task handles the commands
/// already queued and waits for in-flight submissions before stopping.
#[derive(Debug)]
pub struct ReactorService<L> {
    sender: mpsc::UnboundedSender<ReactorMessage<L>>,

    handle: JoinHandle<()>,
}

impl<L> ReactorService<L>
where
    L: LedgerClient + Send + 'static,
{
    /// Spawns the reactor task.
    ///
    /// The event stream and the command channel are polled in random order, so neither can starve
    /// the other. The task keeps running after `events` ends, until it is shut down or the handle
    /// is gone.
    pub fn spawn<G, P, S>(mut reactor: ProtocolReactor<G, P, L::Contract>, mut events: S) -> Self
    where
        G: DisputeGraph + 'static,
        P: PathProver + 'static,
        S: Stream<Item = ReactorEvent> + Send + Unpin + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            info!("dispute reactor started");
            let mut events_open = true;

            loop {
                tokio::select! {
                    event = events.next(), if events_open => match event {
                        Some(event) => reactor.handle_event(event),
                        None => {
                            warn!("event stream ended");
                            events_open = false;
                        }
                    },
                    message = receiver.recv() => match message {
                        Some(ReactorMessage::Event(event)) => reactor.handle_event(event),
                        Some(ReactorMessage::AddStaker {
                            client,
                            authority,
                            respond_to,
                        }) => {
                            let res = reactor.add_staker(&client, authority);
                            if let Err(e) = &res {
                                error!(%e, "failed to register staker");
                            }
                            let _ = respond_to.send(res);
                        }
                        Some(ReactorMessage::Shutdown { respond_to }) => {
                            let _ = respond_to.send(reactor.shutdown().await);
                            break;
                        }
                        None => {
                            debug!("all reactor handles dropped");
                            if let Err(e) = reactor.shutdown().await {
                                error!(%e, "reactor stopped with submissions in flight");
                            }
                            break;
                        }
                    },
                }
            }

            info!("dispute reactor terminated");
        });

        Self { sender, handle }
    }

    /// Queues an event for the reactor.
    pub fn submit(&self, event: ReactorEvent) -> Result<(), ReactorErr> {
        self.sender
            .send(ReactorMessage::Event(event))
            .map_err(|_| ReactorErr::ServiceStopped)
    }

    /// Registers a local staker and returns its address.
    pub async fn add_staker(&self, client: L, authority: Authority) -> Result<Address, ReactorErr> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ReactorMessage::AddStaker {
                client,
                authority,
                respond_to,
            })
            .map_err(|_| ReactorErr::ServiceStopped)?;

        response.await.map_err(|_| ReactorErr::ServiceStopped)?
    }

    /// Stops the reactor after waiting for in-flight submissions, for at most the configured
    /// shutdown timeout.
    pub async fn shutdown(self) -> Result<(), ShutdownErr> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ReactorMessage::Shutdown { respond_to })
            .map_err(|_| ShutdownErr::ServiceStopped)?;

        response.await.map_err(|_| ShutdownErr::ServiceStopped)?
    }

    /// Whether the reactor task has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
