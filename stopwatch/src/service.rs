//! Runs a [`Manager`] on its own task so every registry and instance
//! mutation happens in one place. Other tasks talk to it through a
//! [`ServiceHandle`].
use std::future;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::{
    clock::Clock,
    error::StopwatchError,
    instance::InstanceId,
    manager::{Command, Event, Manager, Snapshot},
    settings::Overrides,
    surface::{ElementId, Surface},
};

#[derive(Debug)]
pub enum Request {
    Attach {
        target: ElementId,
        overrides: Overrides,
        reply: oneshot::Sender<Result<InstanceId, StopwatchError>>,
    },
    Dispatch {
        target: ElementId,
        command: Command,
    },
    Event(Event),
    SetDefaults(Overrides),
    PauseOnFocus {
        element: ElementId,
        target: ElementId,
        reply: oneshot::Sender<Result<(), StopwatchError>>,
    },
    Value {
        element: ElementId,
        reply: oneshot::Sender<Option<String>>,
    },
    Snapshot {
        target: ElementId,
        reply: oneshot::Sender<Option<Snapshot>>,
    },
    Shutdown,
}

pub struct StopwatchService<S, C> {
    manager: Manager<S, C>,
    requests: mpsc::Receiver<Request>,
}

impl<S: Surface, C: Clock> StopwatchService<S, C> {
    /// Wrap `manager`, accepting up to `buffer` queued requests.
    pub fn new(manager: Manager<S, C>, buffer: usize) -> (Self, ServiceHandle) {
        let (sender, requests) = mpsc::channel(buffer);
        (Self { manager, requests }, ServiceHandle { sender })
    }

    /// Serve requests and fire ticks until shut down or every handle is
    /// dropped. Hands the manager back when done.
    pub async fn run(self) -> Manager<S, C> {
        let Self {
            mut manager,
            mut requests,
        } = self;
        info!("stopwatch service started");

        loop {
            let deadline = manager.next_deadline();
            tokio::select! {
                request = requests.recv() => match request {
                    Some(Request::Shutdown) | None => break,
                    Some(request) => handle(&mut manager, request),
                },
                () = sleep_until_next(deadline) => {
                    let fired = manager.run_due();
                    debug!("fired {} stopwatch ticks", fired);
                }
            }
        }

        info!("stopwatch service stopped with {} instances", manager.len());
        manager
    }
}

fn handle<S: Surface, C: Clock>(manager: &mut Manager<S, C>, request: Request) {
    // A dropped reply receiver just means the caller stopped waiting.
    match request {
        Request::Attach {
            target,
            overrides,
            reply,
        } => {
            let _ = reply.send(manager.attach(target, &overrides));
        }
        Request::Dispatch { target, command } => {
            manager.dispatch(target, command);
        }
        Request::Event(event) => manager.handle_event(event),
        Request::SetDefaults(overrides) => manager.set_defaults(&overrides),
        Request::PauseOnFocus {
            element,
            target,
            reply,
        } => {
            let _ = reply.send(manager.pause_on_focus(element, target));
        }
        Request::Value { element, reply } => {
            let _ = reply.send(manager.surface().value(element));
        }
        Request::Snapshot { target, reply } => {
            let _ = reply.send(manager.snapshot(target).ok());
        }
        Request::Shutdown => {}
    }
}

async fn sleep_until_next(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => future::pending().await,
    }
}

#[derive(Debug, Clone)]
pub struct ServiceHandle {
    sender: mpsc::Sender<Request>,
}

impl ServiceHandle {
    /// # Errors
    ///
    /// `StopwatchError::AlreadyAttached` if the target already has a
    /// stopwatch, or `StopwatchError::ServiceClosed`.
    pub async fn attach(
        &self,
        target: ElementId,
        overrides: Overrides,
    ) -> Result<InstanceId, StopwatchError> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Attach {
            target,
            overrides,
            reply,
        })
        .await?;
        response.await.map_err(|_| StopwatchError::ServiceClosed)?
    }

    /// # Errors
    ///
    /// `StopwatchError::ServiceClosed` if the service has stopped.
    pub async fn dispatch(
        &self,
        target: ElementId,
        command: Command,
    ) -> Result<(), StopwatchError> {
        self.send(Request::Dispatch { target, command }).await
    }

    /// # Errors
    ///
    /// `StopwatchError::ServiceClosed` if the service has stopped.
    pub async fn event(&self, event: Event) -> Result<(), StopwatchError> {
        self.send(Request::Event(event)).await
    }

    /// # Errors
    ///
    /// `StopwatchError::ServiceClosed` if the service has stopped.
    pub async fn set_defaults(
        &self,
        overrides: Overrides,
    ) -> Result<(), StopwatchError> {
        self.send(Request::SetDefaults(overrides)).await
    }

    /// # Errors
    ///
    /// `StopwatchError::NotAttached` if `target` has no stopwatch, or
    /// `StopwatchError::ServiceClosed`.
    pub async fn pause_on_focus(
        &self,
        element: ElementId,
        target: ElementId,
    ) -> Result<(), StopwatchError> {
        let (reply, response) = oneshot::channel();
        self.send(Request::PauseOnFocus {
            element,
            target,
            reply,
        })
        .await?;
        response.await.map_err(|_| StopwatchError::ServiceClosed)?
    }

    /// Current text of an element on the service's surface.
    ///
    /// # Errors
    ///
    /// `StopwatchError::ServiceClosed` if the service has stopped.
    pub async fn value(
        &self,
        element: ElementId,
    ) -> Result<Option<String>, StopwatchError> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Value { element, reply }).await?;
        response.await.map_err(|_| StopwatchError::ServiceClosed)
    }

    /// # Errors
    ///
    /// `StopwatchError::ServiceClosed` if the service has stopped.
    pub async fn snapshot(
        &self,
        target: ElementId,
    ) -> Result<Option<Snapshot>, StopwatchError> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Snapshot { target, reply }).await?;
        response.await.map_err(|_| StopwatchError::ServiceClosed)
    }

    /// # Errors
    ///
    /// `StopwatchError::ServiceClosed` if the service has already stopped.
    pub async fn shutdown(&self) -> Result<(), StopwatchError> {
        self.send(Request::Shutdown).await
    }

    async fn send(&self, request: Request) -> Result<(), StopwatchError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| StopwatchError::ServiceClosed)
    }
}
