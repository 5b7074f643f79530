use crate::overlay::PointerEvent;
use crate::platform::GesturePolicy;
use crate::playback::{OverlayVisibility, PlaybackState};
use crate::session::{ArSession, SessionDeps};
use crate::{Error, Result, SessionConfig};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Metadata(oneshot::Sender<Result<()>>),
    Pointer(PointerEvent, oneshot::Sender<bool>),
    Tick(oneshot::Sender<bool>),
    Status(oneshot::Sender<SessionStatus>),
    Close(oneshot::Sender<()>),
}

/// Point-in-time view of a running session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub policy: GesturePolicy,
    pub playback: Option<PlaybackState>,
    pub overlay: OverlayVisibility,
    pub unlocked: bool,
}

impl SessionStatus {
    fn of(session: &ArSession) -> Self {
        Self {
            policy: session.policy(),
            playback: session.playback_state(),
            overlay: session.overlay_visibility(),
            unlocked: session.is_unlocked(),
        }
    }
}

/// An async-friendly session handle backed by a dedicated worker thread.
///
/// The worker thread owns the `ArSession` and executes commands in the order
/// they were sent. Tracker found/lost callbacks do not go through this queue:
/// they run on the tracker's thread and are serialized with commands only by
/// the session's stage lock, so their order relative to queued commands is
/// not defined. Blocking asset retrieval also happens on the worker, outside
/// any async runtime.
#[derive(Clone)]
pub struct SessionWorker {
    cmd_tx: Sender<Command>,
}

impl SessionWorker {
    /// Launch a session on a new worker thread.
    pub async fn launch(query: impl Into<String>, config: SessionConfig, deps: SessionDeps) -> Result<Self> {
        let query = query.into();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let session = match ArSession::launch(&query, config, deps) {
                Ok(s) => s,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Metadata(resp) => {
                        let _ = resp.send(session.on_video_metadata());
                    }
                    Command::Pointer(ev, resp) => {
                        let _ = resp.send(session.pointer_down(ev));
                    }
                    Command::Tick(resp) => {
                        let _ = resp.send(session.tick());
                    }
                    Command::Status(resp) => {
                        let _ = resp.send(SessionStatus::of(&session));
                    }
                    Command::Close(resp) => {
                        session.close();
                        let _ = resp.send(());
                        break;
                    }
                }
            }
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::Other("Session worker has shut down".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Session worker dropped reply: {}", e)))
    }

    /// Forward the video's `loadedmetadata` event.
    pub async fn video_metadata(&self) -> Result<()> {
        self.request(Command::Metadata).await?
    }

    /// Forward a pointer press; true if it unlocked playback.
    pub async fn pointer_down(&self, pointer: PointerEvent) -> Result<bool> {
        self.request(|tx| Command::Pointer(pointer, tx)).await
    }

    /// Run one render tick.
    pub async fn tick(&self) -> Result<bool> {
        self.request(Command::Tick).await
    }

    pub async fn status(&self) -> Result<SessionStatus> {
        self.request(Command::Status).await
    }

    /// Close the session and stop the worker.
    pub async fn close(self) -> Result<()> {
        self.request(Command::Close).await
    }
}
