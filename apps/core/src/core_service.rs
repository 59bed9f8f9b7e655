use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::clipboard::Clipboard;
use crate::config::{validate, Config};
use crate::history::{History, HistoryContext, HistoryError, HistoryEvent, HistorySnapshot, LoadMoreOutcome};
use crate::history_store::{self, StoreError};
use crate::model::{ChangeToken, HistoryItem, ItemId};
use crate::overlay_state::{OverlayState, PanelAction};
use crate::scheduler::TaskSlot;
use crate::settings::SettingsChange;
use crate::shortcuts::HistoryItemAction;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("history service stopped")]
    Closed,
}

type Reply<T> = oneshot::Sender<Result<T, HistoryError>>;

enum Command {
    Load(Reply<()>),
    LoadMore(Reply<LoadMoreOutcome>),
    ResetView(Reply<bool>),
    Add {
        item: HistoryItem,
        token: ChangeToken,
        reply: Reply<ItemId>,
    },
    Delete {
        id: ItemId,
        reply: Reply<()>,
    },
    Clear(oneshot::Sender<()>),
    ClearAll(oneshot::Sender<()>),
    TogglePin {
        id: ItemId,
        reply: Reply<Option<char>>,
    },
    Select {
        id: ItemId,
        action: HistoryItemAction,
        reply: Reply<()>,
    },
    PressedShortcut {
        key: char,
        reply: oneshot::Sender<Option<(ItemId, HistoryItemAction)>>,
    },
    SetSelected {
        id: Option<ItemId>,
        reply: oneshot::Sender<()>,
    },
    SetQuery {
        query: String,
        reply: oneshot::Sender<()>,
    },
    SearchNow {
        query: String,
        reply: oneshot::Sender<HistorySnapshot>,
    },
    ApplySettings {
        change: SettingsChange,
        reply: Reply<()>,
    },
    SetVisible {
        visible: bool,
        reply: oneshot::Sender<()>,
    },
    Snapshot(oneshot::Sender<HistorySnapshot>),
    // Sent by the owner's own timers.
    ApplyQuery {
        query: String,
        generation: u64,
    },
    Refresh,
}

/// Handle to the history owner task. Cheap to clone; the task stops once
/// every handle is dropped.
#[derive(Clone)]
pub struct CoreService {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<HistoryEvent>,
    loading_more: Arc<AtomicBool>,
}

/// Held while a load-more request is outstanding. Released on drop, so a
/// caller that abandons the request does not leave the gate closed.
struct LoadMoreGate<'a>(&'a AtomicBool);

impl<'a> LoadMoreGate<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(Self(flag))
    }
}

impl Drop for LoadMoreGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CoreService {
    /// Opens the store named by `config` and starts the owner task. Must be
    /// called inside a tokio runtime.
    pub fn open(config: Config, clipboard: Arc<dyn Clipboard>) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        let store = history_store::open_from_config(&config)?;
        Ok(Self::spawn(History::new(HistoryContext {
            store: Box::new(store),
            config,
            clipboard,
        })))
    }

    pub fn spawn(history: History) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let events = history.event_sender();
        let owner = Owner {
            history,
            commands: commands.downgrade(),
            debounce: TaskSlot::new(),
            refresh: TaskSlot::new(),
            overlay: OverlayState::default(),
            generation: 0,
        };
        tokio::spawn(owner.run(receiver));
        Self {
            commands,
            events,
            loading_more: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    pub async fn load(&self) -> Result<(), ServiceError> {
        Ok(self.request(Command::Load).await??)
    }

    /// Appends the next page. A call made while another is outstanding
    /// returns [`LoadMoreOutcome::InFlight`] without touching the store.
    pub async fn load_more(&self) -> Result<LoadMoreOutcome, ServiceError> {
        let Some(_gate) = LoadMoreGate::acquire(&self.loading_more) else {
            return Ok(LoadMoreOutcome::InFlight);
        };
        Ok(self.request(Command::LoadMore).await??)
    }

    pub async fn reset_view(&self) -> Result<bool, ServiceError> {
        Ok(self.request(Command::ResetView).await??)
    }

    pub async fn add(&self, item: HistoryItem, token: ChangeToken) -> Result<ItemId, ServiceError> {
        Ok(self
            .request(|reply| Command::Add { item, token, reply })
            .await??)
    }

    pub async fn delete(&self, id: ItemId) -> Result<(), ServiceError> {
        Ok(self.request(|reply| Command::Delete { id, reply }).await??)
    }

    pub async fn clear(&self) -> Result<(), ServiceError> {
        self.request(Command::Clear).await
    }

    pub async fn clear_all(&self) -> Result<(), ServiceError> {
        self.request(Command::ClearAll).await
    }

    pub async fn toggle_pin(&self, id: ItemId) -> Result<Option<char>, ServiceError> {
        Ok(self.request(|reply| Command::TogglePin { id, reply }).await??)
    }

    pub async fn select(&self, id: ItemId, action: HistoryItemAction) -> Result<(), ServiceError> {
        Ok(self
            .request(|reply| Command::Select { id, action, reply })
            .await??)
    }

    pub async fn pressed_shortcut(
        &self,
        key: char,
    ) -> Result<Option<(ItemId, HistoryItemAction)>, ServiceError> {
        self.request(|reply| Command::PressedShortcut { key, reply })
            .await
    }

    pub async fn set_selected(&self, id: Option<ItemId>) -> Result<(), ServiceError> {
        self.request(|reply| Command::SetSelected { id, reply }).await
    }

    /// Debounced filter. Rapid calls collapse into one pass over the latest
    /// query; an empty query clears the filter at once.
    pub async fn set_query(&self, query: &str) -> Result<(), ServiceError> {
        let query = query.to_string();
        self.request(|reply| Command::SetQuery { query, reply }).await
    }

    /// Filters right away, dropping any pending debounced query.
    pub async fn search_now(&self, query: &str) -> Result<HistorySnapshot, ServiceError> {
        let query = query.to_string();
        self.request(|reply| Command::SearchNow { query, reply })
            .await
    }

    pub async fn apply_settings(&self, change: SettingsChange) -> Result<(), ServiceError> {
        Ok(self
            .request(|reply| Command::ApplySettings { change, reply })
            .await??)
    }

    pub async fn set_visible(&self, visible: bool) -> Result<(), ServiceError> {
        self.request(|reply| Command::SetVisible { visible, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<HistorySnapshot, ServiceError> {
        self.request(Command::Snapshot).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| ServiceError::Closed)?;
        response.await.map_err(|_| ServiceError::Closed)
    }
}

struct Owner {
    history: History,
    commands: mpsc::WeakUnboundedSender<Command>,
    debounce: TaskSlot,
    refresh: TaskSlot,
    overlay: OverlayState,
    generation: u64,
}

impl Owner {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = receiver.recv().await {
            self.handle(command);
        }
        self.debounce.cancel();
        self.refresh.cancel();
        debug!("history service stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Load(reply) => {
                let _ = reply.send(self.history.load());
            }
            Command::LoadMore(reply) => {
                let _ = reply.send(self.history.load_more());
            }
            Command::ResetView(reply) => {
                let _ = reply.send(self.history.reset_view());
            }
            Command::Add { item, token, reply } => {
                let _ = reply.send(self.history.add(item, token));
            }
            Command::Delete { id, reply } => {
                let _ = reply.send(self.history.delete(id));
            }
            Command::Clear(reply) => {
                self.history.clear();
                let _ = reply.send(());
            }
            Command::ClearAll(reply) => {
                self.history.clear_all();
                let _ = reply.send(());
            }
            Command::TogglePin { id, reply } => {
                let _ = reply.send(self.history.toggle_pin(id));
            }
            Command::Select { id, action, reply } => {
                let _ = reply.send(self.history.select(id, action));
            }
            Command::PressedShortcut { key, reply } => {
                let _ = reply.send(self.history.pressed_shortcut(key));
            }
            Command::SetSelected { id, reply } => {
                self.history.set_selected(id);
                let _ = reply.send(());
            }
            Command::SetQuery { query, reply } => {
                self.schedule_query(query);
                let _ = reply.send(());
            }
            Command::SearchNow { query, reply } => {
                self.generation += 1;
                self.debounce.cancel();
                self.history.apply_query(&query);
                let _ = reply.send(self.history.snapshot());
            }
            Command::ApplySettings { change, reply } => {
                let _ = reply.send(self.history.apply_settings(change));
            }
            Command::SetVisible { visible, reply } => {
                self.set_visible(visible);
                let _ = reply.send(());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.history.snapshot());
            }
            Command::ApplyQuery { query, generation } => {
                if generation == self.generation {
                    self.history.apply_query(&query);
                } else {
                    debug!(%query, "dropping superseded query");
                }
            }
            Command::Refresh => {
                if let Err(error) = self.history.reset_view() {
                    warn!(%error, "periodic refresh failed");
                }
            }
        }
    }

    fn schedule_query(&mut self, query: String) {
        self.generation += 1;
        if query.is_empty() {
            self.debounce.cancel();
            self.history.apply_query("");
            return;
        }

        let generation = self.generation;
        let delay = Duration::from_millis(self.history.config().search_debounce_ms);
        let commands = self.commands.clone();
        self.debounce.schedule_after(delay, move || {
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(Command::ApplyQuery { query, generation });
            }
        });
    }

    fn set_visible(&mut self, visible: bool) {
        match self.overlay.set_visible(visible) {
            PanelAction::Opened => {
                let period = Duration::from_secs(self.history.config().refresh_interval_secs);
                let commands = self.commands.clone();
                self.refresh.schedule_every(period, move || {
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands.send(Command::Refresh);
                    }
                });
                info!(period_secs = period.as_secs(), "history panel opened");
            }
            PanelAction::Closed => {
                self.generation += 1;
                self.debounce.cancel();
                self.refresh.cancel();
                if let Err(error) = self.history.reset_view() {
                    warn!(%error, "reset on close failed");
                }
                info!("history panel closed");
            }
            PanelAction::Unchanged => {}
        }
    }
}
