//! Simulated chat bar.

use super::{FocusPolicy, SimulationConfig};
use crate::panel::{
    ContentEnvironment, FocusProbe, OpenCompletion, OpenTrigger, Panel, PanelContainer,
    PanelDescriptor, PanelKey, PanelMode, Surface,
};
use crate::result::HarnessResult;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, info};

#[derive(Debug)]
struct PanelSlot {
    panel: Panel,
    initialized: bool,
    waiters: Vec<oneshot::Sender<Panel>>,
}

#[derive(Debug)]
struct ChatBarState {
    slots: Vec<PanelSlot>,
    selected: Option<usize>,
    focus: Surface,
    /// Bumped by `close_all`; stale initializations check it.
    generation: u64,
    /// Bumped by every explicit focus change; stale focus grants check it.
    focus_epoch: u64,
    open_calls: usize,
}

impl ChatBarState {
    fn position(&self, key: &PanelKey) -> Option<usize> {
        self.slots.iter().position(|slot| slot.panel.key() == *key)
    }
}

/// Panel container with the host's asynchronous timing.
///
/// New panels are visible immediately but only complete their open after
/// the configured initialization delay. Focus granted by an open lands after
/// the focus delay. Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct SimulatedChatBar {
    state: Arc<Mutex<ChatBarState>>,
    config: SimulationConfig,
}

impl SimulatedChatBar {
    /// Create an empty chat bar with content focused
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChatBarState {
                slots: Vec::new(),
                selected: None,
                focus: Surface::Content,
                generation: 0,
                focus_epoch: 0,
                open_calls: 0,
            })),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatBarState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total number of `open` calls received, including re-opens
    #[must_use]
    pub fn open_calls(&self) -> usize {
        self.lock().open_calls
    }

    /// Current input target
    #[must_use]
    pub fn focused_surface(&self) -> Surface {
        self.lock().focus.clone()
    }

    /// Whether the panel with `key` has finished initializing
    #[must_use]
    pub fn is_initialized(&self, key: &PanelKey) -> bool {
        let state = self.lock();
        state
            .position(key)
            .is_some_and(|index| state.slots[index].initialized)
    }

    fn schedule_initialization(&self, key: PanelKey, generation: u64) {
        let state = self.state.clone();
        let delay = self.config.init_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation != generation {
                return;
            }
            let Some(index) = state.position(&key) else {
                return;
            };
            let slot = &mut state.slots[index];
            slot.initialized = true;
            debug!(url = %key.url, waiters = slot.waiters.len(), "panel initialized");
            for waiter in slot.waiters.drain(..) {
                let _ = waiter.send(slot.panel.clone());
            }
        });
    }

    fn schedule_focus(&self, key: PanelKey, generation: u64, focus_epoch: u64) {
        let state = self.state.clone();
        let delay = self.config.focus_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation != generation
                || state.focus_epoch != focus_epoch
                || state.position(&key).is_none()
            {
                return;
            }
            debug!(url = %key.url, "focus moved to panel");
            state.focus = Surface::Panel(key);
        });
    }
}

#[async_trait]
impl PanelContainer for SimulatedChatBar {
    fn open(&self, descriptor: PanelDescriptor, trigger: OpenTrigger) -> OpenCompletion {
        let key = descriptor.key();

        let mut state = self.lock();
        state.open_calls += 1;
        let generation = state.generation;

        let (index, completion) = if let Some(index) = state.position(&key) {
            let slot = &mut state.slots[index];
            if trigger == OpenTrigger::UserAction {
                slot.panel.mode = PanelMode::Normal;
            }
            let completion = if slot.initialized {
                OpenCompletion::ready(slot.panel.clone())
            } else {
                let (tx, completion) = OpenCompletion::pending(descriptor.url.clone());
                slot.waiters.push(tx);
                completion
            };
            debug!(url = %key.url, %trigger, "re-opened existing panel");
            (index, completion)
        } else {
            let (tx, completion) = OpenCompletion::pending(descriptor.url.clone());
            state.slots.push(PanelSlot {
                panel: Panel::from(&descriptor),
                initialized: false,
                waiters: vec![tx],
            });
            info!(url = %key.url, %trigger, mode = ?descriptor.mode, "panel opened");
            self.schedule_initialization(key.clone(), generation);
            (state.slots.len() - 1, completion)
        };

        let grants_focus = match trigger {
            OpenTrigger::UserAction => true,
            OpenTrigger::Background => self.config.policy == FocusPolicy::StealOnBackground,
        };
        if grants_focus {
            state.selected = Some(index);
            state.focus_epoch += 1;
            let focus_epoch = state.focus_epoch;
            drop(state);
            self.schedule_focus(key, generation, focus_epoch);
        } else if state.selected.is_none() {
            state.selected = Some(index);
        }

        completion
    }

    fn panels(&self) -> Vec<Panel> {
        self.lock().slots.iter().map(|slot| slot.panel.clone()).collect()
    }

    fn panel_count(&self) -> usize {
        self.lock().slots.len()
    }

    fn selected_panel(&self) -> Option<Panel> {
        let state = self.lock();
        state
            .selected
            .and_then(|index| state.slots.get(index))
            .map(|slot| slot.panel.clone())
    }

    async fn close_all(&self) -> HarnessResult<()> {
        let mut state = self.lock();
        let closed = state.slots.len();
        state.slots.clear();
        state.selected = None;
        state.generation += 1;
        if matches!(state.focus, Surface::Panel(_)) {
            state.focus = Surface::Content;
            state.focus_epoch += 1;
        }
        debug!(closed, "closed all panels");
        Ok(())
    }
}

impl FocusProbe for SimulatedChatBar {
    fn is_focused(&self, panel: &Panel) -> bool {
        let state = self.lock();
        state.focus == Surface::Panel(panel.key()) && state.position(&panel.key()).is_some()
    }

    fn active_surface_is(&self, surface: &Surface) -> bool {
        self.lock().focus == *surface
    }
}

impl ContentEnvironment for SimulatedChatBar {
    fn focus_content(&self) {
        let mut state = self.lock();
        state.focus = Surface::Content;
        state.focus_epoch += 1;
    }
}
