//! Panel container and focus interfaces.
//!
//! The harness never mutates panel state itself. It asks a [`PanelContainer`]
//! to open panels, reads the container back, and asks a [`FocusProbe`] where
//! input focus currently is.

use crate::result::{HarnessError, HarnessResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::oneshot;

/// How a panel is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelMode {
    /// Expanded
    #[default]
    Normal,
    /// Collapsed to its title bar
    Minimized,
}

/// Why a panel is being opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenTrigger {
    /// Requested by content or a worker without user input
    Background,
    /// Direct consequence of a user action
    UserAction,
}

impl fmt::Display for OpenTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Background => write!(f, "background"),
            Self::UserAction => write!(f, "user-action"),
        }
    }
}

/// Identity of a panel inside a container: one panel per origin and URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PanelKey {
    /// Provider origin
    pub origin: String,
    /// Chat document URL
    pub url: String,
}

/// Everything a container needs to open a panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDescriptor {
    /// Provider origin
    pub origin: String,
    /// Title shown in the panel header
    pub title: String,
    /// Chat document URL
    pub url: String,
    /// Presentation mode
    #[serde(default)]
    pub mode: PanelMode,
}

impl PanelDescriptor {
    /// Create a descriptor in normal mode
    #[must_use]
    pub fn new(
        origin: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            title: title.into(),
            url: url.into(),
            mode: PanelMode::Normal,
        }
    }

    /// Set the presentation mode
    #[must_use]
    pub const fn with_mode(mut self, mode: PanelMode) -> Self {
        self.mode = mode;
        self
    }

    /// Identity this descriptor opens
    #[must_use]
    pub fn key(&self) -> PanelKey {
        PanelKey {
            origin: self.origin.clone(),
            url: self.url.clone(),
        }
    }
}

/// Snapshot of an open panel.
///
/// Focus is not part of the snapshot; ask a [`FocusProbe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    /// Provider origin
    pub origin: String,
    /// Title shown in the panel header
    pub title: String,
    /// Chat document URL
    pub url: String,
    /// Presentation mode
    pub mode: PanelMode,
}

impl Panel {
    /// Identity of this panel
    #[must_use]
    pub fn key(&self) -> PanelKey {
        PanelKey {
            origin: self.origin.clone(),
            url: self.url.clone(),
        }
    }
}

impl From<&PanelDescriptor> for Panel {
    fn from(descriptor: &PanelDescriptor) -> Self {
        Self {
            origin: descriptor.origin.clone(),
            title: descriptor.title.clone(),
            url: descriptor.url.clone(),
            mode: descriptor.mode,
        }
    }
}

/// Something that can hold input focus
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The content view the user was working in
    Content,
    /// A chat panel
    Panel(PanelKey),
}

/// Resolves once the container has finished initializing an opened panel
#[derive(Debug)]
pub struct OpenCompletion {
    url: String,
    rx: oneshot::Receiver<Panel>,
}

impl OpenCompletion {
    /// Create a pending completion and the sender that resolves it
    #[must_use]
    pub fn pending(url: impl Into<String>) -> (oneshot::Sender<Panel>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                url: url.into(),
                rx,
            },
        )
    }

    /// Create a completion that is already resolved
    #[must_use]
    pub fn ready(panel: Panel) -> Self {
        let (tx, completion) = Self::pending(panel.url.clone());
        let _ = tx.send(panel);
        completion
    }

    /// Wait for the container to finish the open.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ContainerDropped`] if the container discarded
    /// the request, e.g. because the panel was closed before it initialized.
    pub async fn wait(self) -> HarnessResult<Panel> {
        self.rx
            .await
            .map_err(|_| HarnessError::ContainerDropped { url: self.url })
    }
}

/// Host-side container of chat panels
#[async_trait]
pub trait PanelContainer: Send + Sync {
    /// Open `descriptor`, or re-open it if a panel with the same identity
    /// exists.
    ///
    /// The panel is part of the container when this returns; the returned
    /// completion resolves once it is fully initialized. Re-opening an
    /// existing identity never adds a second panel and still resolves.
    fn open(&self, descriptor: PanelDescriptor, trigger: OpenTrigger) -> OpenCompletion;

    /// Open panels, first opened first
    fn panels(&self) -> Vec<Panel>;

    /// Number of open panels
    fn panel_count(&self) -> usize {
        self.panels().len()
    }

    /// The first open panel
    fn first_panel(&self) -> Option<Panel> {
        self.panels().into_iter().next()
    }

    /// The currently selected panel
    fn selected_panel(&self) -> Option<Panel>;

    /// Close every panel
    async fn close_all(&self) -> HarnessResult<()>;
}

/// Reports where input focus is
pub trait FocusProbe: Send + Sync {
    /// Whether `panel` holds input focus
    fn is_focused(&self, panel: &Panel) -> bool;

    /// Whether `surface` is the active input target
    fn active_surface_is(&self, surface: &Surface) -> bool;
}

/// Host environment providing the content view under test
pub trait ContentEnvironment: Send + Sync {
    /// Give the content view input focus
    fn focus_content(&self);
}
