use std::io::Write;
use std::sync::Arc;

use crate::keys;
use crate::layout::PaneId;
use crate::protocol::{Osc8671, RequestType};

/// The two drawing surfaces an application can switch between. Navigation
/// registration is tracked separately per surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScreenBuffer {
    #[default]
    Primary,
    Alternate,
}

/// Per-screen-buffer seamless-navigation registration of a pane's
/// application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registration {
    pub registered: bool,
    pub hide_cursor_on_enter: bool,
}

/// Capability interface a pane calls into when its application does
/// something the rest of the system must react to. One implementation per
/// thread; panes hold it as a shared reference from construction.
pub trait PaneHooks: Send + Sync {
    /// The application answered (or punted on) a navigation request.
    fn navigation_reply(&self, reply: Osc8671);

    /// The pane's content changed and a render is warranted.
    fn pane_updated(&self);
}

/// Hooks that ignore every notification.
pub struct NullHooks;

impl PaneHooks for NullHooks {
    fn navigation_reply(&self, _reply: Osc8671) {}
    fn pane_updated(&self) {}
}

/// A pane as the navigation core sees it: an id, a byte sink to the
/// application's input, and the seamless-navigation registration state.
/// Process and emulation concerns live with the pane I/O layer.
pub struct Pane {
    pub id: PaneId,
    writer: Option<Box<dyn Write + Send>>,
    hooks: Arc<dyn PaneHooks>,
    screen_buffer: ScreenBuffer,
    registration: [Registration; 2],
    /// Set when an Enter is delivered to an application that registered with
    /// cursor hiding; the renderer consumes and clears it.
    pub cursor_hidden: bool,
}

impl Pane {
    pub fn new(id: PaneId, writer: Box<dyn Write + Send>, hooks: Arc<dyn PaneHooks>) -> Self {
        Self {
            id,
            writer: Some(writer),
            hooks,
            screen_buffer: ScreenBuffer::default(),
            registration: [Registration::default(); 2],
            cursor_hidden: false,
        }
    }

    /// A pane with no application attached. Writes are dropped.
    pub fn detached(id: PaneId, hooks: Arc<dyn PaneHooks>) -> Self {
        Self {
            id,
            writer: None,
            hooks,
            screen_buffer: ScreenBuffer::default(),
            registration: [Registration::default(); 2],
            cursor_hidden: false,
        }
    }

    pub fn write_input(&mut self, bytes: &[u8]) {
        if let Some(writer) = &mut self.writer {
            let _ = writer.write_all(bytes);
            let _ = writer.flush();
        }
    }

    pub fn key_event(&mut self, key: crossterm::event::KeyEvent) {
        let bytes = keys::key_to_bytes(key);
        if !bytes.is_empty() {
            self.write_input(&bytes);
        }
    }

    pub fn focus_event(&mut self, gained: bool) {
        self.write_input(keys::focus_to_bytes(gained));
    }

    pub fn paste(&mut self, text: &str) {
        self.write_input(&keys::paste_to_bytes(text));
    }

    pub fn screen_buffer(&self) -> ScreenBuffer {
        self.screen_buffer
    }

    /// Switch drawing surfaces. Registration for the other surface is kept.
    pub fn set_screen_buffer(&mut self, buffer: ScreenBuffer) {
        self.screen_buffer = buffer;
    }

    /// Hard or soft terminal reset: registration reverts to defaults on both
    /// surfaces.
    pub fn reset(&mut self) {
        self.registration = [Registration::default(); 2];
    }

    pub fn registration(&self) -> Registration {
        self.registration[self.buffer_index()]
    }

    fn buffer_index(&self) -> usize {
        match self.screen_buffer {
            ScreenBuffer::Primary => 0,
            ScreenBuffer::Alternate => 1,
        }
    }

    /// An OSC 8671 arrived from this pane's application (detected by the
    /// pane's terminal parser). Support queries are echoed, registration is
    /// recorded for the current screen buffer, and navigation replies are
    /// forwarded to the coordinator through the hooks. The reply path takes
    /// the pending-queue lock and may take the layout lock, so the pane I/O
    /// task must call this with neither held.
    pub fn handle_app_request(&mut self, request: Osc8671) {
        match request.kind {
            RequestType::Supported => {
                let echo = Osc8671 {
                    kind: RequestType::Supported,
                    ..Default::default()
                };
                self.write_input(echo.serialize().as_bytes());
            }
            RequestType::Register => {
                self.registration[self.buffer_index()] = Registration {
                    registered: true,
                    hide_cursor_on_enter: request.hide_cursor_on_enter,
                };
            }
            RequestType::Unregister => {
                self.registration[self.buffer_index()] = Registration::default();
            }
            RequestType::Navigate | RequestType::Acknowledge => {
                self.hooks.navigation_reply(request);
            }
            // Enter flows outer-to-application only.
            RequestType::Enter => {}
        }
    }

    /// Deliver a navigation message (Navigate or Enter) to the application.
    /// Returns false when the application is not registered on the current
    /// screen buffer, in which case the caller handles the move itself.
    pub fn seamless_navigate(&mut self, message: &Osc8671) -> bool {
        let registration = self.registration();
        if !registration.registered {
            return false;
        }
        if message.kind == RequestType::Enter && registration.hide_cursor_on_enter {
            self.cursor_hidden = true;
        }
        self.write_input(message.serialize().as_bytes());
        true
    }
}
