use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

use crate::event::{ClipboardRequest, Event, InputMode, RenderEvent};
use crate::pane::PaneHooks;
use crate::protocol::{NavigateDirection, Osc8671, RequestType, WrapMode};
use crate::render::RenderHandle;
use crate::state::SharedLayoutState;
use crate::tab::SeamlessMode;

/// How long a pane's application gets to answer a Navigate before the move
/// is performed locally.
const REPLY_TIMEOUT: Duration = Duration::from_millis(200);

/// Turns raw bytes from the host terminal into typed events. Implementations
/// own all cross-chunk state (UTF-8 continuations, split escape sequences).
pub trait EventParser: Send {
    fn parse(&mut self, bytes: &[u8]) -> Vec<Event>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntryState {
    /// Not yet handed to a handler.
    Fresh,
    /// A handler deferred it; it sits at the head until a reply arrives or
    /// the deadline passes.
    AwaitingReply,
}

struct PendingEvent {
    event: Event,
    deadline: Instant,
    state: EntryState,
}

/// The input side of the multiplexer: a thread that reads the host
/// terminal's byte stream, parses it into events, and dispatches them in
/// order, holding everything behind an in-flight navigation request until
/// its reply or timeout.
pub struct InputThread {
    core: Arc<InputCore>,
    thread: Option<JoinHandle<()>>,
}

impl InputThread {
    pub fn spawn(
        source: Box<dyn Read + Send>,
        parser: Box<dyn EventParser>,
        waker: Box<dyn Write + Send>,
        layout: SharedLayoutState,
        render: RenderHandle,
    ) -> Result<Self> {
        let core = Arc::new(InputCore::new(layout, render, waker));
        let thread_core = core.clone();
        let thread = std::thread::Builder::new()
            .name("input".into())
            .spawn(move || thread_core.read_loop(source, parser))?;
        Ok(Self {
            core,
            thread: Some(thread),
        })
    }

    /// The capability interface to hand to panes at construction. Replies
    /// from pane applications find their way back here; content updates go
    /// to the render thread.
    pub fn hooks(&self) -> Arc<dyn PaneHooks> {
        Arc::new(InputThreadHooks {
            core: self.core.clone(),
        })
    }

    pub fn request_exit(&self) {
        self.core.request_exit();
    }

    /// Entry point for the key-bind layer: navigate from the active pane.
    pub fn request_navigate(&self, direction: NavigateDirection) {
        self.core.request_navigate(direction);
    }

    /// Deliver an OSC 8671 reply received from a pane's application.
    ///
    /// Takes the pending-queue lock and then, if the reply resolves the
    /// head, the layout lock; callers must hold neither.
    pub fn notify_reply(&self, reply: Osc8671) {
        self.core.notify_reply(reply);
    }

    pub fn set_input_mode(&self, mode: InputMode) {
        self.core.set_input_mode(mode);
    }
}

impl Drop for InputThread {
    fn drop(&mut self) {
        self.request_exit();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct InputThreadHooks {
    core: Arc<InputCore>,
}

impl PaneHooks for InputThreadHooks {
    fn navigation_reply(&self, reply: Osc8671) {
        self.core.notify_reply(reply);
    }

    fn pane_updated(&self) {
        self.core.render.request_render();
    }
}

struct InputCore {
    done: AtomicBool,
    pending: Mutex<VecDeque<PendingEvent>>,
    layout: SharedLayoutState,
    render: RenderHandle,
    mode: Mutex<InputMode>,
    drag_origin: Mutex<Option<(u16, u16)>>,
    waker: Mutex<Box<dyn Write + Send>>,
}

impl InputCore {
    fn new(layout: SharedLayoutState, render: RenderHandle, waker: Box<dyn Write + Send>) -> Self {
        Self {
            done: AtomicBool::new(false),
            pending: Mutex::new(VecDeque::new()),
            layout,
            render,
            mode: Mutex::new(InputMode::default()),
            drag_origin: Mutex::new(None),
            waker: Mutex::new(waker),
        }
    }

    fn read_loop(&self, mut source: Box<dyn Read + Send>, mut parser: Box<dyn EventParser>) {
        let mut buffer = [0u8; 4096];
        while !self.done.load(Ordering::Acquire) {
            let nread = match source.read(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            if self.done.load(Ordering::Acquire) {
                break;
            }

            let deadline = Instant::now() + REPLY_TIMEOUT;
            let events = parser.parse(&buffer[..nread]);
            {
                let mut pending = self.pending.lock().unwrap();
                for event in events {
                    pending.push_back(PendingEvent {
                        event,
                        deadline,
                        state: EntryState::Fresh,
                    });
                }
            }

            self.process_pending_events();
        }
        self.render.request_exit();
        self.done.store(true, Ordering::Release);
    }

    fn request_exit(&self) {
        if !self.done.swap(true, Ordering::Release) {
            // Unblock the read by requesting device attributes; the host
            // terminal's reply lands on the byte source.
            if let Ok(mut waker) = self.waker.lock() {
                let _ = waker.write_all(b"\x1b[c");
                let _ = waker.flush();
            }
        }
    }

    /// Inject a Navigate for the active pane. Pushed at the queue front:
    /// this is called while an earlier input event is being processed and
    /// logically replaces it. Wrapping is permitted because the caller
    /// already decided the outer layer may cycle.
    fn request_navigate(&self, direction: NavigateDirection) {
        let message = Osc8671 {
            kind: RequestType::Navigate,
            direction: Some(direction),
            id: Some(uuid::Uuid::new_v4().to_string()),
            wrap: WrapMode::Allow,
            ..Default::default()
        };
        self.pending.lock().unwrap().push_front(PendingEvent {
            event: Event::Osc8671(message),
            deadline: Instant::now() + REPLY_TIMEOUT,
            state: EntryState::Fresh,
        });
        self.process_pending_events();
    }

    /// Correlate a reply from a pane's application against the queue head.
    /// An Acknowledge completes the head outright; a Navigate punt adopts
    /// the application's range and expires the head so the dispatcher
    /// finishes the move locally. Anything else is stale and dropped.
    fn notify_reply(&self, reply: Osc8671) {
        if !matches!(reply.kind, RequestType::Navigate | RequestType::Acknowledge) {
            return;
        }

        let should_process = {
            let mut pending = self.pending.lock().unwrap();
            let head_action = match pending.front_mut() {
                Some(entry) => match &mut entry.event {
                    Event::Osc8671(message) if message.id == reply.id => {
                        if reply.kind == RequestType::Acknowledge {
                            Some(true)
                        } else {
                            entry.deadline = Instant::now();
                            message.range = reply.range;
                            Some(false)
                        }
                    }
                    _ => None,
                },
                None => None,
            };
            match head_action {
                Some(pop) => {
                    if pop {
                        pending.pop_front();
                    }
                    true
                }
                None => false,
            }
        };

        if should_process {
            self.process_pending_events();
        }
    }

    fn set_input_mode(&self, mode: InputMode) {
        let mut current = self.mode.lock().unwrap();
        if *current == mode {
            return;
        }
        *current = mode;
        self.render.push_event(RenderEvent::InputStatus { mode });
    }

    /// Drain the queue head-first. Stops at the first entry that is still
    /// awaiting its reply, so later events keep their order behind it.
    fn process_pending_events(&self) {
        while !self.done.load(Ordering::Acquire) {
            let mut entry = match self.pending.lock().unwrap().pop_front() {
                Some(entry) => entry,
                None => break,
            };

            if entry.state == EntryState::AwaitingReply {
                if Instant::now() >= entry.deadline {
                    self.dispatch(&mut entry.event, true);
                    continue;
                }
                self.pending.lock().unwrap().push_front(entry);
                break;
            }

            if !self.dispatch(&mut entry.event, false) {
                entry.state = EntryState::AwaitingReply;
                self.pending.lock().unwrap().push_front(entry);
                break;
            }
        }
    }

    /// Handle one event. Returns false only when the event must stay queued
    /// for an out-of-band reply; every other handler completes in one step.
    /// Called without the pending-queue lock held, since handlers take the
    /// layout lock.
    fn dispatch(&self, event: &mut Event, did_timeout: bool) -> bool {
        match event {
            Event::Key(key) => {
                self.handle_key(*key);
                true
            }
            Event::Mouse(mouse) => {
                self.handle_mouse(*mouse);
                true
            }
            Event::Focus { gained } => {
                let mut state = self.layout.lock().unwrap();
                if let Some(pane) = state.active_pane_mut() {
                    pane.focus_event(*gained);
                }
                true
            }
            Event::Paste(text) => {
                let mut state = self.layout.lock().unwrap();
                if let Some(pane) = state.active_pane_mut() {
                    pane.paste(text);
                }
                true
            }
            Event::Osc52(osc52) => {
                self.render.push_event(RenderEvent::Clipboard(ClipboardRequest {
                    osc52: osc52.clone(),
                    reply: true,
                }));
                true
            }
            Event::Osc8671(message) => self.handle_osc_8671(message, did_timeout),
            // Replies to queries we issued; nothing to do beyond consuming
            // them so they never reach a pane.
            Event::PrimaryDeviceAttributes
            | Event::ModeQueryReply
            | Event::CursorPositionReport
            | Event::KeyboardReport
            | Event::StatusResponse
            | Event::TerminfoString => true,
        }
    }

    fn handle_key(&self, key: KeyEvent) {
        // Key binds are matched by the embedding layer before events reach
        // this queue; what arrives here goes to the active pane, and only
        // while in insert mode.
        if *self.mode.lock().unwrap() != InputMode::Insert {
            return;
        }
        if key.kind == KeyEventKind::Release {
            return;
        }
        let mut state = self.layout.lock().unwrap();
        if let Some(pane) = state.active_pane_mut() {
            pane.key_event(key);
        }
    }

    fn handle_mouse(&self, mouse: MouseEvent) {
        let mut state = self.layout.lock().unwrap();
        let (row, col) = (mouse.row, mouse.column);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let tab = match state.active_tab_mut() {
                    Some(tab) => tab,
                    None => return,
                };
                if let Some(entry) = tab.tree().and_then(|tree| tree.hit_test(row, col)) {
                    *self.drag_origin.lock().unwrap() = None;
                    if tab.set_active(Some(entry.pane)) {
                        self.render.request_render();
                    }
                } else {
                    // Pressed a divider cell: a drag may follow.
                    *self.drag_origin.lock().unwrap() = Some((row, col));
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let origin = match *self.drag_origin.lock().unwrap() {
                    Some(origin) => origin,
                    None => return,
                };
                let tab = match state.active_tab_mut() {
                    Some(tab) => tab,
                    None => return,
                };
                if tab.drag_divider(origin, (row, col)) {
                    self.render.request_render();
                }
                *self.drag_origin.lock().unwrap() = Some((row, col));
            }
            _ => {
                *self.drag_origin.lock().unwrap() = None;
            }
        }
    }

    fn handle_osc_8671(&self, message: &mut Osc8671, did_timeout: bool) -> bool {
        if message.kind == RequestType::Enter {
            let direction = match message.direction {
                Some(direction) => direction,
                None => return true,
            };
            let mut state = self.layout.lock().unwrap();
            let size = state.size();
            if let Some(tab) = state.active_tab_mut() {
                let start = message.range.map(|(s, _)| s.saturating_sub(1)).unwrap_or(0);
                let end = message.range.map(|(_, e)| e).unwrap_or(if direction.is_horizontal() {
                    size.rows as u32
                } else {
                    size.cols as u32
                });
                tab.navigate(
                    direction,
                    WrapMode::Allow,
                    None,
                    Some((start, end)),
                    SeamlessMode::Disabled,
                    true,
                );
                // The enter may have cleared the stale cursor; repaint.
                self.render.request_render();
            }
            return true;
        }

        if message.kind != RequestType::Navigate {
            return true;
        }
        let direction = match message.direction {
            Some(direction) => direction,
            None => return true,
        };

        let seamless = if did_timeout {
            SeamlessMode::Disabled
        } else {
            SeamlessMode::Enabled
        };
        let did_navigate = {
            let mut state = self.layout.lock().unwrap();
            match state.active_tab_mut() {
                None => Some(false),
                Some(tab) => {
                    let entry = tab
                        .active()
                        .and_then(|active| tab.tree().and_then(|tree| tree.find_pane(active)));
                    match entry {
                        None => Some(false),
                        Some(entry) => {
                            // The application reports its edge in its own
                            // cells, 1-indexed; clamp to the pane and shift
                            // into tree coordinates.
                            let range = message.range.map(|(start, end)| {
                                debug_assert!(start >= 1, "parse admits no zero range start");
                                let (base, limit) = if direction.is_horizontal() {
                                    (entry.row(), entry.rows())
                                } else {
                                    (entry.col(), entry.cols())
                                };
                                (
                                    base + start.saturating_sub(1).min(limit),
                                    base + end.min(limit),
                                )
                            });
                            tab.navigate(
                                direction,
                                message.wrap,
                                message.id.clone(),
                                range,
                                seamless,
                                false,
                            )
                        }
                    }
                }
            }
        };

        if did_navigate == Some(true) {
            self.render.request_render();
        }

        if let Some(completed) = did_navigate {
            if message.wrap == WrapMode::Disallow {
                // The requester insisted on a reply: acknowledge a completed
                // move, or pass the Navigate through so the next layer out
                // takes over.
                if completed {
                    message.kind = RequestType::Acknowledge;
                    message.range = None;
                }
                self.render
                    .push_event(RenderEvent::WriteString(message.serialize()));
                return true;
            }
        }
        did_navigate.is_some()
    }
}
