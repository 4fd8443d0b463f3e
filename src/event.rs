use crossterm::event::{KeyEvent, MouseEvent};

use crate::protocol::Osc8671;

/// An OSC 52 clipboard escape, carried opaquely: the core only routes it to
/// the render thread for passthrough.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Osc52 {
    /// Selection parameter, e.g. `c` for clipboard or `p` for primary.
    pub selection: String,
    /// Base64 payload (or `?` for a query).
    pub payload: String,
}

/// A typed input event produced by the terminal-input parser.
///
/// The inert variants are protocol replies the host terminal sends in
/// response to queries; the core acknowledges them structurally so they
/// don't reach any pane, but takes no action.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Focus { gained: bool },
    Paste(String),
    Osc52(Osc52),
    Osc8671(Osc8671),
    PrimaryDeviceAttributes,
    ModeQueryReply,
    CursorPositionReport,
    KeyboardReport,
    StatusResponse,
    TerminfoString,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Insert,
    Normal,
}

/// Clipboard passthrough request for the render thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipboardRequest {
    pub osc52: Osc52,
    /// Whether the host terminal expects a reply to be forwarded back.
    pub reply: bool,
}

/// Events the core pushes onto the render thread's inbound queue.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderEvent {
    /// Write raw bytes to the outbound terminal sink.
    WriteString(String),
    RequestRender,
    InputStatus { mode: InputMode },
    Clipboard(ClipboardRequest),
    Exit,
}
