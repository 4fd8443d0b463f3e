//! OSC 8671: the seamless pane-navigation escape sequence.
//!
//! A custom OSC exchanged between an outer terminal multiplexer and the
//! applications running inside its panes (editors, nested multiplexers), so a
//! single set of key bindings can move focus across both layers. The payload
//! between the `ESC ] 8671 ;` prefix and the `ESC \` terminator is one or two
//! `;`-separated segments: a `:`-separated `key=value` list, optionally
//! followed by a bare direction token.

/// Navigation direction. Up/Down move along the row axis, Left/Right along
/// the column axis; the perpendicular axis is rows for Left/Right and columns
/// for Up/Down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigateDirection {
    Left,
    Right,
    Up,
    Down,
}

impl NavigateDirection {
    pub fn is_horizontal(self) -> bool {
        matches!(self, NavigateDirection::Left | NavigateDirection::Right)
    }

    pub fn as_token(self) -> &'static str {
        match self {
            NavigateDirection::Left => "left",
            NavigateDirection::Right => "right",
            NavigateDirection::Up => "up",
            NavigateDirection::Down => "down",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "left" => Some(NavigateDirection::Left),
            "right" => Some(NavigateDirection::Right),
            "up" => Some(NavigateDirection::Up),
            "down" => Some(NavigateDirection::Down),
            _ => None,
        }
    }
}

/// Whether the requester permits wrap-around. `Allow` means the receiver
/// should treat itself as the only visible surface and no reply is needed;
/// `Disallow` makes a reply mandatory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    Allow,
    #[default]
    Disallow,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RequestType {
    #[default]
    Supported,
    Register,
    Unregister,
    Navigate,
    Acknowledge,
    Enter,
}

impl RequestType {
    pub fn as_token(self) -> &'static str {
        match self {
            RequestType::Supported => "supported",
            RequestType::Register => "register",
            RequestType::Unregister => "unregister",
            RequestType::Navigate => "navigate",
            RequestType::Acknowledge => "acknowledge",
            RequestType::Enter => "enter",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "supported" => Some(RequestType::Supported),
            "register" => Some(RequestType::Register),
            "unregister" => Some(RequestType::Unregister),
            "navigate" => Some(RequestType::Navigate),
            "acknowledge" => Some(RequestType::Acknowledge),
            "enter" => Some(RequestType::Enter),
            _ => None,
        }
    }
}

/// A parsed OSC 8671 payload.
///
/// `range` is 1-indexed and inclusive on the direction's perpendicular axis.
/// `id` is an opaque correlation token of at most [`Osc8671::MAX_ID_BYTES`]
/// bytes, preserved verbatim in replies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Osc8671 {
    pub kind: RequestType,
    pub direction: Option<NavigateDirection>,
    pub id: Option<String>,
    pub range: Option<(u32, u32)>,
    pub wrap: WrapMode,
    pub hide_cursor_on_enter: bool,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_range(value: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 2 {
        return None;
    }
    let number = |s: &str| -> Option<u32> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    };
    let start = number(parts[0])?;
    let end = number(parts[1])?;
    if start < 1 || end < 1 || end < start {
        return None;
    }
    Some((start, end))
}

impl Osc8671 {
    pub const MAX_ID_BYTES: usize = 36;

    /// Parse a payload (the text between the OSC framing bytes). Returns
    /// `None` on any malformed input; there are no partial results.
    pub fn parse(payload: &str) -> Option<Self> {
        if payload.is_empty() {
            return None;
        }

        let segments: Vec<&str> = payload.split(';').collect();
        if segments.len() > 2 {
            return None;
        }

        let mut kind = None;
        let mut id = None;
        let mut wrap = None;
        let mut range = None;
        let mut hide_cursor_on_enter = None;
        for field in segments[0].split(':') {
            let equal = field.find('=')?;
            let (key, value) = (&field[..equal], &field[equal + 1..]);
            match key {
                "w" => {
                    wrap = Some(match parse_bool(value)? {
                        true => WrapMode::Allow,
                        false => WrapMode::Disallow,
                    });
                }
                "h" => hide_cursor_on_enter = Some(parse_bool(value)?),
                "t" => kind = Some(RequestType::from_token(value)?),
                "id" => {
                    if value.len() > Self::MAX_ID_BYTES {
                        return None;
                    }
                    id = Some(value.to_string());
                }
                "r" => range = Some(parse_range(value)?),
                _ => return None,
            }
        }

        let kind = kind?;
        // Field-combination rules: a range only accompanies Enter/Navigate,
        // the cursor-hiding flag only Register, wrap only Navigate/Acknowledge.
        if range.is_some() && !matches!(kind, RequestType::Enter | RequestType::Navigate) {
            return None;
        }
        if hide_cursor_on_enter.is_some() && kind != RequestType::Register {
            return None;
        }
        if wrap.is_some() && !matches!(kind, RequestType::Navigate | RequestType::Acknowledge) {
            return None;
        }

        let direction = if matches!(
            kind,
            RequestType::Navigate | RequestType::Acknowledge | RequestType::Enter
        ) {
            Some(NavigateDirection::from_token(segments.get(1).copied()?)?)
        } else {
            if segments.len() > 1 {
                return None;
            }
            None
        };

        Some(Osc8671 {
            kind,
            direction,
            id,
            range,
            wrap: wrap.unwrap_or_default(),
            hide_cursor_on_enter: hide_cursor_on_enter.unwrap_or(false),
        })
    }

    /// Serialize with framing. Field order is canonical: `t`, `w` (only when
    /// Allow), `h` (only when set), `id`, `r`, then the direction segment.
    /// Default-valued fields are omitted, so `w=false` does not round-trip.
    pub fn serialize(&self) -> String {
        let mut result = format!("\x1b]8671;t={}", self.kind.as_token());
        if self.wrap == WrapMode::Allow {
            result.push_str(":w=true");
        }
        if self.hide_cursor_on_enter {
            result.push_str(":h=true");
        }
        if let Some(id) = &self.id {
            result.push_str(":id=");
            result.push_str(id);
        }
        if let Some((start, end)) = self.range {
            result.push_str(&format!(":r={},{}", start, end));
        }
        if let Some(direction) = self.direction {
            result.push(';');
            result.push_str(direction.as_token());
        }
        result.push_str("\x1b\\");
        result
    }
}
