use gallery::NavCommand;

/// Modifier keys held during a pointer or key event.
///
/// `ctrl` is the platform's primary modifier (Command on macOS).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
    };
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
    };

    pub const fn new(shift: bool, ctrl: bool) -> Self {
        Self { shift, ctrl }
    }

    pub fn any(self) -> bool {
        self.shift || self.ctrl
    }
}

/// Item width change of one zoom step: fine with shift, coarse with ctrl, very coarse with both.
pub fn zoom_increment(modifiers: Modifiers) -> u32 {
    match (modifiers.shift, modifiers.ctrl) {
        (true, false) => 1,
        (false, true) => 10,
        (true, true) => 50,
        (false, false) => 5,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

/// Keys the gallery reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
}

impl Key {
    pub fn nav_command(self) -> Option<NavCommand> {
        Some(match self {
            Self::Left => NavCommand::Left,
            Self::Right => NavCommand::Right,
            Self::Up => NavCommand::Up,
            Self::Down => NavCommand::Down,
            Self::PageUp => NavCommand::PageUp,
            Self::PageDown => NavCommand::PageDown,
            Self::Home => NavCommand::Home,
            Self::End => NavCommand::End,
            Self::Enter => return None,
        })
    }
}
