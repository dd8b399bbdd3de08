use lazyrange::Direction;

/// Modifier keys held during a click or key press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::NONE
        }
    }

    /// Whether the platform's toggle modifier is held (Command on macOS, Control elsewhere).
    pub fn is_toggle(self, platform: Platform) -> bool {
        match platform {
            Platform::MacOs => self.meta,
            Platform::Other => self.ctrl,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Platform {
    MacOs,
    Other,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }
}

/// Selection operation a click maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickAction {
    Select,
    Append,
    Range,
}

impl ClickAction {
    /// Shift wins over the toggle modifier.
    pub fn from_click(modifiers: Modifiers, platform: Platform) -> Self {
        if modifiers.shift {
            Self::Range
        } else if modifiers.is_toggle(platform) {
            Self::Append
        } else {
            Self::Select
        }
    }
}

/// Keys a list view reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Move { direction: Direction, extend: bool },
    /// Open the anchor item.
    Enter,
    Ignore,
}

impl KeyAction {
    pub fn from_key(key: Key, modifiers: Modifiers) -> Self {
        let direction = match key {
            Key::ArrowUp => Direction::Up,
            Key::ArrowDown => Direction::Down,
            Key::ArrowLeft => Direction::Left,
            Key::ArrowRight => Direction::Right,
            Key::Enter => return Self::Enter,
            Key::Other => return Self::Ignore,
        };
        Self::Move {
            direction,
            extend: modifiers.shift,
        }
    }
}
