use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;

use crate::protocol::StreamError;

/// What a mode does to the file it opens, keyed by the leading mode character.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ModeKind {
    /// `r`: open an existing file at the start.
    Read,
    /// `w`: create or truncate.
    Write,
    /// `a`: create, every write goes to the end.
    Append,
    /// `x`: create, fail when the file already exists.
    Exclusive,
    /// `c`: create, keep existing contents.
    Create,
}

impl ModeKind {
    fn as_char(self) -> char {
        match self {
            ModeKind::Read => 'r',
            ModeKind::Write => 'w',
            ModeKind::Append => 'a',
            ModeKind::Exclusive => 'x',
            ModeKind::Create => 'c',
        }
    }
}

/// An fopen style mode string such as `r`, `w+` or `rb+`.
///
/// The `b` and `t` flags are accepted and kept for display; they do not change
/// how the file is opened.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OpenMode {
    kind: ModeKind,
    update: bool,
    flag: Option<char>,
}

impl OpenMode {
    pub const READ: OpenMode = OpenMode { kind: ModeKind::Read, update: false, flag: None };
    pub const READ_WRITE: OpenMode = OpenMode { kind: ModeKind::Read, update: true, flag: None };
    pub const WRITE_READ: OpenMode = OpenMode { kind: ModeKind::Write, update: true, flag: None };

    pub fn new(kind: ModeKind, update: bool) -> Self {
        Self { kind, update, flag: None }
    }

    pub fn kind(&self) -> ModeKind {
        self.kind
    }

    pub fn is_readable(&self) -> bool {
        self.kind == ModeKind::Read || self.update
    }

    pub fn is_writable(&self) -> bool {
        self.kind != ModeKind::Read || self.update
    }

    /// The `OpenOptions` matching this mode.
    pub fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.is_readable());

        match self.kind {
            ModeKind::Read => {
                options.write(self.update);
            }
            ModeKind::Write => {
                options.write(true).create(true).truncate(true);
            }
            ModeKind::Append => {
                options.append(true).create(true);
            }
            ModeKind::Exclusive => {
                options.write(true).create_new(true);
            }
            ModeKind::Create => {
                options.write(true).create(true);
            }
        }

        options
    }
}

impl FromStr for OpenMode {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StreamError::invalid_resource(format!("unknown open mode {s:?}"));

        let mut chars = s.chars();
        let kind = match chars.next() {
            Some('r') => ModeKind::Read,
            Some('w') => ModeKind::Write,
            Some('a') => ModeKind::Append,
            Some('x') => ModeKind::Exclusive,
            Some('c') => ModeKind::Create,
            _ => return Err(invalid()),
        };

        let mut mode = OpenMode::new(kind, false);
        for c in chars {
            match c {
                '+' if !mode.update => mode.update = true,
                'b' | 't' if mode.flag.is_none() => mode.flag = Some(c),
                _ => return Err(invalid()),
            }
        }

        Ok(mode)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_char())?;
        if let Some(flag) = self.flag {
            write!(f, "{flag}")?;
        }
        if self.update {
            f.write_str("+")?;
        }
        Ok(())
    }
}
