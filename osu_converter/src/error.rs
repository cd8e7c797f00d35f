use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertErrorKind {
    NotManiaMode,
    UnsupportedLaneCount,
    MissingLaneCount,
    Io,
    InvalidLaneCount,
}

impl ConvertErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Parse
            "E1001" => Self::NotManiaMode,
            "E1002" => Self::UnsupportedLaneCount,
            "E1003" => Self::MissingLaneCount,

            // IO
            "E2001" => Self::Io,

            // Build
            "E3001" => Self::InvalidLaneCount,

            _ => Self::Io,
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message} (line {line})")]
pub struct ConvertError {
    pub code: &'static str,
    pub kind: ConvertErrorKind,
    pub message: String,
    pub line: usize,

    pub file: Option<String>,
}

impl ConvertError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            kind: ConvertErrorKind::from_code(code),
            message: message.into(),
            line,
            file: None,
        }
    }

    pub(crate) fn not_mania_mode(mode: &str, line: usize) -> Self {
        Self::new("E1001", format!("not a mania chart (Mode: {mode})"), line)
    }

    pub(crate) fn unsupported_lane_count(value: &str, line: usize) -> Self {
        Self::new(
            "E1002",
            format!("only 4K, 5K and 6K charts are supported (CircleSize: {value})"),
            line,
        )
    }

    pub(crate) fn missing_lane_count(line: usize) -> Self {
        Self::new("E1003", "lane count (CircleSize) is not declared", line)
    }

    pub(crate) fn invalid_lane_count(lane_count: u8) -> Self {
        Self::new("E3001", format!("invalid source lane count: {lane_count}"), 0)
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}
