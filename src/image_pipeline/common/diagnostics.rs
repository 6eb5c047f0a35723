//! Non-fatal conditions reported while developing an image.
//!
//! Stages that substitute a documented default for bad or missing input push
//! a [`Diagnostic`] here instead of failing. Every push is also emitted as a
//! `warn!` event so a log reader sees it without inspecting the report.

use std::fmt;

use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Orientation metadata held something other than 1..=8; identity was used.
    InvalidOrientationCode { code: Option<i64> },
    /// No usable colour profile; the identity matrix was used.
    NeutralColorMatrix { camera: Option<String> },
    /// The encoder cannot write the requested depth and wrote 8 bits instead.
    EncoderDepthReduced { requested: u32, written: u32 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InvalidOrientationCode { code: Some(code) } => {
                write!(f, "orientation code {code} is not in 1..=8, using identity")
            }
            Diagnostic::InvalidOrientationCode { code: None } => {
                write!(f, "orientation value is not an integer, using identity")
            }
            Diagnostic::NeutralColorMatrix { camera: Some(camera) } => {
                write!(f, "no colour profile for camera {camera:?}, using identity matrix")
            }
            Diagnostic::NeutralColorMatrix { camera: None } => {
                write!(f, "camera unknown, using identity colour matrix")
            }
            Diagnostic::EncoderDepthReduced { requested, written } => {
                write!(f, "encoder wrote {written}-bit samples instead of {requested}-bit")
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, predicate: impl Fn(&Diagnostic) -> bool) -> bool {
        self.entries.iter().any(predicate)
    }
}
