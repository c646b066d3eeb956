use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uguid::Guid;

use crate::{stacktrace::StackFrameInformation, symbols::DebugMeta, Result};

/// Output formats of [`StackTraceInformation::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TraceFormat {
    /// The .NET `Exception.StackTrace` layout, one `   at ...` line per named frame
    #[default]
    Default,
    /// Indented JSON of the whole trace, debug metas included
    Json,
}

/// A captured stack trace and the debug metadata needed to symbolicate it.
///
/// Frames are innermost first. `debug_metas` holds one entry per module that still has frames
/// without source lines; modules whose frames are already resolved are left out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceInformation {
    /// Frames in call stack order
    #[serde(rename = "stackFrameInformation")]
    pub frames: Vec<StackFrameInformation>,
    /// Debug metadata by module id
    pub debug_metas: BTreeMap<Guid, DebugMeta>,
}

impl StackTraceInformation {
    /// A trace without frames.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a trace from captured frames and debug metas.
    #[must_use]
    pub fn new(frames: Vec<StackFrameInformation>, debug_metas: BTreeMap<Guid, DebugMeta>) -> Self {
        StackTraceInformation { frames, debug_metas }
    }

    /// Appends a frame, registering `debug_meta` if the frame still needs symbols.
    ///
    /// The first meta registered for a module id wins.
    pub fn push(&mut self, frame: StackFrameInformation, debug_meta: Option<&DebugMeta>) {
        if frame.needs_symbols() {
            if let Some(meta) = debug_meta {
                self.debug_metas
                    .entry(meta.module_id)
                    .or_insert_with(|| meta.clone());
            }
        }

        self.frames.push(frame);
    }

    /// Drops the debug metas of modules that have no frames left without source lines.
    pub fn prune_debug_metas(&mut self) {
        let frames = &self.frames;
        self.debug_metas.retain(|mvid, _| {
            frames
                .iter()
                .any(|frame| frame.mvid == Some(*mvid) && frame.needs_symbols())
        });
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the trace has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frames belonging to module `mvid`.
    pub fn frames_of(&self, mvid: Guid) -> impl Iterator<Item = &StackFrameInformation> {
        self.frames
            .iter()
            .filter(move |frame| frame.mvid == Some(mvid))
    }

    /// Renders the trace.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if JSON serialization fails.
    pub fn render(&self, format: TraceFormat) -> Result<String> {
        match format {
            TraceFormat::Default => Ok(self.to_string()),
            TraceFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    /// Parses the JSON form produced by [`TraceFormat::Json`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if `json` is not a serialized trace.
    pub fn from_json(json: &str) -> Result<StackTraceInformation> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for StackTraceInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.frames.iter().filter(|frame| frame.method.is_some()) {
            frame.write_line(f)?;
            writeln!(f)?;
        }

        Ok(())
    }
}
