//! Docs engine callback statuses
//!
//! The engine reports document state to the track endpoint as a bare
//! integer. These types give every code a name and answer the questions the
//! callback coordinator asks of it.

use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// Status reported by the Docs engine on a track callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TrackStatus {
    /// A user opened the document for co-editing
    Editing,
    /// The last editor closed the document and it must be saved
    MustSave,
    /// Saving failed on the engine side; the payload is still delivered
    Corrupted,
    /// Every editor left without changes
    Closed,
    /// Out-of-band save while the document stays open
    Forcesave,
    /// Forcesave failed on the engine side; the payload is still delivered
    CorruptedForcesave,
}

impl TrackStatus {
    /// Numeric code used on the wire
    pub fn code(self) -> i64 {
        match self {
            Self::Editing => 1,
            Self::MustSave => 2,
            Self::Corrupted => 3,
            Self::Closed => 4,
            Self::Forcesave => 6,
            Self::CorruptedForcesave => 7,
        }
    }

    /// Whether this status runs the save flow
    pub fn triggers_save(self) -> bool {
        matches!(
            self,
            Self::MustSave | Self::Corrupted | Self::Forcesave | Self::CorruptedForcesave
        )
    }

    pub fn is_forcesave(self) -> bool {
        matches!(self, Self::Forcesave | Self::CorruptedForcesave)
    }

    /// Lock state the file must be left in once this status is processed
    pub fn leaves_locked(self) -> bool {
        matches!(
            self,
            Self::Editing | Self::Forcesave | Self::CorruptedForcesave
        )
    }
}

impl TryFrom<i64> for TrackStatus {
    type Error = SharedError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Editing),
            2 => Ok(Self::MustSave),
            3 => Ok(Self::Corrupted),
            4 => Ok(Self::Closed),
            6 => Ok(Self::Forcesave),
            7 => Ok(Self::CorruptedForcesave),
            other => Err(SharedError::protocol(format!(
                "unknown callback status {}",
                other
            ))),
        }
    }
}

impl From<TrackStatus> for i64 {
    fn from(status: TrackStatus) -> Self {
        status.code()
    }
}

/// What initiated a forcesave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcesaveType {
    /// Requested through the command service
    Command,
    /// The user pressed the Save button
    Button,
    /// Periodic autosave timer
    Timer,
    /// Form submission
    Submit,
}

impl ForcesaveType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Command),
            1 => Some(Self::Button),
            2 => Some(Self::Timer),
            3 => Some(Self::Submit),
            _ => None,
        }
    }
}
