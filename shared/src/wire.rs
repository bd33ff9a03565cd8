//! Frame codec for [`BoardEvent`]s and the checks applied to every inbound
//! frame before it is acted upon or fanned out.
//!
//! Text frames carry JSON, binary frames carry bincode (standard config).

use thiserror::Error;

use crate::{BoardEvent, HistorySync, StrokePoint, StrokeSegment};

pub const MAX_COLOR_LEN: usize = 32;
pub const MAX_STROKE_WIDTH: f32 = 256.0;
pub const MAX_HISTORY_LEN: usize = 512;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("coordinate is not finite")]
    NonFiniteCoordinate,
    #[error("stroke color is empty")]
    EmptyColor,
    #[error("stroke color is {0} bytes, over the length limit")]
    ColorTooLong(usize),
    #[error("stroke width {0} is not a positive size within the limit")]
    InvalidWidth(f32),
    #[error("history stack is empty")]
    EmptyHistory,
    #[error("history stack holds {0} snapshots, over the length limit")]
    HistoryTooLong(usize),
    #[error("cursor {track} outside history of {len} snapshots")]
    CursorOutOfRange { track: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed json frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed binary frame: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("{0} trailing bytes after binary frame")]
    TrailingBytes(usize),
    #[error("rejected {kind} event: {source}")]
    Invalid {
        kind: &'static str,
        source: ValidationError,
    },
}

impl StrokePoint {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate);
        }
        Ok(())
    }
}

impl StrokeSegment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.point().validate()?;
        if self.color.is_empty() {
            return Err(ValidationError::EmptyColor);
        }
        if self.color.len() > MAX_COLOR_LEN {
            return Err(ValidationError::ColorTooLong(self.color.len()));
        }
        if !self.width.is_finite() || self.width <= 0.0 || self.width > MAX_STROKE_WIDTH {
            return Err(ValidationError::InvalidWidth(self.width));
        }
        Ok(())
    }
}

impl HistorySync {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.stack.len();
        if len == 0 {
            return Err(ValidationError::EmptyHistory);
        }
        if len > MAX_HISTORY_LEN {
            return Err(ValidationError::HistoryTooLong(len));
        }
        if self.track >= len {
            return Err(ValidationError::CursorOutOfRange {
                track: self.track,
                len,
            });
        }
        Ok(())
    }
}

impl BoardEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            BoardEvent::BeginPath(point) => point.validate(),
            BoardEvent::DrawStroke(segment) => segment.validate(),
            BoardEvent::RedoUndo(sync) => sync.validate(),
        }
    }
}

fn checked(event: BoardEvent) -> Result<BoardEvent, WireError> {
    event.validate().map_err(|source| WireError::Invalid {
        kind: event.kind(),
        source,
    })?;
    Ok(event)
}

pub fn encode_binary(event: &BoardEvent) -> Result<Vec<u8>, WireError> {
    Ok(bincode::encode_to_vec(event, bincode::config::standard())?)
}

pub fn encode_text(event: &BoardEvent) -> Result<String, WireError> {
    Ok(serde_json::to_string(event)?)
}

pub fn decode_binary(payload: &[u8]) -> Result<BoardEvent, WireError> {
    let (event, read) =
        bincode::decode_from_slice::<BoardEvent, _>(payload, bincode::config::standard())?;
    if read != payload.len() {
        return Err(WireError::TrailingBytes(payload.len() - read));
    }
    checked(event)
}

pub fn decode_text(payload: &str) -> Result<BoardEvent, WireError> {
    checked(serde_json::from_str::<BoardEvent>(payload)?)
}
