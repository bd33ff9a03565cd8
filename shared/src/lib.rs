use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub mod agent;
pub mod history;
pub mod sequence;
pub mod wire;

/// A cursor position in canvas pixel space.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
}

impl StrokePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One line segment from the current path position to `(x, y)`.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct StrokeSegment {
    pub x: f32,
    pub y: f32,
    pub color: String,
    pub width: f32,
}

impl StrokeSegment {
    pub fn point(&self) -> StrokePoint {
        StrokePoint::new(self.x, self.y)
    }
}

/// Opaque full-frame encoding of the canvas raster. The browser client uses
/// PNG data URLs.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct Snapshot(String);

impl Snapshot {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Cursor plus the whole snapshot stack, replicated on every undo/redo.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct HistorySync {
    #[serde(rename = "trackValue")]
    pub track: usize,
    #[serde(rename = "undoRedoTracker")]
    pub stack: Vec<Snapshot>,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum BoardEvent {
    #[serde(rename = "beginPath")]
    BeginPath(StrokePoint),
    #[serde(rename = "drawStroke")]
    DrawStroke(StrokeSegment),
    #[serde(rename = "redoUndo")]
    RedoUndo(HistorySync),
}

impl BoardEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            BoardEvent::BeginPath(_) => "beginPath",
            BoardEvent::DrawStroke(_) => "drawStroke",
            BoardEvent::RedoUndo(_) => "redoUndo",
        }
    }
}
