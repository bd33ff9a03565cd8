//! Client-side session: turns pointer input into outbound [`BoardEvent`]s and
//! applies inbound events to the rendering collaborator.
//!
//! Strokes are never drawn optimistically. The relay echoes every event back
//! to its sender, so local and remote strokes both reach the canvas through
//! [`BoardSession::handle_event`].

use crate::history::History;
use crate::wire::ValidationError;
use crate::{BoardEvent, Snapshot, StrokePoint, StrokeSegment};

pub const DEFAULT_PEN_COLOR: &str = "red";
pub const DEFAULT_ERASER_COLOR: &str = "white";
pub const DEFAULT_PEN_WIDTH: f32 = 3.0;
pub const DEFAULT_ERASER_WIDTH: f32 = 10.0;

/// Drawing surface capabilities the session relies on.
pub trait Canvas {
    fn begin_path_at(&mut self, point: StrokePoint);
    fn line_to(&mut self, segment: &StrokeSegment);
    fn capture_snapshot(&self) -> Snapshot;
    fn render_snapshot(&mut self, snapshot: &Snapshot);
    fn clear(&mut self);
    /// Whether everything received so far is on the raster. A canvas that
    /// decodes snapshots asynchronously reports `false` while one is pending.
    fn is_settled(&self) -> bool;
}

/// Outbound half of the connection to the relay.
pub trait EventSink {
    fn send(&self, event: &BoardEvent);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToolMode {
    #[default]
    Pen,
    Eraser,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolState {
    pub mode: ToolMode,
    pub pen_color: String,
    pub pen_width: f32,
    pub eraser_color: String,
    pub eraser_width: f32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            mode: ToolMode::Pen,
            pen_color: DEFAULT_PEN_COLOR.to_string(),
            pen_width: DEFAULT_PEN_WIDTH,
            eraser_color: DEFAULT_ERASER_COLOR.to_string(),
            eraser_width: DEFAULT_ERASER_WIDTH,
        }
    }
}

impl ToolState {
    pub fn toggle_eraser(&mut self) -> ToolMode {
        self.mode = match self.mode {
            ToolMode::Pen => ToolMode::Eraser,
            ToolMode::Eraser => ToolMode::Pen,
        };
        self.mode
    }

    pub fn segment_to(&self, point: StrokePoint) -> StrokeSegment {
        let (color, width) = match self.mode {
            ToolMode::Pen => (&self.pen_color, self.pen_width),
            ToolMode::Eraser => (&self.eraser_color, self.eraser_width),
        };
        StrokeSegment {
            x: point.x,
            y: point.y,
            color: color.clone(),
            width,
        }
    }
}

pub struct BoardSession {
    history: History,
    tool: ToolState,
    drawing: bool,
    edit_pending: bool,
}

impl BoardSession {
    /// Clears the canvas and records it as the blank history floor.
    pub fn new(canvas: &mut impl Canvas) -> Self {
        canvas.clear();
        Self {
            history: History::new(canvas.capture_snapshot()),
            tool: ToolState::default(),
            drawing: false,
            edit_pending: false,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tool(&self) -> &ToolState {
        &self.tool
    }

    pub fn tool_mut(&mut self) -> &mut ToolState {
        &mut self.tool
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn pointer_down(&mut self, point: StrokePoint, sink: &impl EventSink) {
        self.drawing = true;
        sink.send(&BoardEvent::BeginPath(point));
    }

    pub fn pointer_move(&mut self, point: StrokePoint, sink: &impl EventSink) {
        if !self.drawing {
            return;
        }
        sink.send(&BoardEvent::DrawStroke(self.tool.segment_to(point)));
    }

    pub fn has_pending_edit(&self) -> bool {
        self.edit_pending
    }

    /// Ends the stroke and records the canvas as a new history entry.
    /// Returns whether a snapshot was added. If the canvas has not settled,
    /// the edit is postponed until [`BoardSession::settle`].
    pub fn pointer_up(&mut self, canvas: &impl Canvas) -> bool {
        if !std::mem::replace(&mut self.drawing, false) {
            return false;
        }
        self.edit_pending = true;
        self.settle(canvas)
    }

    /// Records a postponed edit once the canvas has caught up with every
    /// received event. Returns whether a snapshot was added.
    pub fn settle(&mut self, canvas: &impl Canvas) -> bool {
        if !self.edit_pending || !canvas.is_settled() {
            return false;
        }
        self.edit_pending = false;
        self.history.commit(canvas.capture_snapshot())
    }

    pub fn undo(&mut self, canvas: &mut impl Canvas, sink: &impl EventSink) -> bool {
        let Some(sync) = self.history.undo() else {
            return false;
        };
        sink.send(&BoardEvent::RedoUndo(sync));
        canvas.render_snapshot(self.history.current());
        true
    }

    pub fn redo(&mut self, canvas: &mut impl Canvas, sink: &impl EventSink) -> bool {
        let Some(sync) = self.history.redo() else {
            return false;
        };
        sink.send(&BoardEvent::RedoUndo(sync));
        canvas.render_snapshot(self.history.current());
        true
    }

    /// Applies an event received from the relay, including echoes of this
    /// session's own events. A history sync that fails validation is skipped
    /// and the current frame stays on screen.
    pub fn handle_event(
        &mut self,
        event: BoardEvent,
        canvas: &mut impl Canvas,
    ) -> Result<(), ValidationError> {
        match event {
            BoardEvent::BeginPath(point) => {
                point.validate()?;
                canvas.begin_path_at(point);
            }
            BoardEvent::DrawStroke(segment) => {
                segment.validate()?;
                canvas.line_to(&segment);
            }
            BoardEvent::RedoUndo(sync) => {
                let snapshot = self.history.apply_sync(sync)?;
                canvas.render_snapshot(snapshot);
            }
        }
        Ok(())
    }
}
