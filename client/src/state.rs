use chalkline_shared::agent::BoardSession;

use crate::render::BrowserCanvas;

/// Everything one browser tab owns: its history session and its canvas.
/// Handlers borrow both at once through [`State::split`].
pub struct State {
    pub session: BoardSession,
    pub canvas: BrowserCanvas,
}

impl State {
    pub fn new(mut canvas: BrowserCanvas) -> Self {
        let session = BoardSession::new(&mut canvas);
        Self { session, canvas }
    }

    pub fn split(&mut self) -> (&mut BoardSession, &mut BrowserCanvas) {
        (&mut self.session, &mut self.canvas)
    }
}
