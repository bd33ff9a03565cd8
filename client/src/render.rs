use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use chalkline_shared::agent::Canvas;
use chalkline_shared::sequence::{RenderQueue, RenderTicket};
use chalkline_shared::{Snapshot, StrokePoint, StrokeSegment};

enum PathOp {
    Begin(StrokePoint),
    Line(StrokeSegment),
}

struct PendingImage {
    image: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

impl PendingImage {
    fn detach(&self) {
        self.image.set_onload(None);
        self.image.set_onerror(None);
    }
}

/// 2D canvas backend for the board session. Snapshots are PNG data URLs;
/// decoding one is asynchronous, so path operations arriving meanwhile are
/// queued behind it.
pub struct BrowserCanvas {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    queue: Rc<RenderQueue<PathOp>>,
    pending_image: RefCell<Option<PendingImage>>,
    on_settled: Rc<RefCell<Option<Box<dyn Fn()>>>>,
}

impl BrowserCanvas {
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        Self {
            canvas,
            ctx,
            queue: Rc::new(RenderQueue::new()),
            pending_image: RefCell::new(None),
            on_settled: Rc::new(RefCell::new(None)),
        }
    }

    /// Called after an asynchronous snapshot decode has been drawn and the
    /// operations held behind it replayed.
    pub fn set_on_settled(&self, callback: impl Fn() + 'static) {
        *self.on_settled.borrow_mut() = Some(Box::new(callback));
    }

    fn apply(&self, op: PathOp) {
        if let Some(op) = self.queue.defer(op) {
            apply_op(&self.ctx, &op);
        }
    }

    fn start_decode(&self, snapshot: &Snapshot, ticket: RenderTicket) -> Result<(), JsValue> {
        let image = HtmlImageElement::new()?;

        let onload = {
            let ctx = self.ctx.clone();
            let canvas = self.canvas.clone();
            let queue = self.queue.clone();
            let on_settled = self.on_settled.clone();
            let image = image.clone();
            Closure::<dyn FnMut()>::new(move || {
                let Some(ops) = queue.finish(ticket) else {
                    return;
                };
                let width = canvas.width() as f64;
                let height = canvas.height() as f64;
                ctx.clear_rect(0.0, 0.0, width, height);
                if let Err(error) = ctx
                    .draw_image_with_html_image_element_and_dw_and_dh(&image, 0.0, 0.0, width, height)
                {
                    web_sys::console::error_2(&"Snapshot draw failed".into(), &error);
                }
                for op in &ops {
                    apply_op(&ctx, op);
                }
                notify_settled(&on_settled);
            })
        };

        let onerror = {
            let ctx = self.ctx.clone();
            let queue = self.queue.clone();
            let on_settled = self.on_settled.clone();
            Closure::<dyn FnMut()>::new(move || {
                let Some(ops) = queue.finish(ticket) else {
                    return;
                };
                web_sys::console::warn_1(&"Snapshot decode failed, keeping current frame".into());
                for op in &ops {
                    apply_op(&ctx, op);
                }
                notify_settled(&on_settled);
            })
        };

        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        image.set_src(snapshot.as_str());

        let previous = self.pending_image.replace(Some(PendingImage {
            image,
            _onload: onload,
            _onerror: onerror,
        }));
        if let Some(previous) = previous {
            previous.detach();
        }
        Ok(())
    }
}

fn notify_settled(on_settled: &RefCell<Option<Box<dyn Fn()>>>) {
    if let Some(callback) = on_settled.borrow().as_ref() {
        callback();
    }
}

fn apply_op(ctx: &CanvasRenderingContext2d, op: &PathOp) {
    match op {
        PathOp::Begin(point) => {
            ctx.begin_path();
            ctx.move_to(point.x as f64, point.y as f64);
        }
        PathOp::Line(segment) => {
            ctx.set_stroke_style_str(&segment.color);
            ctx.set_line_width(segment.width as f64);
            ctx.line_to(segment.x as f64, segment.y as f64);
            ctx.stroke();
        }
    }
}

impl Canvas for BrowserCanvas {
    fn begin_path_at(&mut self, point: StrokePoint) {
        self.apply(PathOp::Begin(point));
    }

    fn line_to(&mut self, segment: &StrokeSegment) {
        self.apply(PathOp::Line(segment.clone()));
    }

    fn capture_snapshot(&self) -> Snapshot {
        match self.canvas.to_data_url() {
            Ok(url) => Snapshot::new(url),
            Err(error) => {
                web_sys::console::error_2(&"Canvas capture failed".into(), &error);
                Snapshot::new(String::new())
            }
        }
    }

    fn render_snapshot(&mut self, snapshot: &Snapshot) {
        let ticket = self.queue.begin();
        if let Err(error) = self.start_decode(snapshot, ticket) {
            web_sys::console::error_2(&"Snapshot decode could not start".into(), &error);
            if let Some(ops) = self.queue.finish(ticket) {
                for op in &ops {
                    apply_op(&self.ctx, op);
                }
            }
        }
    }

    fn clear(&mut self) {
        let width = self.canvas.width() as f64;
        let height = self.canvas.height() as f64;
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn is_settled(&self) -> bool {
        !self.queue.is_pending()
    }
}
