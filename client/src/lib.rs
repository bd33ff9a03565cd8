mod app;
mod dom;
mod net;
mod render;
mod state;
mod ws;

pub use app::run;
