mod cable;
mod capabilities;
mod error;
mod render;
mod tool_router;
mod trace;

pub(super) use tool_router::build_tool_router;
