pub(crate) mod cable;
pub(crate) mod capabilities;
pub(crate) mod trace;
