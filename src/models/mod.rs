pub mod game;
pub mod presence;
pub mod stats;

pub use game::{
    Board, Game, GameOutcome, GamePhase, GameStatus, GameView, Mark, BOARD_CELLS, MAX_PLAYERS,
};
pub use presence::UserPresence;
pub use stats::{MatchOutcome, PlayerStats};
