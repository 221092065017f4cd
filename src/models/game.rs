use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of players in one game session
pub const MAX_PLAYERS: usize = 2;
/// Number of cells on the 3x3 board
pub const BOARD_CELLS: usize = 9;

/// A player's symbol. The creator is always `X` and moves first;
/// the second player to join is always `O`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

/// The 3x3 board, row-major. A cell is `None` until a player marks it,
/// and a marked cell never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board([Option<Mark>; BOARD_CELLS]);

impl Default for Board {
    fn default() -> Self {
        Board([None; BOARD_CELLS])
    }
}

impl Board {
    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.0.get(index).copied().flatten()
    }

    /// Mark a cell. Callers must have validated the index and that
    /// the cell is empty.
    pub fn place(&mut self, index: usize, mark: Mark) {
        if let Some(cell) = self.0.get_mut(index) {
            *cell = Some(mark);
        }
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(|cell| cell.is_some())
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    /// The named player owns a winning line, or won by forfeit.
    Winner(String),
    /// All nine cells filled with no winning line.
    Draw,
}

/// Lifecycle phase of a game. The payload carried by each variant makes
/// illegal combinations unrepresentable: only an active game has a
/// current player, only a finished game has an outcome. Transitions are
/// monotonic: waiting -> active -> finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamePhase {
    Waiting,
    Active { current_player: String },
    Finished { outcome: GameOutcome },
}

/// Flat status label exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Active,
    Finished,
}

/// In-memory game session state, owned exclusively by the registry.
/// Treated as an immutable value outside the registry: every mutation
/// replaces it atomically and hands out clones as snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub id: Uuid,
    pub name: String,
    /// Ordered, no duplicates, at most two entries; first is the creator.
    pub players: Vec<String>,
    pub phase: GamePhase,
    pub board: Board,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Game {
    pub fn new(name: &str, creator: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            players: vec![creator.to_string()],
            phase: GamePhase::Waiting,
            board: Board::default(),
            created_by: creator.to_string(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn status(&self) -> GameStatus {
        match self.phase {
            GamePhase::Waiting => GameStatus::Waiting,
            GamePhase::Active { .. } => GameStatus::Active,
            GamePhase::Finished { .. } => GameStatus::Finished,
        }
    }

    /// The symbol a player draws from their join order, if they are in
    /// this game at all.
    pub fn mark_of(&self, player: &str) -> Option<Mark> {
        match self.players.iter().position(|p| p == player) {
            Some(0) => Some(Mark::X),
            Some(1) => Some(Mark::O),
            _ => None,
        }
    }

    pub fn opponent_of(&self, player: &str) -> Option<&str> {
        if !self.players.iter().any(|p| p == player) {
            return None;
        }
        self.players
            .iter()
            .find(|p| p.as_str() != player)
            .map(String::as_str)
    }
}

/// Wire representation of a game, shared by HTTP responses and relay
/// event payloads. `winner` is the winning player's name, or `"draw"`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: Uuid,
    pub name: String,
    pub players: Vec<String>,
    pub status: GameStatus,
    pub board: Board,
    pub current_player: Option<String>,
    pub winner: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        let current_player = match &game.phase {
            GamePhase::Active { current_player } => Some(current_player.clone()),
            _ => None,
        };
        let winner = match &game.phase {
            GamePhase::Finished {
                outcome: GameOutcome::Winner(name),
            } => Some(name.clone()),
            GamePhase::Finished {
                outcome: GameOutcome::Draw,
            } => Some("draw".to_string()),
            _ => None,
        };
        Self {
            id: game.id,
            name: game.name.clone(),
            players: game.players.clone(),
            status: game.status(),
            board: game.board,
            current_player,
            winner,
            created_by: game.created_by.clone(),
            created_at: game.created_at,
            last_activity_at: game.last_activity_at,
        }
    }
}
