use crate::{
    error::GameError,
    models::{Board, Game, GameOutcome, GamePhase, Mark, BOARD_CELLS, MAX_PLAYERS},
};

/// The 8 winning triples: 3 rows, 3 columns, 2 diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Pure turn logic over a `Game` value. Holds no state of its own; the
/// registry applies it while holding the game's exclusive slot.
pub struct GameRules;

impl GameRules {
    /// True iff the game is still waiting, has room, and the player is
    /// not already seated.
    pub fn can_join(game: &Game, player: &str) -> bool {
        matches!(game.phase, GamePhase::Waiting)
            && game.players.len() < MAX_PLAYERS
            && !game.players.iter().any(|p| p == player)
    }

    /// Validate and apply one move. All checks run before the board is
    /// touched, so an error leaves the game exactly as it was.
    pub fn apply_move(game: &mut Game, player: &str, cell_index: usize) -> Result<(), GameError> {
        let GamePhase::Active { current_player } = &game.phase else {
            return Err(GameError::InvalidState);
        };
        if current_player != player {
            return Err(GameError::NotYourTurn);
        }
        if cell_index >= BOARD_CELLS || game.board.cell(cell_index).is_some() {
            return Err(GameError::InvalidCell);
        }
        // An active game always seats two players, so both lookups succeed;
        // failing closed keeps this panic-free on a corrupted record.
        let mark = game.mark_of(player).ok_or(GameError::NotYourTurn)?;
        let next_player = game
            .opponent_of(player)
            .ok_or(GameError::InvalidState)?
            .to_string();

        game.board.place(cell_index, mark);

        if Self::winning_mark(&game.board) == Some(mark) {
            game.phase = GamePhase::Finished {
                outcome: GameOutcome::Winner(player.to_string()),
            };
        } else if game.board.is_full() {
            game.phase = GamePhase::Finished {
                outcome: GameOutcome::Draw,
            };
        } else {
            game.phase = GamePhase::Active {
                current_player: next_player,
            };
        }
        Ok(())
    }

    /// The mark owning a complete line, if any.
    pub fn winning_mark(board: &Board) -> Option<Mark> {
        for line in &WINNING_LINES {
            let [a, b, c] = *line;
            if let Some(mark) = board.cell(a) {
                if board.cell(b) == Some(mark) && board.cell(c) == Some(mark) {
                    return Some(mark);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_game() -> Game {
        let mut game = Game::new("G", "Alice");
        game.players.push("Bob".to_string());
        game.phase = GamePhase::Active {
            current_player: "Alice".to_string(),
        };
        game
    }

    #[test]
    fn test_can_join_only_when_waiting_with_room() {
        let game = Game::new("G", "Alice");
        assert!(GameRules::can_join(&game, "Bob"));
        // Creator cannot join their own game twice
        assert!(!GameRules::can_join(&game, "Alice"));

        let game = active_game();
        assert!(!GameRules::can_join(&game, "Carol"));
    }

    #[test]
    fn test_win_detected_on_each_of_the_eight_lines() {
        for line in &WINNING_LINES {
            let mut board = Board::default();
            for &idx in line {
                board.place(idx, Mark::X);
            }
            assert_eq!(
                GameRules::winning_mark(&board),
                Some(Mark::X),
                "line {:?} should win",
                line
            );
        }
    }

    #[test]
    fn test_no_win_on_fully_mixed_board() {
        // X O X / X O O / O X X: full board, no line owned by one mark
        let mut board = Board::default();
        for (idx, mark) in [
            (0, Mark::X),
            (1, Mark::O),
            (2, Mark::X),
            (3, Mark::X),
            (4, Mark::O),
            (5, Mark::O),
            (6, Mark::O),
            (7, Mark::X),
            (8, Mark::X),
        ] {
            board.place(idx, mark);
        }
        assert!(board.is_full());
        assert_eq!(GameRules::winning_mark(&board), None);
    }

    #[test]
    fn test_alternating_moves_toggle_current_player() {
        let mut game = active_game();
        GameRules::apply_move(&mut game, "Alice", 0).unwrap();
        assert_eq!(
            game.phase,
            GamePhase::Active {
                current_player: "Bob".to_string()
            }
        );
        assert_eq!(game.board.cell(0), Some(Mark::X));

        GameRules::apply_move(&mut game, "Bob", 4).unwrap();
        assert_eq!(
            game.phase,
            GamePhase::Active {
                current_player: "Alice".to_string()
            }
        );
        assert_eq!(game.board.cell(4), Some(Mark::O));
    }

    #[test]
    fn test_top_row_win_finishes_the_game() {
        let mut game = active_game();
        GameRules::apply_move(&mut game, "Alice", 0).unwrap();
        GameRules::apply_move(&mut game, "Bob", 4).unwrap();
        GameRules::apply_move(&mut game, "Alice", 1).unwrap();
        GameRules::apply_move(&mut game, "Bob", 5).unwrap();
        GameRules::apply_move(&mut game, "Alice", 2).unwrap();

        assert_eq!(
            game.phase,
            GamePhase::Finished {
                outcome: GameOutcome::Winner("Alice".to_string())
            }
        );
    }

    #[test]
    fn test_nine_moves_without_a_line_is_a_draw() {
        let mut game = active_game();
        // X: 0 1 5 6 8, O: 4 2 3 7 -> full board, no winner
        for (player, cell) in [
            ("Alice", 0),
            ("Bob", 4),
            ("Alice", 1),
            ("Bob", 2),
            ("Alice", 5),
            ("Bob", 3),
            ("Alice", 6),
            ("Bob", 7),
            ("Alice", 8),
        ] {
            GameRules::apply_move(&mut game, player, cell).unwrap();
        }
        assert_eq!(
            game.phase,
            GamePhase::Finished {
                outcome: GameOutcome::Draw
            }
        );
    }

    #[test]
    fn test_move_rejected_when_not_active() {
        let mut game = Game::new("G", "Alice");
        let before = game.clone();
        assert_eq!(
            GameRules::apply_move(&mut game, "Alice", 0),
            Err(GameError::InvalidState)
        );
        assert_eq!(game, before);

        let mut game = active_game();
        GameRules::apply_move(&mut game, "Alice", 0).unwrap();
        GameRules::apply_move(&mut game, "Bob", 3).unwrap();
        GameRules::apply_move(&mut game, "Alice", 1).unwrap();
        GameRules::apply_move(&mut game, "Bob", 4).unwrap();
        GameRules::apply_move(&mut game, "Alice", 2).unwrap();
        // Finished games accept no further moves
        let before = game.clone();
        assert_eq!(
            GameRules::apply_move(&mut game, "Bob", 5),
            Err(GameError::InvalidState)
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_move_rejected_out_of_turn() {
        let mut game = active_game();
        let before = game.clone();
        assert_eq!(
            GameRules::apply_move(&mut game, "Bob", 0),
            Err(GameError::NotYourTurn)
        );
        // A spectator is never the current player
        assert_eq!(
            GameRules::apply_move(&mut game, "Carol", 0),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_move_rejected_on_bad_cell() {
        let mut game = active_game();
        assert_eq!(
            GameRules::apply_move(&mut game, "Alice", 9),
            Err(GameError::InvalidCell)
        );

        GameRules::apply_move(&mut game, "Alice", 0).unwrap();
        let before = game.clone();
        // Occupied cell: rejected, board untouched, still Bob's turn
        assert_eq!(
            GameRules::apply_move(&mut game, "Bob", 0),
            Err(GameError::InvalidCell)
        );
        assert_eq!(game, before);
        assert_eq!(game.board.cell(0), Some(Mark::X));
    }
}
