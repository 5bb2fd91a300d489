pub mod board;
pub mod check;
pub mod config;
pub mod console;
pub mod error;
pub mod evaluation;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod notation;
pub mod opponent;

#[cfg(test)]
mod tests {
    use super::*;
    use board::{Board, Color, Piece, PieceType, Square};
    use check::{all_legal_moves, is_in_check};
    use evaluation::MoveSelector;
    use game::{CastlingRights, GameEvent, GameState, GameStatus, MoveOutcome};
    use movegen::promotion_moves;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn play(game: &mut GameState, moves: &[&str]) {
        for text in moves {
            let (from, to, promotion) = notation::parse_coordinate(text).unwrap();
            game.try_move(from, to, promotion).unwrap();
        }
    }

    #[test]
    fn test_initial_position() {
        let game = GameState::new();
        let moves = game.all_legal_moves();

        // White should have 20 legal moves in the initial position
        assert_eq!(moves.len(), 20);
        assert_eq!(moves.iter().filter(|m| m.piece.kind == PieceType::Pawn).count(), 16);
        assert_eq!(moves.iter().filter(|m| m.piece.kind == PieceType::Knight).count(), 4);
        assert_eq!(game.turn(), Color::White);
        assert_eq!(game.castling_rights(), CastlingRights::ALL);
        assert!(game.en_passant().is_none());
    }

    #[test]
    fn test_checkmate_implies_check() {
        let mut game = GameState::new();
        play(&mut game, &["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"]);

        assert_eq!(game.status(), GameStatus::Checkmate { winner: Color::White });
        assert!(game.check_status().is_in_check(Color::Black));
        assert!(game.all_legal_moves().is_empty());
        assert_eq!(game.history().last().unwrap().notation, "Qxf7#");
    }

    #[test]
    fn test_stalemate() {
        let mut game = GameState::from_fen("7k/8/6K1/8/8/8/5Q2/8 w - - 0 1").unwrap();
        let applied = match game.try_move(sq("f2"), sq("f7"), None).unwrap() {
            MoveOutcome::Applied(applied) => applied,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(game.status(), GameStatus::Stalemate);
        assert!(!is_in_check(Color::Black, game.board()));
        assert!(game.all_legal_moves().is_empty());
        assert!(applied.events.contains(&GameEvent::GameOver(GameStatus::Stalemate)));
        assert_eq!(applied.record.notation, "Qf7");
    }

    #[test]
    fn test_en_passant_expires() {
        let mut game = GameState::new();
        play(&mut game, &["e2e4", "a7a6", "e4e5", "d7d5"]);
        let capture = game
            .legal_moves_from(sq("e5"))
            .into_iter()
            .find(|m| m.is_en_passant)
            .unwrap();
        assert_eq!(capture.to, sq("d6"));
        assert_eq!(capture.captured_pawn_position, Some(sq("d5")));

        play(&mut game, &["a2a3", "h7h6"]);
        assert!(game.legal_moves_from(sq("e5")).iter().all(|m| !m.is_en_passant));
    }

    #[test]
    fn test_en_passant_capture() {
        let mut game = GameState::new();
        play(&mut game, &["e2e4", "a7a6", "e4e5", "d7d5", "e5d6"]);
        assert!(game.board().is_empty_at(sq("d5")));
        assert_eq!(game.board().get(sq("d6")).map(|p| p.kind), Some(PieceType::Pawn));
        let last = game.history().last().unwrap();
        assert_eq!(last.notation, "exd6");
        assert!(last.mv.is_en_passant);
        assert_eq!(game.halfmove_clock(), 0);
    }

    #[test]
    fn test_queen_check_clear_and_blocked() {
        let mut board = Board::empty();
        board.set(sq("e8"), Piece::new(PieceType::King, Color::Black));
        board.set(sq("a1"), Piece::new(PieceType::King, Color::White));
        board.set(sq("e1"), Piece::new(PieceType::Queen, Color::White));
        assert!(is_in_check(Color::Black, &board));

        board.set(sq("e4"), Piece::new(PieceType::Pawn, Color::White));
        assert!(!is_in_check(Color::Black, &board));

        // Diagonal line
        board.set(sq("b5"), Piece::new(PieceType::Queen, Color::White));
        assert!(is_in_check(Color::Black, &board));
        board.set(sq("d7"), Piece::new(PieceType::Knight, Color::Black));
        assert!(!is_in_check(Color::Black, &board));
    }

    #[test]
    fn test_castling_moves_king_and_rook() {
        let mut game = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        play(&mut game, &["e1g1"]);
        let board = game.board();
        assert_eq!(board.get(sq("g1")).map(|p| p.kind), Some(PieceType::King));
        assert_eq!(board.get(sq("f1")).map(|p| p.kind), Some(PieceType::Rook));
        assert!(board.is_empty_at(sq("h1")));
        assert!(board.is_empty_at(sq("e1")));
        let rights = game.castling_rights();
        assert!(!rights.white_kingside && !rights.white_queenside);
        assert!(rights.black_kingside && rights.black_queenside);
        assert_eq!(game.history()[0].notation, "O-O");

        play(&mut game, &["e8c8"]);
        assert_eq!(game.board().get(sq("d8")).map(|p| p.kind), Some(PieceType::Rook));
        assert_eq!(game.history()[1].notation, "O-O-O");
        assert_eq!(game.to_fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 2 2");
    }

    #[test]
    fn test_promoted_queen_moves_as_queen() {
        let mut game = GameState::from_fen("7k/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let outcome = game.try_move(sq("a7"), sq("a8"), None).unwrap();
        assert!(matches!(outcome, MoveOutcome::PromotionPending(_)));
        assert_eq!(game.turn(), Color::White);

        game.complete_promotion(PieceType::Queen).unwrap();
        let queen = game.board().get(sq("a8")).unwrap();
        assert_eq!(queen.kind, PieceType::Queen);
        assert!(queen.promoted);

        play(&mut game, &["h8g7"]);
        let moves = game.legal_moves_from(sq("a8"));
        assert!(moves.iter().any(|m| m.to == sq("a1")));
        assert!(moves.iter().any(|m| m.to == sq("f3")));
        assert!(moves.iter().any(|m| m.to == sq("g8")));
    }

    #[test]
    fn test_selector_never_fabricates() {
        let mut game = GameState::new();
        let selector = MoveSelector::default();
        let mut rng = StdRng::seed_from_u64(2024);

        for _ in 0..60 {
            if game.is_over() {
                break;
            }
            let candidates = game.all_legal_moves();
            let chosen = selector.select_move(game.board(), &candidates, &mut rng).unwrap();
            let expanded: Vec<_> = candidates.into_iter().flat_map(promotion_moves).collect();
            assert!(expanded.contains(&chosen) || expanded.contains(&movegen::Move { promotion: None, ..chosen }));
            assert!(matches!(game.apply_move(&chosen).unwrap(), MoveOutcome::Applied(_)));

            let fen = game.to_fen();
            assert_eq!(fen::encode(&fen::decode(&fen).unwrap()), fen);
        }
    }

    #[test]
    fn test_all_legal_moves_leave_king_safe() {
        let game = GameState::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        let moves = all_legal_moves(Color::White, game.board(), game.en_passant());
        assert_eq!(moves.len(), 48);
        for mv in moves {
            assert!(!is_in_check(Color::White, &check::simulate(game.board(), &mv)));
        }
    }
}
