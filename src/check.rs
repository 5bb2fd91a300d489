//! Check detection and legal-move filtering.
//!
//! Legality is decided by simulation: a candidate is applied to a scratch copy
//! of the board and kept only if the mover's king is not attacked afterwards.
//! Pseudo-legal generation in [`crate::movegen`] never looks at checks.

use crate::board::{Board, Color, Piece, PieceType, Square};
use crate::movegen::{attacked_squares, pseudo_legal_moves, EnPassantTarget, Move};

pub fn find_king(color: Color, board: &Board) -> Option<Square> {
    board
        .pieces_of(color)
        .find(|(_, p)| p.kind == PieceType::King)
        .map(|(sq, _)| sq)
}

pub fn is_square_under_attack(square: Square, attacker: Color, board: &Board) -> bool {
    board
        .pieces_of(attacker)
        .any(|(from, piece)| attacked_squares(from, piece, board).contains(&square))
}

/// A side without a king is never in check.
pub fn is_in_check(color: Color, board: &Board) -> bool {
    match find_king(color, board) {
        Some(king) => is_square_under_attack(king, color.opposite(), board),
        None => false,
    }
}

/// Plays `mv` on a copy of `board`. Handles en passant removal, the castling
/// rook and promotion when a promotion piece is supplied.
pub fn simulate(board: &Board, mv: &Move) -> Board {
    let mut scratch = *board;
    if mv.is_en_passant {
        if let Some(victim) = mv.captured_pawn_position {
            scratch.clear(victim);
        }
    }
    let mut moving = scratch.take(mv.from).unwrap_or(mv.piece);
    moving.has_moved = true;
    if let Some(kind) = mv.promotion {
        if moving.kind == PieceType::Pawn {
            moving.kind = kind;
            moving.promoted = true;
        }
    }
    scratch.set(mv.to, moving);
    if let Some(rook_move) = mv.rook_move {
        if let Some(mut rook) = scratch.take(rook_move.from) {
            rook.has_moved = true;
            scratch.set(rook_move.to, rook);
        }
    }
    scratch
}

/// Filters `candidates` for `piece` on `square` down to the moves that do not
/// leave its own king in check.
pub fn legal_moves(square: Square, piece: Piece, board: &Board, candidates: Vec<Move>) -> Vec<Move> {
    let color = piece.color;
    candidates
        .into_iter()
        .filter(|mv| mv.from == square)
        .filter(|mv| !mv.is_castling || castling_path_is_safe(mv, color, board))
        .filter(|mv| !is_in_check(color, &simulate(board, mv)))
        .collect()
}

/// The king may not castle out of check or across an attacked square. The
/// landing square is covered by the general simulation test.
fn castling_path_is_safe(mv: &Move, color: Color, board: &Board) -> bool {
    if is_in_check(color, board) {
        return false;
    }
    let step = if mv.to.col > mv.from.col { 1 } else { -1 };
    match mv.from.offset(0, step) {
        Some(transit) => !is_square_under_attack(transit, color.opposite(), board),
        None => false,
    }
}

/// Legal moves for the piece on `square`, or nothing if the square is empty.
pub fn legal_moves_from(square: Square, board: &Board, en_passant: Option<&EnPassantTarget>) -> Vec<Move> {
    match board.get(square) {
        Some(piece) => legal_moves(square, piece, board, pseudo_legal_moves(square, piece, board, en_passant)),
        None => Vec::new(),
    }
}

pub fn all_legal_moves(color: Color, board: &Board, en_passant: Option<&EnPassantTarget>) -> Vec<Move> {
    board
        .pieces_of(color)
        .flat_map(|(square, _)| legal_moves_from(square, board, en_passant))
        .collect()
}

/// Stops at the first piece that has somewhere to go.
pub fn has_any_legal_move(color: Color, board: &Board, en_passant: Option<&EnPassantTarget>) -> bool {
    board
        .pieces_of(color)
        .any(|(square, _)| !legal_moves_from(square, board, en_passant).is_empty())
}

pub fn is_in_checkmate(color: Color, board: &Board, en_passant: Option<&EnPassantTarget>) -> bool {
    is_in_check(color, board) && !has_any_legal_move(color, board, en_passant)
}

pub fn is_in_stalemate(color: Color, board: &Board, en_passant: Option<&EnPassantTarget>) -> bool {
    !is_in_check(color, board) && !has_any_legal_move(color, board, en_passant)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn put(board: &mut Board, s: &str, kind: PieceType, color: Color) {
        board.set(sq(s), Piece::new(kind, color));
    }

    #[test]
    fn test_find_king() {
        let board = Board::initial();
        assert_eq!(find_king(Color::White, &board), Some(sq("e1")));
        assert_eq!(find_king(Color::Black, &board), Some(sq("e8")));
        assert_eq!(find_king(Color::White, &Board::empty()), None);
        assert!(!is_in_check(Color::White, &Board::empty()));
    }

    #[test]
    fn test_pawn_attacks_empty_diagonal() {
        let mut board = Board::empty();
        put(&mut board, "e4", PieceType::Pawn, Color::White);
        assert!(is_square_under_attack(sq("d5"), Color::White, &board));
        assert!(is_square_under_attack(sq("f5"), Color::White, &board));
        assert!(!is_square_under_attack(sq("e5"), Color::White, &board));
    }

    #[test]
    fn test_rook_check_blocked() {
        let mut board = Board::empty();
        put(&mut board, "e1", PieceType::King, Color::White);
        put(&mut board, "e8", PieceType::Rook, Color::Black);
        put(&mut board, "a8", PieceType::King, Color::Black);
        assert!(is_in_check(Color::White, &board));
        put(&mut board, "e4", PieceType::Knight, Color::White);
        assert!(!is_in_check(Color::White, &board));
    }

    #[test]
    fn test_pinned_piece_cannot_move_off_line() {
        let mut board = Board::empty();
        put(&mut board, "e1", PieceType::King, Color::White);
        put(&mut board, "e2", PieceType::Bishop, Color::White);
        put(&mut board, "e8", PieceType::Rook, Color::Black);
        put(&mut board, "a8", PieceType::King, Color::Black);
        assert!(legal_moves_from(sq("e2"), &board, None).is_empty());
    }

    #[test]
    fn test_king_cannot_step_into_attack() {
        let mut board = Board::empty();
        put(&mut board, "e1", PieceType::King, Color::White);
        put(&mut board, "d8", PieceType::Rook, Color::Black);
        put(&mut board, "h8", PieceType::King, Color::Black);
        let moves = legal_moves_from(sq("e1"), &board, None);
        assert!(moves.iter().all(|m| m.to.col != 3));
        assert_eq!(moves.len(), 3);
    }

    #[test]
    fn test_back_rank_mate() {
        let mut board = Board::empty();
        put(&mut board, "g8", PieceType::King, Color::Black);
        put(&mut board, "f7", PieceType::Pawn, Color::Black);
        put(&mut board, "g7", PieceType::Pawn, Color::Black);
        put(&mut board, "h7", PieceType::Pawn, Color::Black);
        put(&mut board, "a8", PieceType::Rook, Color::White);
        put(&mut board, "g1", PieceType::King, Color::White);
        assert!(is_in_check(Color::Black, &board));
        assert!(is_in_checkmate(Color::Black, &board, None));
        assert!(!is_in_stalemate(Color::Black, &board, None));
        assert!(all_legal_moves(Color::Black, &board, None).is_empty());
    }

    #[test]
    fn test_corner_stalemate() {
        let mut board = Board::empty();
        put(&mut board, "h8", PieceType::King, Color::Black);
        put(&mut board, "f7", PieceType::Queen, Color::White);
        put(&mut board, "g6", PieceType::King, Color::White);
        assert!(!is_in_check(Color::Black, &board));
        assert!(is_in_stalemate(Color::Black, &board, None));
        assert!(!is_in_checkmate(Color::Black, &board, None));
    }

    #[test]
    fn test_castling_through_attack_rejected() {
        let mut board = Board::empty();
        put(&mut board, "e1", PieceType::King, Color::White);
        put(&mut board, "h1", PieceType::Rook, Color::White);
        put(&mut board, "a1", PieceType::Rook, Color::White);
        put(&mut board, "e8", PieceType::King, Color::Black);
        // f-file rook covers the kingside transit square
        put(&mut board, "f8", PieceType::Rook, Color::Black);
        let moves = legal_moves_from(sq("e1"), &board, None);
        assert!(!moves.iter().any(|m| m.is_castling && m.to == sq("g1")));
        assert!(moves.iter().any(|m| m.is_castling && m.to == sq("c1")));
    }

    #[test]
    fn test_castling_out_of_check_rejected() {
        let mut board = Board::empty();
        put(&mut board, "e1", PieceType::King, Color::White);
        put(&mut board, "h1", PieceType::Rook, Color::White);
        put(&mut board, "a1", PieceType::Rook, Color::White);
        put(&mut board, "a8", PieceType::King, Color::Black);
        put(&mut board, "e7", PieceType::Rook, Color::Black);
        let moves = legal_moves_from(sq("e1"), &board, None);
        assert!(moves.iter().all(|m| !m.is_castling));
    }

    #[test]
    fn test_queenside_b_file_attack_does_not_block() {
        let mut board = Board::empty();
        put(&mut board, "e1", PieceType::King, Color::White);
        put(&mut board, "a1", PieceType::Rook, Color::White);
        put(&mut board, "h8", PieceType::King, Color::Black);
        put(&mut board, "b8", PieceType::Rook, Color::Black);
        let moves = legal_moves_from(sq("e1"), &board, None);
        assert!(moves.iter().any(|m| m.is_castling && m.to == sq("c1")));
    }

    #[test]
    fn test_simulate_en_passant_removes_victim() {
        let mut board = Board::empty();
        put(&mut board, "e5", PieceType::Pawn, Color::White);
        put(&mut board, "d5", PieceType::Pawn, Color::Black);
        let target = EnPassantTarget {
            row: sq("d6").row,
            col: sq("d6").col,
            pawn_position: sq("d5"),
            color: Color::Black,
        };
        let moves = legal_moves_from(sq("e5"), &board, Some(&target));
        let ep = moves.iter().find(|m| m.is_en_passant).unwrap();
        let after = simulate(&board, ep);
        assert!(after.is_empty_at(sq("d5")));
        assert!(after.is_empty_at(sq("e5")));
        assert_eq!(after.get(sq("d6")).map(|p| p.kind), Some(PieceType::Pawn));
    }
}
