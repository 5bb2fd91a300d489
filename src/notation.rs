use crate::board::{Board, PieceType, Square};
use crate::check::legal_moves_from;
use crate::error::SquareError;
use crate::movegen::{EnPassantTarget, Move};

/// Standard algebraic notation without disambiguation.
pub fn to_algebraic(mv: &Move, is_capture: bool, is_check: bool, is_checkmate: bool) -> String {
    format_san(mv, "", is_capture, is_check, is_checkmate)
}

/// Algebraic notation with the file/rank prefix needed when another piece of
/// the same type and color could also reach the destination. `board` is the
/// position before the move.
pub fn to_san(
    mv: &Move,
    board: &Board,
    en_passant: Option<&EnPassantTarget>,
    is_check: bool,
    is_checkmate: bool,
) -> String {
    let prefix = disambiguation(mv, board, en_passant);
    format_san(mv, &prefix, mv.is_capture(), is_check, is_checkmate)
}

pub fn disambiguation(mv: &Move, board: &Board, en_passant: Option<&EnPassantTarget>) -> String {
    if matches!(mv.piece.kind, PieceType::Pawn | PieceType::King) {
        return String::new();
    }
    let rivals: Vec<Square> = board
        .pieces_of(mv.piece.color)
        .filter(|(sq, p)| *sq != mv.from && p.kind == mv.piece.kind)
        .filter(|(sq, _)| {
            legal_moves_from(*sq, board, en_passant)
                .iter()
                .any(|other| other.to == mv.to)
        })
        .map(|(sq, _)| sq)
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|sq| sq.col != mv.from.col) {
        mv.from.file_char().to_string()
    } else if rivals.iter().all(|sq| sq.row != mv.from.row) {
        mv.from.rank().to_string()
    } else {
        mv.from.to_string()
    }
}

fn format_san(mv: &Move, prefix: &str, is_capture: bool, is_check: bool, is_checkmate: bool) -> String {
    let mut notation = String::new();

    if mv.is_castling {
        notation.push_str(if mv.to.col > mv.from.col { "O-O" } else { "O-O-O" });
    } else {
        if let Some(letter) = mv.piece.kind.san_letter() {
            notation.push(letter);
        }
        notation.push_str(prefix);
        if is_capture {
            if mv.piece.kind == PieceType::Pawn {
                notation.push(mv.from.file_char());
            }
            notation.push('x');
        }
        notation.push_str(&mv.to.to_string());
        if let Some(letter) = mv.promotion.and_then(|p| p.san_letter()) {
            notation.push('=');
            notation.push(letter);
        }
    }

    if is_checkmate {
        notation.push('#');
    } else if is_check {
        notation.push('+');
    }
    notation
}

/// Coordinate form such as `e2e4` or `e7e8q`.
pub fn format_coordinate(mv: &Move) -> String {
    let mut result = format!("{}{}", mv.from, mv.to);
    if let Some(promotion) = mv.promotion {
        result.push(promotion.fen_char());
    }
    result
}

/// Parses `e2e4` / `e7e8q` into its squares and optional promotion piece.
pub fn parse_coordinate(input: &str) -> Result<(Square, Square, Option<PieceType>), SquareError> {
    let input = input.trim();
    if !input.is_ascii() || (input.len() != 4 && input.len() != 5) {
        return Err(SquareError::Move(input.to_string()));
    }
    let from: Square = input[0..2].parse()?;
    let to: Square = input[2..4].parse()?;
    let promotion = match input[4..].chars().next() {
        None => None,
        Some(c) => match PieceType::from_fen_char(c) {
            Some(kind) if kind.is_promotion_choice() => Some(kind),
            _ => return Err(SquareError::Move(input.to_string())),
        },
    };
    Ok((from, to, promotion))
}
