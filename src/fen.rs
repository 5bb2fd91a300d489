//! Forsyth–Edwards Notation.
//!
//! ```text
//! <ranks 8..1> <w|b> <KQkq|-> <en passant|-> <halfmove> <fullmove>
//! ```
//!
//! The en passant field is only written when a pawn of the side to move
//! actually stands beside the pawn that just advanced two squares.

use tracing::trace;

use crate::board::{Board, Color, Piece, PieceType, Square};
use crate::error::FenError;
use crate::game::{CastlingRights, GameState};
use crate::movegen::EnPassantTarget;

pub const STARTING_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub fn encode(state: &GameState) -> String {
    let fen = format!(
        "{} {} {} {} {} {}",
        placement(state.board()),
        match state.turn() {
            Color::White => 'w',
            Color::Black => 'b',
        },
        castling_field(state.castling_rights()),
        en_passant_field(state.board(), state.en_passant()),
        state.halfmove_clock(),
        state.fullmove_number(),
    );
    trace!(fen = %fen, "encoded position");
    fen
}

/// Piece placement field, rank 8 first.
pub fn placement(board: &Board) -> String {
    let mut ranks = Vec::with_capacity(8);
    for row in board.rows() {
        let mut rank = String::new();
        let mut empty = 0;
        for cell in row {
            match cell {
                None => empty += 1,
                Some(piece) => {
                    if empty > 0 {
                        rank.push_str(&empty.to_string());
                        empty = 0;
                    }
                    rank.push(piece.fen_char());
                }
            }
        }
        if empty > 0 {
            rank.push_str(&empty.to_string());
        }
        ranks.push(rank);
    }
    ranks.join("/")
}

fn castling_field(rights: CastlingRights) -> String {
    let mut field = String::new();
    if rights.white_kingside {
        field.push('K');
    }
    if rights.white_queenside {
        field.push('Q');
    }
    if rights.black_kingside {
        field.push('k');
    }
    if rights.black_queenside {
        field.push('q');
    }
    if field.is_empty() {
        field.push('-');
    }
    field
}

fn en_passant_field(board: &Board, target: Option<&EnPassantTarget>) -> String {
    let Some(target) = target else {
        return "-".to_string();
    };
    let capturable = [-1, 1].iter().any(|&dc| {
        target
            .pawn_position
            .offset(0, dc)
            .and_then(|sq| board.get(sq))
            .is_some_and(|p| p.kind == PieceType::Pawn && p.color != target.color)
    });
    if capturable {
        target.landing().to_string()
    } else {
        "-".to_string()
    }
}

pub fn decode(input: &str) -> Result<GameState, FenError> {
    let fields: Vec<&str> = input.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(FenError::FieldCount(fields.len()));
    }

    let mut board = parse_placement(fields[0])?;
    let turn = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::InvalidTurn(other.to_string())),
    };
    let rights = parse_castling(fields[2])?;
    let en_passant = parse_en_passant(fields[3])?;
    let halfmove = parse_counter(fields[4])?;
    let fullmove = parse_counter(fields[5])?;

    mark_moved_pieces(&mut board, rights);
    trace!(fen = %input, "decoded position");
    Ok(GameState::from_parts(board, turn, rights, en_passant, halfmove, fullmove))
}

pub fn parse_placement(field: &str) -> Result<Board, FenError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::RankCount(ranks.len()));
    }

    let mut board = Board::empty();
    for (row, rank) in ranks.iter().enumerate() {
        let mut col = 0usize;
        for c in rank.chars() {
            if let Some(run) = c.to_digit(10) {
                if run == 0 || run > 8 {
                    return Err(FenError::InvalidPiece(c));
                }
                col += run as usize;
            } else {
                let kind = PieceType::from_fen_char(c).ok_or(FenError::InvalidPiece(c))?;
                let color = if c.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                if col < 8 {
                    board.set(Square::new(row as u8, col as u8), Piece::new(kind, color));
                }
                col += 1;
            }
        }
        if col != 8 {
            return Err(FenError::RankWidth { rank: 8 - row, width: col });
        }
    }
    Ok(board)
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::NONE;
    if field == "-" {
        return Ok(rights);
    }
    for c in field.chars() {
        match c {
            'K' => rights.white_kingside = true,
            'Q' => rights.white_queenside = true,
            'k' => rights.black_kingside = true,
            'q' => rights.black_queenside = true,
            _ => return Err(FenError::InvalidCastling(field.to_string())),
        }
    }
    Ok(rights)
}

fn parse_en_passant(field: &str) -> Result<Option<EnPassantTarget>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    let landing: Square = field
        .parse()
        .map_err(|_| FenError::InvalidEnPassant(field.to_string()))?;
    // Rank 3 follows a white double step, rank 6 a black one.
    let color = match landing.rank() {
        3 => Color::White,
        6 => Color::Black,
        _ => return Err(FenError::InvalidEnPassant(field.to_string())),
    };
    let pawn_position = landing
        .offset(color.forward(), 0)
        .ok_or_else(|| FenError::InvalidEnPassant(field.to_string()))?;
    Ok(Some(EnPassantTarget {
        row: landing.row,
        col: landing.col,
        pawn_position,
        color,
    }))
}

fn parse_counter(field: &str) -> Result<u32, FenError> {
    field
        .parse()
        .map_err(|_| FenError::InvalidCounter(field.to_string()))
}

/// FEN carries no move history, so `has_moved` is inferred: pawns off their
/// start row, kings away from home or without rights, rooks whose corner right
/// is gone.
fn mark_moved_pieces(board: &mut Board, rights: CastlingRights) {
    for square in Square::all() {
        let Some(piece) = board.get_mut(square) else { continue };
        let home = piece.color.home_row();
        piece.has_moved = match piece.kind {
            PieceType::Pawn => square.row != piece.color.pawn_row(),
            PieceType::King => {
                square != Square::new(home, 4)
                    || !(rights.kingside(piece.color) || rights.queenside(piece.color))
            }
            PieceType::Rook if square == Square::new(home, 0) => !rights.queenside(piece.color),
            PieceType::Rook if square == Square::new(home, 7) => !rights.kingside(piece.color),
            PieceType::Rook => true,
            _ => false,
        };
    }
}
