use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SquareError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// Lowercase FEN letter.
    pub fn fen_char(&self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    pub fn from_fen_char(c: char) -> Option<PieceType> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }

    /// Letter used in algebraic notation; pawns have none.
    pub fn san_letter(&self) -> Option<char> {
        match self {
            PieceType::Pawn => None,
            other => Some(other.fen_char().to_ascii_uppercase()),
        }
    }

    pub fn is_promotion_choice(&self) -> bool {
        matches!(
            self,
            PieceType::Queen | PieceType::Rook | PieceType::Bishop | PieceType::Knight
        )
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PieceType::Pawn => "pawn",
            PieceType::Knight => "knight",
            PieceType::Bishop => "bishop",
            PieceType::Rook => "rook",
            PieceType::Queen => "queen",
            PieceType::King => "king",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a pawn advance. Row 0 is rank 8, so white moves up the array.
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Back rank holding the king and rooks at the start.
    pub fn home_row(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    pub fn pawn_row(&self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    pub fn promotion_row(&self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// A board coordinate. Row 0 is rank 8, col 0 is the a-file.
///
/// Both fields must be below 8; [`Board`] indexes its cells with them. Build
/// squares with [`FromStr`], [`Square::offset`] or [`Square::all`] when the
/// values are not known to be in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    pub const fn new(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8, "square off the board");
        Self { row, col }
    }

    /// Applies a row/col offset, returning `None` off the board.
    pub fn offset(&self, dr: i8, dc: i8) -> Option<Square> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Square::new(row as u8, col as u8))
        } else {
            None
        }
    }

    pub fn file_char(&self) -> char {
        (b'a' + self.col) as char
    }

    pub fn rank(&self) -> u8 {
        8 - self.row
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square::new(row, col)))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank())
    }
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(SquareError::Length(s.to_string()));
        }
        let col = match bytes[0] {
            b @ b'a'..=b'h' => b - b'a',
            _ => return Err(SquareError::File(bytes[0] as char)),
        };
        let row = match bytes[1] {
            b @ b'1'..=b'8' => 8 - (b - b'0'),
            _ => return Err(SquareError::Rank(bytes[1] as char)),
        };
        Ok(Square::new(row, col))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceType,
    pub color: Color,
    pub has_moved: bool,
    pub promoted: bool,
}

impl Piece {
    pub const fn new(kind: PieceType, color: Color) -> Self {
        Self {
            kind,
            color,
            has_moved: false,
            promoted: false,
        }
    }

    /// FEN letter, uppercase for white.
    pub fn fen_char(&self) -> char {
        let c = self.kind.fen_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

pub type Cell = Option<Piece>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; 8]; 8],
}

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [[None; 8]; 8],
        }
    }

    /// Standard starting position, nothing has moved.
    pub fn initial() -> Self {
        let mut board = Board::empty();
        for color in [Color::White, Color::Black] {
            for col in 0..8u8 {
                board.set(
                    Square::new(color.home_row(), col),
                    Piece::new(BACK_RANK[col as usize], color),
                );
                board.set(
                    Square::new(color.pawn_row(), col),
                    Piece::new(PieceType::Pawn, color),
                );
            }
        }
        board
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.cells[square.row as usize][square.col as usize]
    }

    pub fn get_mut(&mut self, square: Square) -> Option<&mut Piece> {
        self.cells[square.row as usize][square.col as usize].as_mut()
    }

    pub fn set(&mut self, square: Square, piece: Piece) {
        self.cells[square.row as usize][square.col as usize] = Some(piece);
    }

    pub fn clear(&mut self, square: Square) {
        self.cells[square.row as usize][square.col as usize] = None;
    }

    /// Removes and returns whatever stands on `square`.
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self.cells[square.row as usize][square.col as usize].take()
    }

    pub fn is_empty_at(&self, square: Square) -> bool {
        self.get(square).is_none()
    }

    pub fn rows(&self) -> &[[Cell; 8]; 8] {
        &self.cells
    }

    /// Every occupied square with its piece, row-major from a8.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.get(sq).map(|p| (sq, p)))
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.pieces().filter(move |(_, p)| p.color == color)
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::initial()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for (row, cells) in self.cells.iter().enumerate() {
            result.push((b'8' - row as u8) as char);
            result.push(' ');
            for (col, cell) in cells.iter().enumerate() {
                result.push(cell.map(|p| p.fen_char()).unwrap_or('.'));
                if col < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        result.push_str("  a b c d e f g h\n");
        write!(f, "{}", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_layout() {
        let board = Board::initial();
        let white = board.pieces_of(Color::White).count();
        let black = board.pieces_of(Color::Black).count();
        assert_eq!(white, 16);
        assert_eq!(black, 16);
        assert!(board.pieces().all(|(_, p)| !p.has_moved && !p.promoted));

        let e1: Square = "e1".parse().unwrap();
        let d8: Square = "d8".parse().unwrap();
        assert_eq!(board.get(e1).map(|p| (p.kind, p.color)), Some((PieceType::King, Color::White)));
        assert_eq!(board.get(d8).map(|p| (p.kind, p.color)), Some((PieceType::Queen, Color::Black)));
        for col in 0..8 {
            assert!(board.is_empty_at(Square::new(3, col)));
            assert!(board.is_empty_at(Square::new(4, col)));
        }
    }

    #[test]
    fn test_square_parsing() {
        assert_eq!("a8".parse::<Square>().unwrap(), Square::new(0, 0));
        assert_eq!("h1".parse::<Square>().unwrap(), Square::new(7, 7));
        assert_eq!(Square::new(4, 4).to_string(), "e4");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
    }

    #[test]
    fn test_offset_stays_on_board() {
        let corner = Square::new(0, 0);
        assert_eq!(corner.offset(-1, 0), None);
        assert_eq!(corner.offset(1, 1), Some(Square::new(1, 1)));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "square off the board")]
    fn test_square_new_rejects_off_board() {
        Square::new(8, 0);
    }
}
