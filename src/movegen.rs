use crate::board::{Board, Color, Piece, PieceType, Square};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

const DIAGONALS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ORTHOGONALS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

pub const PROMOTION_CHOICES: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RookMove {
    pub from: Square,
    pub to: Square,
}

/// Square a capturing pawn lands on after a double step, plus where the
/// double-stepped pawn actually stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnPassantTarget {
    pub row: u8,
    pub col: u8,
    pub pawn_position: Square,
    pub color: Color,
}

impl EnPassantTarget {
    pub fn landing(&self) -> Square {
        Square::new(self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub captured_piece: Option<Piece>,
    pub is_castling: bool,
    pub rook_move: Option<RookMove>,
    pub is_en_passant: bool,
    pub captured_pawn_position: Option<Square>,
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(from: Square, to: Square, piece: Piece, captured_piece: Option<Piece>) -> Self {
        Self {
            from,
            to,
            piece,
            captured_piece,
            is_castling: false,
            rook_move: None,
            is_en_passant: false,
            captured_pawn_position: None,
            promotion: None,
        }
    }

    pub fn new_en_passant(from: Square, to: Square, piece: Piece, target: &EnPassantTarget, captured: Piece) -> Self {
        Self {
            from,
            to,
            piece,
            captured_piece: Some(captured),
            is_castling: false,
            rook_move: None,
            is_en_passant: true,
            captured_pawn_position: Some(target.pawn_position),
            promotion: None,
        }
    }

    pub fn new_castling(from: Square, to: Square, king: Piece, rook_from: Square, rook_to: Square) -> Self {
        Self {
            from,
            to,
            piece: king,
            captured_piece: None,
            is_castling: true,
            rook_move: Some(RookMove {
                from: rook_from,
                to: rook_to,
            }),
            is_en_passant: false,
            captured_pawn_position: None,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, kind: PieceType) -> Self {
        self.promotion = Some(kind);
        self
    }

    pub fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }

    /// Pawn move onto the last rank.
    pub fn is_promotion_move(&self) -> bool {
        self.piece.kind == PieceType::Pawn && self.to.row == self.piece.color.promotion_row()
    }

    pub fn is_double_step(&self) -> bool {
        self.piece.kind == PieceType::Pawn && self.from.row.abs_diff(self.to.row) == 2
    }

    /// Square of the piece this move removes, if any.
    pub fn capture_square(&self) -> Option<Square> {
        if self.is_en_passant {
            self.captured_pawn_position
        } else if self.captured_piece.is_some() {
            Some(self.to)
        } else {
            None
        }
    }
}

/// Expands an unfinished promotion into one move per promotion choice.
/// Any other move is returned unchanged.
pub fn promotion_moves(mv: Move) -> Vec<Move> {
    if mv.is_promotion_move() && mv.promotion.is_none() {
        PROMOTION_CHOICES
            .iter()
            .map(|&kind| mv.with_promotion(kind))
            .collect()
    } else {
        vec![mv]
    }
}

/// Moves obeying the movement rules of `piece`, without regard to the mover's
/// own king. Promotions are left unspecified.
pub fn pseudo_legal_moves(
    square: Square,
    piece: Piece,
    board: &Board,
    en_passant: Option<&EnPassantTarget>,
) -> Vec<Move> {
    match piece.kind {
        PieceType::Pawn => pawn_moves(square, piece, board, en_passant),
        PieceType::Knight => step_moves(square, piece, board, &KNIGHT_OFFSETS),
        PieceType::Bishop => ray_moves(square, piece, board, &DIAGONALS),
        PieceType::Rook => ray_moves(square, piece, board, &ORTHOGONALS),
        PieceType::Queen => {
            let mut moves = ray_moves(square, piece, board, &ORTHOGONALS);
            moves.extend(ray_moves(square, piece, board, &DIAGONALS));
            moves
        }
        PieceType::King => {
            let mut moves = step_moves(square, piece, board, &KING_OFFSETS);
            moves.extend(castling_moves(square, piece, board));
            moves
        }
    }
}

/// Squares `piece` attacks from `square`. Pawns attack both forward diagonals
/// whatever stands there; castling never attacks.
pub fn attacked_squares(square: Square, piece: Piece, board: &Board) -> Vec<Square> {
    match piece.kind {
        PieceType::Pawn => pawn_attacks(square, piece.color),
        PieceType::Knight => targets(step_moves(square, piece, board, &KNIGHT_OFFSETS)),
        PieceType::Bishop => targets(ray_moves(square, piece, board, &DIAGONALS)),
        PieceType::Rook => targets(ray_moves(square, piece, board, &ORTHOGONALS)),
        PieceType::Queen => {
            let mut squares = targets(ray_moves(square, piece, board, &ORTHOGONALS));
            squares.extend(targets(ray_moves(square, piece, board, &DIAGONALS)));
            squares
        }
        PieceType::King => targets(step_moves(square, piece, board, &KING_OFFSETS)),
    }
}

fn targets(moves: Vec<Move>) -> Vec<Square> {
    moves.into_iter().map(|mv| mv.to).collect()
}

pub fn pawn_attacks(square: Square, color: Color) -> Vec<Square> {
    [-1, 1]
        .iter()
        .filter_map(|&dc| square.offset(color.forward(), dc))
        .collect()
}

fn pawn_moves(
    square: Square,
    piece: Piece,
    board: &Board,
    en_passant: Option<&EnPassantTarget>,
) -> Vec<Move> {
    let mut moves = Vec::new();
    let dir = piece.color.forward();

    // Pushes
    if let Some(one) = square.offset(dir, 0) {
        if board.is_empty_at(one) {
            moves.push(Move::new(square, one, piece, None));
            if square.row == piece.color.pawn_row() {
                if let Some(two) = square.offset(2 * dir, 0) {
                    if board.is_empty_at(two) {
                        moves.push(Move::new(square, two, piece, None));
                    }
                }
            }
        }
    }

    // Captures
    for to in pawn_attacks(square, piece.color) {
        match board.get(to) {
            Some(target) if target.color != piece.color => {
                moves.push(Move::new(square, to, piece, Some(target)));
            }
            Some(_) => {}
            None => {
                let Some(ep) = en_passant else { continue };
                if ep.landing() != to
                    || ep.color == piece.color
                    || ep.pawn_position.col.abs_diff(square.col) != 1
                {
                    continue;
                }
                if let Some(victim) = board.get(ep.pawn_position) {
                    if victim.kind == PieceType::Pawn && victim.color != piece.color {
                        moves.push(Move::new_en_passant(square, to, piece, ep, victim));
                    }
                }
            }
        }
    }

    moves
}

fn step_moves(square: Square, piece: Piece, board: &Board, offsets: &[(i8, i8)]) -> Vec<Move> {
    let mut moves = Vec::new();
    for &(dr, dc) in offsets {
        let Some(to) = square.offset(dr, dc) else { continue };
        match board.get(to) {
            None => moves.push(Move::new(square, to, piece, None)),
            Some(target) if target.color != piece.color => {
                moves.push(Move::new(square, to, piece, Some(target)))
            }
            Some(_) => {}
        }
    }
    moves
}

fn ray_moves(square: Square, piece: Piece, board: &Board, directions: &[(i8, i8)]) -> Vec<Move> {
    let mut moves = Vec::new();
    for &(dr, dc) in directions {
        let mut current = square;
        while let Some(to) = current.offset(dr, dc) {
            match board.get(to) {
                None => moves.push(Move::new(square, to, piece, None)),
                Some(target) => {
                    if target.color != piece.color {
                        moves.push(Move::new(square, to, piece, Some(target)));
                    }
                    break;
                }
            }
            current = to;
        }
    }
    moves
}

/// Castling candidates: unmoved king, unmoved rook on its corner, empty squares
/// between them. Attacked squares are the legality engine's concern.
fn castling_moves(square: Square, king: Piece, board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    let home = king.color.home_row();
    if king.has_moved || square != Square::new(home, 4) {
        return moves;
    }

    // (rook col, king destination col, rook destination col, cols that must be empty)
    let sides: [(u8, u8, u8, &[u8]); 2] = [(7, 6, 5, &[5, 6]), (0, 2, 3, &[1, 2, 3])];
    for (rook_col, king_to, rook_to, between) in sides {
        let rook_square = Square::new(home, rook_col);
        let rook_ready = matches!(
            board.get(rook_square),
            Some(rook) if rook.kind == PieceType::Rook && rook.color == king.color && !rook.has_moved
        );
        if !rook_ready {
            continue;
        }
        if between.iter().all(|&col| board.is_empty_at(Square::new(home, col))) {
            moves.push(Move::new_castling(
                square,
                Square::new(home, king_to),
                king,
                rook_square,
                Square::new(home, rook_to),
            ));
        }
    }
    moves
}
