use rand::Rng;
use tracing::debug;

use crate::board::{Board, Color, PieceType};
use crate::check::simulate;
use crate::movegen::Move;

pub struct Evaluator {
    // Piece values
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,
    pub king_value: i32,

    // Positional bonuses, rank 8 first from white's point of view
    pub pawn_position_bonus: [[i32; 8]; 8],
    pub knight_position_bonus: [[i32; 8]; 8],
    pub bishop_position_bonus: [[i32; 8]; 8],
    pub rook_position_bonus: [[i32; 8]; 8],
    pub queen_position_bonus: [[i32; 8]; 8],
    pub king_position_bonus: [[i32; 8]; 8],
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 320,
            bishop_value: 330,
            rook_value: 500,
            queen_value: 900,
            king_value: 20000,

            // Pawn position bonuses (encourages central control and advancement)
            pawn_position_bonus: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [50, 50, 50, 50, 50, 50, 50, 50],
                [10, 10, 20, 30, 30, 20, 10, 10],
                [5, 5, 10, 25, 25, 10, 5, 5],
                [0, 0, 0, 20, 20, 0, 0, 0],
                [5, -5, -10, 0, 0, -10, -5, 5],
                [5, 10, 10, -20, -20, 10, 10, 5],
                [0, 0, 0, 0, 0, 0, 0, 0],
            ],

            // Knight position bonuses (encourages central control)
            knight_position_bonus: [
                [-50, -40, -30, -30, -30, -30, -40, -50],
                [-40, -20, 0, 0, 0, 0, -20, -40],
                [-30, 0, 10, 15, 15, 10, 0, -30],
                [-30, 5, 15, 20, 20, 15, 5, -30],
                [-30, 0, 15, 20, 20, 15, 0, -30],
                [-30, 5, 10, 15, 15, 10, 5, -30],
                [-40, -20, 0, 5, 5, 0, -20, -40],
                [-50, -40, -30, -30, -30, -30, -40, -50],
            ],

            // Bishop position bonuses (long diagonals)
            bishop_position_bonus: [
                [-20, -10, -10, -10, -10, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 10, 10, 10, 10, 0, -10],
                [-10, 5, 5, 10, 10, 5, 5, -10],
                [-10, 0, 10, 10, 10, 10, 0, -10],
                [-10, 10, 10, 10, 10, 10, 10, -10],
                [-10, 5, 0, 0, 0, 0, 5, -10],
                [-20, -10, -10, -10, -10, -10, -10, -20],
            ],

            // Rook position bonuses (seventh rank and central files)
            rook_position_bonus: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [5, 10, 10, 10, 10, 10, 10, 5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [0, 0, 0, 5, 5, 0, 0, 0],
            ],

            queen_position_bonus: [
                [-20, -10, -10, -5, -5, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 5, 5, 5, 5, 0, -10],
                [-5, 0, 5, 5, 5, 5, 0, -5],
                [0, 0, 5, 5, 5, 5, 0, -5],
                [-10, 5, 5, 5, 5, 5, 0, -10],
                [-10, 0, 5, 0, 0, 0, 0, -10],
                [-20, -10, -10, -5, -5, -10, -10, -20],
            ],

            // King position bonuses (stay castled behind the pawns)
            king_position_bonus: [
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-20, -30, -30, -40, -40, -30, -30, -20],
                [-10, -20, -20, -20, -20, -20, -20, -10],
                [20, 20, 0, 0, 0, 0, 20, 20],
                [20, 30, 10, 0, 0, 10, 30, 20],
            ],
        }
    }

    /// Material plus placement. Positive favors white.
    pub fn evaluate(&self, board: &Board) -> i32 {
        let mut score = 0;
        for (square, piece) in board.pieces() {
            // Black reads the tables mirrored top to bottom
            let row = match piece.color {
                Color::White => square.row as usize,
                Color::Black => 7 - square.row as usize,
            };
            let value = self.get_piece_value(piece.kind, row, square.col as usize);
            score += if piece.color == Color::White { value } else { -value };
        }
        score
    }

    fn get_piece_value(&self, kind: PieceType, row: usize, col: usize) -> i32 {
        let (base_value, table) = match kind {
            PieceType::Pawn => (self.pawn_value, &self.pawn_position_bonus),
            PieceType::Knight => (self.knight_value, &self.knight_position_bonus),
            PieceType::Bishop => (self.bishop_value, &self.bishop_position_bonus),
            PieceType::Rook => (self.rook_value, &self.rook_position_bonus),
            PieceType::Queen => (self.queen_value, &self.queen_position_bonus),
            PieceType::King => (self.king_value, &self.king_position_bonus),
        };
        base_value + table[row][col]
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// One-ply move picker: scores the position after each candidate and picks
/// at random among the best `pool` for the mover.
pub struct MoveSelector {
    evaluator: Evaluator,
    pool: usize,
    promotion: PieceType,
}

impl MoveSelector {
    pub fn new(pool: usize) -> Self {
        Self {
            evaluator: Evaluator::new(),
            pool: pool.max(1),
            promotion: PieceType::Queen,
        }
    }

    /// Piece chosen for promotions the candidates leave open.
    pub fn with_promotion(mut self, kind: PieceType) -> Self {
        if kind.is_promotion_choice() {
            self.promotion = kind;
        }
        self
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn select_move<R: Rng>(&self, board: &Board, candidates: &[Move], rng: &mut R) -> Option<Move> {
        let mover = candidates.first()?.piece.color;

        let mut scored: Vec<(Move, i32)> = candidates
            .iter()
            .map(|&mv| {
                let mv = if mv.is_promotion_move() && mv.promotion.is_none() {
                    mv.with_promotion(self.promotion)
                } else {
                    mv
                };
                (mv, self.evaluator.evaluate(&simulate(board, &mv)))
            })
            .collect();

        match mover {
            Color::White => scored.sort_by(|a, b| b.1.cmp(&a.1)),
            Color::Black => scored.sort_by(|a, b| a.1.cmp(&b.1)),
        }

        let top = self.pool.min(scored.len());
        let (mv, score) = scored[rng.gen_range(0..top)];
        debug!(from = %mv.from, to = %mv.to, score, candidates = scored.len(), "selected move");
        Some(mv)
    }
}

impl Default for MoveSelector {
    fn default() -> Self {
        Self::new(3)
    }
}
