use tracing::{debug, info};

use crate::board::{Board, Color, Piece, PieceType, Square};
use crate::check::{all_legal_moves, has_any_legal_move, is_in_check, legal_moves_from};
use crate::error::{FenError, GameError, Result};
use crate::fen;
use crate::movegen::{EnPassantTarget, Move};
use crate::notation::to_san;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_kingside: true,
        white_queenside: true,
        black_kingside: true,
        black_queenside: true,
    };

    pub const NONE: CastlingRights = CastlingRights {
        white_kingside: false,
        white_queenside: false,
        black_kingside: false,
        black_queenside: false,
    };

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    pub fn clear_color(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Clears the right tied to a rook corner; other squares are ignored.
    pub fn clear_corner(&mut self, square: Square) {
        match (square.row, square.col) {
            (7, 0) => self.white_queenside = false,
            (7, 7) => self.white_kingside = false,
            (0, 0) => self.black_queenside = false,
            (0, 7) => self.black_kingside = false,
            _ => {}
        }
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        CastlingRights::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckStatus {
    pub white: bool,
    pub black: bool,
}

impl CheckStatus {
    pub fn of(board: &Board) -> Self {
        Self {
            white: is_in_check(Color::White, board),
            black: is_in_check(Color::Black, board),
        }
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub mv: Move,
    pub notation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    MoveApplied {
        from: Square,
        to: Square,
        piece: Piece,
        captured_piece: Option<Piece>,
        is_castling: bool,
        notation: String,
    },
    GameOver(GameStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub record: MoveRecord,
    pub events: Vec<GameEvent>,
}

/// A pawn has reached the last rank and waits for its new piece type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPromotion {
    pub mv: Move,
}

impl PendingPromotion {
    pub fn color(&self) -> Color {
        self.mv.piece.color
    }

    pub fn square(&self) -> Square {
        self.mv.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied(AppliedMove),
    PromotionPending(PendingPromotion),
}

/// Everything a move changes, saved before the move so it can be taken back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    board: Board,
    turn: Color,
    castling_rights: CastlingRights,
    en_passant: Option<EnPassantTarget>,
    halfmove_clock: u32,
    fullmove_number: u32,
    check_status: CheckStatus,
    status: GameStatus,
}

/// Authoritative state of one game. Collaborators get clones or FEN strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    turn: Color,
    castling_rights: CastlingRights,
    en_passant: Option<EnPassantTarget>,
    halfmove_clock: u32,
    fullmove_number: u32,
    history: Vec<MoveRecord>,
    undo_stack: Vec<Snapshot>,
    pending_promotion: Option<PendingPromotion>,
    check_status: CheckStatus,
    status: GameStatus,
}

impl GameState {
    pub fn new() -> Self {
        Self::from_parts(Board::initial(), Color::White, CastlingRights::ALL, None, 0, 1)
    }

    pub fn from_parts(
        board: Board,
        turn: Color,
        castling_rights: CastlingRights,
        en_passant: Option<EnPassantTarget>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        let mut state = Self {
            board,
            turn,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
            history: Vec::new(),
            undo_stack: Vec::new(),
            pending_promotion: None,
            check_status: CheckStatus::default(),
            status: GameStatus::Ongoing,
        };
        state.refresh_status();
        state
    }

    pub fn from_fen(input: &str) -> Result<Self, FenError> {
        fen::decode(input)
    }

    pub fn to_fen(&self) -> String {
        fen::encode(self)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant(&self) -> Option<&EnPassantTarget> {
        self.en_passant.as_ref()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn pending_promotion(&self) -> Option<&PendingPromotion> {
        self.pending_promotion.as_ref()
    }

    pub fn check_status(&self) -> CheckStatus {
        self.check_status
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    /// Legal moves of the piece on `square`; empty for an empty square or an
    /// opponent piece.
    pub fn legal_moves_from(&self, square: Square) -> Vec<Move> {
        match self.board.get(square) {
            Some(piece) if piece.color == self.turn => {
                legal_moves_from(square, &self.board, self.en_passant.as_ref())
            }
            _ => Vec::new(),
        }
    }

    pub fn all_legal_moves(&self) -> Vec<Move> {
        all_legal_moves(self.turn, &self.board, self.en_passant.as_ref())
    }

    /// Plays a move given by its squares. A pawn reaching the last rank without
    /// `promotion` leaves the game waiting in [`GameState::complete_promotion`].
    pub fn try_move(&mut self, from: Square, to: Square, promotion: Option<PieceType>) -> Result<MoveOutcome> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if self.pending_promotion.is_some() {
            return Err(GameError::PromotionPending);
        }
        let piece = self.board.get(from).ok_or(GameError::EmptySquare(from))?;
        if piece.color != self.turn {
            return Err(GameError::NotYourPiece(from));
        }
        let mv = self
            .legal_moves_from(from)
            .into_iter()
            .find(|mv| mv.to == to)
            .ok_or(GameError::IllegalMove { from, to })?;

        match promotion {
            Some(_) if !mv.is_promotion_move() => Err(GameError::IllegalMove { from, to }),
            Some(kind) if !kind.is_promotion_choice() => Err(GameError::InvalidPromotion(kind)),
            Some(kind) => Ok(MoveOutcome::Applied(self.finalize(mv.with_promotion(kind)))),
            None if mv.is_promotion_move() => {
                let pending = PendingPromotion { mv };
                debug!(from = %from, to = %to, "promotion pending");
                self.pending_promotion = Some(pending);
                Ok(MoveOutcome::PromotionPending(pending))
            }
            None => Ok(MoveOutcome::Applied(self.finalize(mv))),
        }
    }

    pub fn apply_move(&mut self, mv: &Move) -> Result<MoveOutcome> {
        self.try_move(mv.from, mv.to, mv.promotion)
    }

    /// Finishes a pending promotion. An invalid choice keeps it pending.
    pub fn complete_promotion(&mut self, kind: PieceType) -> Result<AppliedMove> {
        let pending = self.pending_promotion.ok_or(GameError::NoPendingPromotion)?;
        if !kind.is_promotion_choice() {
            return Err(GameError::InvalidPromotion(kind));
        }
        self.pending_promotion = None;
        Ok(self.finalize(pending.mv.with_promotion(kind)))
    }

    /// Takes back the last move and restores the position before it, clocks
    /// and castling rights included. Finishing or abandoning a pending
    /// promotion comes first.
    pub fn undo(&mut self) -> Result<MoveRecord> {
        if self.pending_promotion.is_some() {
            return Err(GameError::PromotionPending);
        }
        let (record, snapshot) = match (self.history.pop(), self.undo_stack.pop()) {
            (Some(record), Some(snapshot)) => (record, snapshot),
            _ => return Err(GameError::NothingToUndo),
        };
        self.restore(snapshot);
        debug!(notation = %record.notation, fen = %self.to_fen(), "move taken back");
        Ok(record)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board,
            turn: self.turn,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            check_status: self.check_status,
            status: self.status,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.board = snapshot.board;
        self.turn = snapshot.turn;
        self.castling_rights = snapshot.castling_rights;
        self.en_passant = snapshot.en_passant;
        self.halfmove_clock = snapshot.halfmove_clock;
        self.fullmove_number = snapshot.fullmove_number;
        self.check_status = snapshot.check_status;
        self.status = snapshot.status;
    }

    /// Applies an already validated move and records it.
    fn finalize(&mut self, mv: Move) -> AppliedMove {
        let before = self.snapshot();
        let board_before = self.board;
        let en_passant_before = self.en_passant;
        let mover = mv.piece.color;

        let mut captured = None;
        if mv.is_en_passant {
            if let Some(victim) = mv.captured_pawn_position {
                captured = self.board.take(victim);
            }
        }
        let mut moving = self.board.take(mv.from).unwrap_or(mv.piece);
        if let Some(victim) = self.board.take(mv.to) {
            captured = Some(victim);
        }
        moving.has_moved = true;
        if let Some(kind) = mv.promotion {
            moving.kind = kind;
            moving.promoted = true;
        }
        self.board.set(mv.to, moving);
        if let Some(rook_move) = mv.rook_move {
            if let Some(mut rook) = self.board.take(rook_move.from) {
                rook.has_moved = true;
                self.board.set(rook_move.to, rook);
            }
        }

        if mv.piece.kind == PieceType::King {
            self.castling_rights.clear_color(mover);
        }
        self.castling_rights.clear_corner(mv.from);
        self.castling_rights.clear_corner(mv.to);

        if mv.piece.kind == PieceType::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        // Counters decoded from FEN may already sit at the top of the range
        if mover == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.en_passant = if mv.is_double_step() {
            Some(EnPassantTarget {
                row: (mv.from.row + mv.to.row) / 2,
                col: mv.from.col,
                pawn_position: mv.to,
                color: mover,
            })
        } else {
            None
        };

        self.turn = mover.opposite();
        self.refresh_status();

        let is_check = self.check_status.is_in_check(self.turn);
        let is_checkmate = matches!(self.status, GameStatus::Checkmate { .. });
        let recorded = Move {
            captured_piece: captured,
            ..mv
        };
        let notation = to_san(&recorded, &board_before, en_passant_before.as_ref(), is_check, is_checkmate);
        debug!(notation = %notation, fen = %self.to_fen(), "move applied");

        let record = MoveRecord {
            mv: recorded,
            notation: notation.clone(),
        };
        self.history.push(record.clone());
        self.undo_stack.push(before);

        let mut events = vec![GameEvent::MoveApplied {
            from: mv.from,
            to: mv.to,
            piece: moving,
            captured_piece: captured,
            is_castling: mv.is_castling,
            notation,
        }];
        if self.status.is_over() {
            info!(status = ?self.status, "game over");
            events.push(GameEvent::GameOver(self.status));
        }

        AppliedMove { record, events }
    }

    fn refresh_status(&mut self) {
        self.check_status = CheckStatus::of(&self.board);
        self.status = if has_any_legal_move(self.turn, &self.board, self.en_passant.as_ref()) {
            GameStatus::Ongoing
        } else if self.check_status.is_in_check(self.turn) {
            GameStatus::Checkmate {
                winner: self.turn.opposite(),
            }
        } else {
            GameStatus::Stalemate
        };
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}
