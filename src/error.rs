//! Error types for chess-referee

use thiserror::Error;

use crate::board::{PieceType, Square};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    #[error("square must be two characters, got {0:?}")]
    Length(String),

    #[error("invalid file {0:?}")]
    File(char),

    #[error("invalid rank {0:?}")]
    Rank(char),

    #[error("invalid coordinate move {0:?}")]
    Move(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 6 fields, found {0}")]
    FieldCount(usize),

    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),

    #[error("rank {rank} describes {width} squares instead of 8")]
    RankWidth { rank: usize, width: usize },

    #[error("invalid piece character {0:?}")]
    InvalidPiece(char),

    #[error("invalid side to move {0:?}")]
    InvalidTurn(String),

    #[error("invalid castling field {0:?}")]
    InvalidCastling(String),

    #[error("invalid en passant field {0:?}")]
    InvalidEnPassant(String),

    #[error("invalid move counter {0:?}")]
    InvalidCounter(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("no piece on {0}")]
    EmptySquare(Square),

    #[error("piece on {0} belongs to the opponent")]
    NotYourPiece(Square),

    #[error("illegal move {from}{to}")]
    IllegalMove { from: Square, to: Square },

    #[error("a promotion choice is pending")]
    PromotionPending,

    #[error("no promotion is pending")]
    NoPendingPromotion,

    #[error("cannot promote to {0}")]
    InvalidPromotion(PieceType),

    #[error("the game is over")]
    GameOver,

    #[error("waiting for the automated opponent")]
    AwaitingOpponent,

    #[error("no legal moves available")]
    NoLegalMoves,

    #[error("no move to take back")]
    NothingToUndo,
}

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("no advisor configured")]
    Unavailable,

    #[error("advisor request cancelled")]
    Cancelled,

    #[error("advisor timed out")]
    Timeout,

    #[error("advisor transport failed: {0}")]
    Transport(String),

    #[error("advisor response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("advisor suggested an unusable move: {0}")]
    Unusable(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
