//! The automated opponent.
//!
//! Moves come from a two-stage pipeline. An external [`MoveAdvisor`] is asked
//! first; its answer is checked against the legal move list. If it is missing,
//! late, cancelled or unusable, the local [`MoveSelector`] picks instead, which
//! always succeeds while the side to move has a legal move.

use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::board::{Color, PieceType, Square};
use crate::config::EngineConfig;
use crate::error::{AdvisorError, GameError, Result};
use crate::evaluation::MoveSelector;
use crate::game::{AppliedMove, GameState, MoveOutcome, MoveRecord};
use crate::movegen::Move;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceRequest {
    pub fen: String,
    pub turn: Color,
}

impl AdviceRequest {
    pub fn from_game(game: &GameState) -> Self {
        Self {
            fen: game.to_fen(),
            turn: game.turn(),
        }
    }
}

/// A suggestion as returned by an analysis service. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisedMove {
    pub from: String,
    pub to: String,
    #[serde(default, alias = "move", alias = "san")]
    pub notation: Option<String>,
    #[serde(default)]
    pub promotion: Option<String>,
}

impl AdvisedMove {
    pub fn from_json(json: &str) -> std::result::Result<Self, AdvisorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Matches the suggestion against the legal moves of `game`. An open
    /// promotion takes `default_promotion`.
    pub fn resolve(&self, game: &GameState, default_promotion: PieceType) -> std::result::Result<Move, AdvisorError> {
        let from: Square = self
            .from
            .parse()
            .map_err(|e| AdvisorError::Unusable(format!("from: {}", e)))?;
        let to: Square = self
            .to
            .parse()
            .map_err(|e| AdvisorError::Unusable(format!("to: {}", e)))?;
        let promotion = match self.promotion.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => {
                let kind = text
                    .chars()
                    .next()
                    .and_then(PieceType::from_fen_char)
                    .filter(|kind| kind.is_promotion_choice())
                    .ok_or_else(|| AdvisorError::Unusable(format!("promotion {:?}", text)))?;
                Some(kind)
            }
        };

        let mv = game
            .legal_moves_from(from)
            .into_iter()
            .find(|mv| mv.to == to)
            .ok_or_else(|| AdvisorError::Unusable(format!("{}{} is not legal", from, to)))?;

        match (mv.is_promotion_move(), promotion) {
            (true, Some(kind)) => Ok(mv.with_promotion(kind)),
            (true, None) => Ok(mv.with_promotion(default_promotion)),
            (false, None) => Ok(mv),
            (false, Some(_)) => Err(AdvisorError::Unusable(format!("{}{} does not promote", from, to))),
        }
    }
}

pub trait MoveAdvisor {
    fn advise(&self, request: &AdviceRequest) -> impl Future<Output = std::result::Result<AdvisedMove, AdvisorError>> + Send;
}

/// No external engine; every request goes straight to the local selector.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOnly;

impl MoveAdvisor for LocalOnly {
    fn advise(&self, _request: &AdviceRequest) -> impl Future<Output = std::result::Result<AdvisedMove, AdvisorError>> + Send {
        std::future::ready(Err(AdvisorError::Unavailable))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    Advisor,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChosenMove {
    pub mv: Move,
    pub source: MoveSource,
}

pub struct AutomatedOpponent<A> {
    advisor: A,
    selector: MoveSelector,
    rng: StdRng,
    timeout: Option<Duration>,
    promotion: PieceType,
}

impl<A: MoveAdvisor> AutomatedOpponent<A> {
    pub fn new(advisor: A, config: &EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            advisor,
            selector: MoveSelector::new(config.selection_pool).with_promotion(config.automated_promotion),
            rng,
            timeout: config.advisor_timeout(),
            promotion: config.automated_promotion,
        }
    }

    pub fn selector(&self) -> &MoveSelector {
        &self.selector
    }

    /// Picks a move for the side to move in `game`. Advisor failures are
    /// logged and never returned.
    pub async fn choose_move(&mut self, game: &GameState, cancel: &CancellationToken) -> Result<ChosenMove> {
        if game.is_over() {
            return Err(GameError::GameOver);
        }
        let legal = game.all_legal_moves();
        if legal.is_empty() {
            return Err(GameError::NoLegalMoves);
        }

        let advised = self
            .ask_advisor(game, cancel)
            .await
            .and_then(|advice| advice.resolve(game, self.promotion));
        match advised {
            Ok(mv) => {
                info!(from = %mv.from, to = %mv.to, source = "advisor", "automated move chosen");
                return Ok(ChosenMove {
                    mv,
                    source: MoveSource::Advisor,
                });
            }
            Err(AdvisorError::Unavailable) => debug!("no advisor, using local selector"),
            Err(err) => warn!(error = %err, "advisor failed, falling back to local selector"),
        }

        let mv = self
            .selector
            .select_move(game.board(), &legal, &mut self.rng)
            .ok_or(GameError::NoLegalMoves)?;
        info!(from = %mv.from, to = %mv.to, source = "local", "automated move chosen");
        Ok(ChosenMove {
            mv,
            source: MoveSource::Local,
        })
    }

    async fn ask_advisor(&self, game: &GameState, cancel: &CancellationToken) -> std::result::Result<AdvisedMove, AdvisorError> {
        let request = AdviceRequest::from_game(game);
        let advice = self.advisor.advise(&request);
        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, advice).await {
                    Ok(result) => result,
                    Err(_) => Err(AdvisorError::Timeout),
                },
                None => advice.await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AdvisorError::Cancelled),
            result = bounded => result,
        }
    }
}

/// Owns the authoritative game. Automated moves borrow the session mutably
/// for their whole duration, so no other move can land in between.
pub struct Session<A> {
    game: GameState,
    config: EngineConfig,
    opponent: AutomatedOpponent<A>,
}

impl<A: MoveAdvisor> Session<A> {
    pub fn new(game: GameState, config: EngineConfig, advisor: A) -> Self {
        let opponent = AutomatedOpponent::new(advisor, &config);
        Self { game, config, opponent }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn opponent(&self) -> &AutomatedOpponent<A> {
        &self.opponent
    }

    pub fn reset(&mut self, game: GameState) {
        self.game = game;
    }

    pub fn set_automated_color(&mut self, color: Option<Color>) {
        self.config.automated_color = color;
    }

    pub fn is_automated_turn(&self) -> bool {
        !self.game.is_over() && self.config.automated_color == Some(self.game.turn())
    }

    /// A move from the human side.
    pub fn submit_move(&mut self, from: Square, to: Square, promotion: Option<PieceType>) -> Result<MoveOutcome> {
        if self.is_automated_turn() {
            return Err(GameError::AwaitingOpponent);
        }
        self.game.try_move(from, to, promotion)
    }

    pub fn complete_promotion(&mut self, kind: PieceType) -> Result<AppliedMove> {
        self.game.complete_promotion(kind)
    }

    /// Takes back the last move. When that hands the turn to the automated
    /// side, its earlier reply goes too, so the human is to move again.
    /// Returns the removed records, most recent first.
    pub fn undo(&mut self) -> Result<Vec<MoveRecord>> {
        let mut undone = vec![self.game.undo()?];
        while self.is_automated_turn() && !self.game.history().is_empty() {
            undone.push(self.game.undo()?);
        }
        Ok(undone)
    }

    /// Lets the engine play the side to move.
    pub async fn play_automated(&mut self, cancel: &CancellationToken) -> Result<(ChosenMove, AppliedMove)> {
        if self.game.pending_promotion().is_some() {
            return Err(GameError::PromotionPending);
        }
        let chosen = self.opponent.choose_move(&self.game, cancel).await?;
        let applied = match self.game.apply_move(&chosen.mv)? {
            MoveOutcome::Applied(applied) => applied,
            MoveOutcome::PromotionPending(_) => self.game.complete_promotion(self.config.automated_promotion)?,
        };
        Ok((chosen, applied))
    }
}
