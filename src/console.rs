use anyhow::{anyhow, bail, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::board::{PieceType, Square};
use crate::config::EngineConfig;
use crate::game::{AppliedMove, GameEvent, GameState, GameStatus, MoveOutcome};
use crate::notation::{format_coordinate, parse_coordinate};
use crate::opponent::{MoveAdvisor, MoveSource, Session};

const HELP: &str = "\
commands:
  new                          start a new game
  position startpos [moves ..] set up the start position, then play moves
  position fen <fen> [moves ..]
  fen                          print the current position as FEN
  board | d                    draw the board
  moves [square]               legal moves, optionally for one square
  move <e2e4[q]>               play a move
  promote <q|r|b|n>            finish a pending promotion
  undo                         take back the last move (and the engine reply)
  ai                           let the engine play the side to move
  status                       side to move, check and result
  history                      moves played so far
  eval                         static evaluation (positive favors white)
  help                         this text
  quit                         leave";

/// Line-oriented front end over a [`Session`].
pub struct Console<A> {
    session: Session<A>,
    cancel: CancellationToken,
}

impl<A: MoveAdvisor> Console<A> {
    pub fn new(game: GameState, config: EngineConfig, advisor: A) -> Self {
        Self {
            session: Session::new(game, config, advisor),
            cancel: CancellationToken::new(),
        }
    }

    pub fn session(&self) -> &Session<A> {
        &self.session
    }

    /// Cancelling aborts any advisor request in flight; the local selector
    /// still answers.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        // The engine may have the first move
        let opening = self.reply_if_automated(String::new()).await?;
        if !opening.is_empty() {
            stdout.write_all(format!("{}\n", opening).as_bytes()).await?;
        }

        while let Some(line) = lines.next_line().await? {
            let command = line.trim();
            if command == "quit" {
                break;
            }
            let response = match self.handle_command(command).await {
                Ok(response) => response,
                Err(err) => format!("error: {}", err),
            };
            if !response.is_empty() {
                stdout.write_all(format!("{}\n", response).as_bytes()).await?;
            }
            stdout.flush().await?;
        }
        Ok(())
    }

    pub async fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }
        debug!(command = %command, "console command");

        match parts[0] {
            "new" => {
                self.session.reset(GameState::new());
                self.reply_if_automated("new game".to_string()).await
            }
            "position" => {
                let fen = self.handle_position(&parts[1..])?;
                self.reply_if_automated(fen).await
            }
            "fen" => Ok(self.session.game().to_fen()),
            "board" | "d" => Ok(format!("{}\n{}", self.session.game().board(), self.session.game().to_fen())),
            "moves" => self.handle_moves(&parts[1..]),
            "move" => {
                let text = parts.get(1).ok_or_else(|| anyhow!("usage: move <e2e4[q]>"))?;
                let (from, to, promotion) = parse_coordinate(text)?;
                let out = match self.session.submit_move(from, to, promotion)? {
                    MoveOutcome::Applied(applied) => describe(&applied),
                    MoveOutcome::PromotionPending(pending) => {
                        return Ok(format!("promotion on {}: choose with promote <q|r|b|n>", pending.square()));
                    }
                };
                self.reply_if_automated(out).await
            }
            "promote" => {
                let letter = parts
                    .get(1)
                    .and_then(|s| s.chars().next())
                    .ok_or_else(|| anyhow!("usage: promote <q|r|b|n>"))?;
                let kind = PieceType::from_fen_char(letter).ok_or_else(|| anyhow!("unknown piece '{}'", letter))?;
                let applied = self.session.complete_promotion(kind)?;
                self.reply_if_automated(describe(&applied)).await
            }
            "undo" => {
                let undone = self.session.undo()?;
                let taken: Vec<&str> = undone.iter().map(|record| record.notation.as_str()).collect();
                let out = format!("took back {}\n{}", taken.join(" "), self.session.game().to_fen());
                self.reply_if_automated(out).await
            }
            "ai" => {
                let (chosen, applied) = self.session.play_automated(&self.cancel).await?;
                Ok(format!("{} ({})", describe(&applied), source_label(chosen.source)))
            }
            "status" => Ok(self.status()),
            "history" => Ok(self.history()),
            "eval" => {
                let score = self.session.opponent().selector().evaluator().evaluate(self.session.game().board());
                Ok(score.to_string())
            }
            "help" => Ok(HELP.to_string()),
            "quit" => Ok(String::new()),
            other => bail!("unknown command '{}', try help", other),
        }
    }

    fn handle_position(&mut self, parts: &[&str]) -> Result<String> {
        let (mut game, rest) = match parts.first() {
            Some(&"startpos") => (GameState::new(), &parts[1..]),
            Some(&"fen") => {
                if parts.len() < 7 {
                    bail!("usage: position fen <fen> [moves ..]");
                }
                (GameState::from_fen(&parts[1..7].join(" "))?, &parts[7..])
            }
            _ => bail!("usage: position startpos|fen <fen> [moves ..]"),
        };

        if let Some((&"moves", moves)) = rest.split_first() {
            for text in moves {
                let (from, to, promotion) = parse_coordinate(text)?;
                if let MoveOutcome::PromotionPending(_) = game.try_move(from, to, promotion)? {
                    game.complete_promotion(PieceType::Queen)?;
                }
            }
        }
        self.session.reset(game);
        Ok(self.session.game().to_fen())
    }

    fn handle_moves(&self, parts: &[&str]) -> Result<String> {
        let game = self.session.game();
        let moves = match parts.first() {
            Some(text) => {
                let square: Square = text.parse()?;
                game.legal_moves_from(square)
            }
            None => game.all_legal_moves(),
        };
        let list: Vec<String> = moves.iter().map(format_coordinate).collect();
        Ok(list.join(" "))
    }

    fn status(&self) -> String {
        let game = self.session.game();
        match game.status() {
            GameStatus::Checkmate { winner } => format!("checkmate, {} wins", winner),
            GameStatus::Stalemate => "stalemate".to_string(),
            GameStatus::Ongoing => {
                let mut out = format!("{} to move", game.turn());
                if game.check_status().is_in_check(game.turn()) {
                    out.push_str(", in check");
                }
                if let Some(pending) = game.pending_promotion() {
                    out.push_str(&format!(", promotion pending on {}", pending.square()));
                }
                out
            }
        }
    }

    fn history(&self) -> String {
        self.session
            .game()
            .history()
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| {
                let moves: Vec<&str> = pair.iter().map(|record| record.notation.as_str()).collect();
                format!("{}. {}", i + 1, moves.join(" "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn reply_if_automated(&mut self, mut out: String) -> Result<String> {
        if self.session.is_automated_turn() {
            let (chosen, applied) = self.session.play_automated(&self.cancel).await?;
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!(
                "{} plays {} ({})",
                chosen.mv.piece.color,
                describe(&applied),
                source_label(chosen.source)
            ));
        }
        Ok(out)
    }
}

fn describe(applied: &AppliedMove) -> String {
    let mut out = applied.record.notation.clone();
    for event in &applied.events {
        if let GameEvent::GameOver(status) = event {
            match status {
                GameStatus::Checkmate { winner } => out.push_str(&format!(" checkmate, {} wins", winner)),
                GameStatus::Stalemate => out.push_str(" stalemate"),
                GameStatus::Ongoing => {}
            }
        }
    }
    out
}

fn source_label(source: MoveSource) -> &'static str {
    match source {
        MoveSource::Advisor => "advisor",
        MoveSource::Local => "local",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;
    use crate::opponent::LocalOnly;

    fn console(automated_color: Option<Color>) -> Console<LocalOnly> {
        let config = EngineConfig {
            automated_color,
            seed: Some(3),
            ..EngineConfig::default()
        };
        Console::new(GameState::new(), config, LocalOnly)
    }

    #[tokio::test]
    async fn test_move_gets_automated_reply() {
        let mut console = console(Some(Color::Black));
        let out = console.handle_command("move e2e4").await.unwrap();
        assert!(out.starts_with("e4\nblack plays "));
        assert!(out.ends_with("(local)"));
        assert_eq!(console.session().game().history().len(), 2);
        assert_eq!(console.session().game().turn(), Color::White);
        assert!(console.handle_command("history").await.unwrap().starts_with("1. e4 "));
    }

    #[tokio::test]
    async fn test_illegal_move_is_reported() {
        let mut console = console(None);
        assert!(console.handle_command("move e2e5").await.is_err());
        assert!(console.handle_command("move e7e5").await.is_err());
        assert!(console.handle_command("move").await.is_err());
        assert!(console.handle_command("castle").await.is_err());
        assert_eq!(console.handle_command("fen").await.unwrap(), crate::fen::STARTING_POSITION);
    }

    #[tokio::test]
    async fn test_position_and_fen() {
        let mut console = console(None);
        let fen = console
            .handle_command("position startpos moves e2e4 e7e5 g1f3")
            .await
            .unwrap();
        assert_eq!(fen, "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2");
        assert_eq!(console.handle_command("fen").await.unwrap(), fen);

        let out = console
            .handle_command("position fen 7k/P7/8/8/8/8/8/4K3 w - - 0 1")
            .await
            .unwrap();
        assert_eq!(out, "7k/P7/8/8/8/8/8/4K3 w - - 0 1");
        assert!(console.handle_command("position fen 8/8 w").await.is_err());
        assert_eq!(console.handle_command("moves a7").await.unwrap(), "a7a8");
    }

    #[tokio::test]
    async fn test_position_hands_turn_to_engine() {
        let mut console = console(Some(Color::Black));
        let out = console.handle_command("position startpos moves e2e4").await.unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
        );
        assert!(lines.next().unwrap().starts_with("black plays "));
        assert_eq!(console.session().game().turn(), Color::White);
        assert!(console.handle_command("move d2d4").await.is_ok());
    }

    #[tokio::test]
    async fn test_undo_command() {
        let mut against_engine = console(Some(Color::Black));
        assert!(against_engine.handle_command("undo").await.is_err());
        against_engine.handle_command("move e2e4").await.unwrap();
        let out = against_engine.handle_command("undo").await.unwrap();
        assert!(out.starts_with("took back "));
        assert!(out.ends_with(crate::fen::STARTING_POSITION));
        assert!(against_engine.session().game().history().is_empty());

        let mut two_players = console(None);
        two_players.handle_command("move g1f3").await.unwrap();
        let out = two_players.handle_command("undo").await.unwrap();
        assert_eq!(out, format!("took back Nf3\n{}", crate::fen::STARTING_POSITION));
    }

    #[tokio::test]
    async fn test_promotion_dialog() {
        let mut console = console(None);
        console
            .handle_command("position fen 7k/P7/8/8/8/8/8/4K3 w - - 0 1")
            .await
            .unwrap();
        let out = console.handle_command("move a7a8").await.unwrap();
        assert!(out.starts_with("promotion on a8"));
        assert!(console.handle_command("status").await.unwrap().contains("promotion pending"));
        assert!(console.handle_command("move e1e2").await.is_err());
        assert_eq!(console.handle_command("promote n").await.unwrap(), "a8=N");
        assert_eq!(console.handle_command("status").await.unwrap(), "black to move");
    }

    #[tokio::test]
    async fn test_mate_is_announced() {
        let mut console = console(None);
        for mv in ["f2f3", "e7e5", "g2g4"] {
            console.handle_command(&format!("move {}", mv)).await.unwrap();
        }
        let out = console.handle_command("move d8h4").await.unwrap();
        assert_eq!(out, "Qh4# checkmate, black wins");
        assert_eq!(console.handle_command("status").await.unwrap(), "checkmate, black wins");
        assert!(console.handle_command("ai").await.is_err());
    }

    #[tokio::test]
    async fn test_eval_and_ai() {
        let mut console = console(None);
        assert_eq!(console.handle_command("eval").await.unwrap(), "0");
        let out = console.handle_command("ai").await.unwrap();
        assert!(out.ends_with("(local)"));
        assert_eq!(console.session().game().turn(), Color::Black);
    }
}
