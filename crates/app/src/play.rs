use std::io::Write;

use lingua_core::model::QuestionView;
use services::{
    Advanced, LinguaServices, ProgressionController, RunError, RunSummary, Transition,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

const QUIT: &str = ":quit";

struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` on end of input or `:quit`.
    async fn ask(&mut self, prompt: &str) -> AppResult<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        match self.lines.next_line().await? {
            Some(line) if line.trim() == QUIT => Ok(None),
            other => Ok(other),
        }
    }
}

pub async fn play(services: &LinguaServices, player: Option<String>) -> AppResult<()> {
    let mut term = Terminal::new();
    let mut run = services.new_run()?;

    let mut view = match start(&mut run, &mut term, player).await? {
        Some(view) => view,
        None => return Ok(()),
    };

    loop {
        show(&run, &view);
        let Some(answer) = term.ask("> ").await? else {
            break;
        };

        let result = run.submit_answer(&answer).await?;
        println!("{}", result.message);

        let summary = match result.transition {
            Transition::Retry { attempts_remaining } => {
                println!("attempts left: {attempts_remaining}");
                continue;
            }
            Transition::Unchanged => continue,
            Transition::Advancing { .. } => match run.advance().await? {
                Advanced::Next(next) => {
                    view = next;
                    continue;
                }
                Advanced::Completed(summary) => summary,
            },
            Transition::GameOver(summary) => {
                println!("Game over.");
                summary
            }
            Transition::Completed(summary) => {
                println!("You finished every sublevel!");
                summary
            }
        };

        report(&summary);
        print_leaderboard(services, None).await?;

        match again(&mut run, &mut term).await? {
            Some(next) => view = next,
            None => break,
        }
    }

    if run.has_pending_high_score() {
        if let Err(err) = run.finalize_high_score().await {
            eprintln!("score could not be saved: {err}");
        }
    }
    Ok(())
}

async fn start(
    run: &mut ProgressionController,
    term: &mut Terminal,
    mut player: Option<String>,
) -> AppResult<Option<QuestionView>> {
    loop {
        let name = match player.take() {
            Some(name) => name,
            None => match term.ask("Your name: ").await? {
                Some(name) => name,
                None => return Ok(None),
            },
        };
        match run.start_run(&name).await {
            Ok(view) => return Ok(Some(view)),
            Err(RunError::Name(err)) => println!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }
}

async fn again(
    run: &mut ProgressionController,
    term: &mut Terminal,
) -> AppResult<Option<QuestionView>> {
    loop {
        let Some(reply) = term.ask("Play again? [y/N] ").await? else {
            return Ok(None);
        };
        if !reply.trim().eq_ignore_ascii_case("y") {
            return Ok(None);
        }
        match run.restart().await {
            Ok(view) => return Ok(Some(view)),
            Err(RunError::Storage(err)) => println!("score could not be saved yet: {err}"),
            Err(err) => return Err(err.into()),
        }
    }
}

fn show(run: &ProgressionController, view: &QuestionView) {
    let state = run.state();
    let progress = run.progress();
    println!();
    println!(
        "[{}] sublevel {}/{} ({}%)  score {}  attempts {}",
        view.topic,
        progress.current,
        progress.total,
        progress.percent,
        state.score(),
        state.attempts_remaining()
    );
    println!("{}", view.prompt);
    if let Some(hint) = &view.hint {
        println!("hint: {hint}");
    }
}

fn report(summary: &RunSummary) {
    println!(
        "{} scored {}.",
        summary.entry.player(),
        summary.entry.score()
    );
    if summary.is_new_high_score {
        println!("New high score!");
    }
    if !summary.is_saved() {
        println!("(score not saved yet; it will be retried)");
    }
}

pub async fn print_leaderboard(services: &LinguaServices, limit: Option<u32>) -> AppResult<()> {
    let items = services.high_scores().leaderboard(limit).await?;
    println!();
    println!("High scores");
    if items.is_empty() {
        println!("  (none yet)");
    }
    for item in items {
        println!(
            "  {:>2}. {:<20} {:>6}  {}",
            item.rank,
            item.player,
            item.score,
            item.recorded_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}
