//! Line-oriented quiz loops.
//!
//! Everything here reads answers from a `BufRead` and writes prompts to a
//! `Write`, so the binary passes stdin/stdout and the tests pass buffers.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use drill_core::kanji::{KanjiEntry, KanjiOrder};
use drill_core::model::SessionSummary;
use rand::Rng;
use serde_json::{Map, Value};
use services::{DailyStats, DrillRun, HistoryRecord, HistoryStore, KanjiDrill, KanjiDrillService};

/// Print `prompt` and read one line. `None` means the input is closed.
pub fn read_line<I: BufRead, W: Write>(
    input: &mut I,
    out: &mut W,
    prompt: &str,
) -> io::Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn ask_again<I: BufRead, W: Write>(input: &mut I, out: &mut W) -> io::Result<bool> {
    let answer = read_line(input, out, "again? [y/N] ")?;
    Ok(matches!(answer.as_deref(), Some("y" | "Y" | "yes")))
}

/// Ask every remaining problem of `run`.
///
/// Returns `false` if the input closed before the last answer.
pub fn ask_problems<R: Rng, I: BufRead, W: Write>(
    run: &mut DrillRun<R>,
    input: &mut I,
    out: &mut W,
) -> Result<bool> {
    while let Some(problem) = run.current()? {
        let problem = problem.clone();
        writeln!(
            out,
            "[{}/{}] {}",
            run.question_number()?,
            run.size()?,
            problem.prompt()
        )?;

        let Some(answer) = read_line(input, out, "> ")? else {
            return Ok(false);
        };
        let remainder = if problem.requires_remainder() {
            match read_line(input, out, "remainder> ")? {
                Some(r) => Some(r),
                None => return Ok(false),
            }
        } else {
            None
        };

        let outcome = run.submit(&answer, remainder.as_deref())?;
        if outcome.is_correct {
            writeln!(out, "  ○")?;
        } else {
            writeln!(out, "  × {}", outcome.problem.solution())?;
        }
    }
    Ok(true)
}

/// Run `run` to the end, record it, and offer another round until declined.
///
/// A round cut short by closed input is not recorded.
pub fn drill_loop<R: Rng, I: BufRead, W: Write>(
    run: &mut DrillRun<R>,
    history: &HistoryStore,
    extra: &Map<String, Value>,
    input: &mut I,
    out: &mut W,
) -> Result<()> {
    loop {
        if !ask_problems(run, input, out)? {
            writeln!(out)?;
            writeln!(out, "stopped early; nothing recorded")?;
            return Ok(());
        }
        writeln!(out, "{}", format_summary(&run.summary()))?;
        run.finish(history, extra.clone())?;

        if !ask_again(input, out)? {
            return Ok(());
        }
        run.retry()?;
    }
}

/// Show each kanji, reveal its readings on Enter.
///
/// Returns `false` if the input closed before the last kanji.
pub fn show_kanji<I: BufRead, W: Write>(
    drill: &mut KanjiDrill,
    input: &mut I,
    out: &mut W,
) -> Result<bool> {
    if drill.progress_reset() {
        writeln!(out, "every kanji of grade {} was shown; starting over", drill.grade())?;
    }
    while let Some(entry) = drill.current()? {
        let entry = entry.clone();
        writeln!(
            out,
            "[{}/{}] {}  ({} strokes)",
            drill.question_number()?,
            drill.size()?,
            entry.kanji,
            entry.strokes
        )?;
        if read_line(input, out, "(enter to reveal) ")?.is_none() {
            return Ok(false);
        }
        writeln!(out, "  {}", format_readings(&entry))?;
        drill.advance()?;
    }
    Ok(true)
}

/// Kanji batches for one grade until the learner declines another.
#[allow(clippy::too_many_arguments)]
pub fn kanji_loop<R: Rng, I: BufRead, W: Write>(
    service: &KanjiDrillService,
    entries: &[KanjiEntry],
    grade: u8,
    order: KanjiOrder,
    history: &HistoryStore,
    rng: &mut R,
    input: &mut I,
    out: &mut W,
) -> Result<()> {
    loop {
        let mut drill = service.start(entries, grade, order, rng)?;
        if !show_kanji(&mut drill, input, out)? {
            writeln!(out)?;
            writeln!(out, "stopped early; nothing recorded")?;
            return Ok(());
        }
        let record = service.finish(&drill, history)?;
        writeln!(out, "done: {}", drill.kanji_list()?)?;
        tracing::debug!(date = %record.date, "kanji batch recorded");

        if !ask_again(input, out)? {
            return Ok(());
        }
    }
}

fn format_readings(entry: &KanjiEntry) -> String {
    let kun = entry.kun_reading.as_deref().unwrap_or("-");
    let on = entry.on_reading.as_deref().unwrap_or("-");
    format!("kun: {kun}  on: {on}")
}

/// `7/10 correct (70%) in 1:05`
#[must_use]
pub fn format_summary(summary: &SessionSummary) -> String {
    let seconds = summary.elapsed_ms / 1000;
    format!(
        "{}/{} correct ({}%) in {}:{:02}",
        summary.correct_count,
        summary.total_count,
        summary.correct_rate_percent,
        seconds / 60,
        seconds % 60
    )
}

#[must_use]
pub fn format_record(record: &HistoryRecord) -> String {
    let mut line = format!(
        "{} {}  {}/{} ({}%)",
        record.date,
        record.time,
        record.correct_count,
        record.total_count,
        record.correct_rate_percent
    );
    if !record.extra.is_empty() {
        line.push_str("  ");
        line.push_str(&Value::Object(record.extra.clone()).to_string());
    }
    line
}

#[must_use]
pub fn format_stats(stats: &DailyStats) -> String {
    format!(
        "{}  {} attempt(s), {}/{} ({}%)",
        stats.date,
        stats.attempts,
        stats.total_correct,
        stats.total_questions,
        stats.correct_rate_percent
    )
}
