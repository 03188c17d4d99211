//! Interactive review over stdin.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use trails_core::{CardDraft, CardReview, DeckManager, Rating, ReviewState, TrailsError};

const HELP: &str = "f flip | n next | p previous | 1 hard | 2 good | 3 easy | e edit | d delete | q quit";

type Input = Lines<BufReader<Stdin>>;

pub async fn run(manager: &DeckManager) -> Result<()> {
    let review = manager.review();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);
    loop {
        render(review).await;
        let Some(line) = prompt(&mut input, "> ").await? else {
            break;
        };

        let outcome = match line.trim() {
            "" => continue,
            "q" => break,
            "f" => {
                review.flip().await;
                Ok(())
            }
            "n" => {
                review.next().await;
                Ok(())
            }
            "p" => {
                review.previous().await;
                Ok(())
            }
            "1" => rate(review, Rating::Hard).await,
            "2" => rate(review, Rating::Good).await,
            "3" => rate(review, Rating::Easy).await,
            "e" => edit(review, &mut input).await,
            "d" => review.delete().await.map(|()| println!("Card deleted.")),
            "?" | "h" => {
                println!("{}", HELP);
                Ok(())
            }
            other => {
                println!("Unknown command '{}'. {}", other, HELP);
                Ok(())
            }
        };

        if let Err(e) = outcome {
            report(&e);
        }
    }
    Ok(())
}

async fn render(review: &CardReview) {
    let session = review.snapshot().await;
    let total = session.len();
    let card = session.current_card();

    match (session.state(), card) {
        (ReviewState::Empty, _) | (_, None) => println!("\nThis deck has no cards."),
        (ReviewState::Viewing { position }, Some(card)) => {
            println!("\n[{}/{}] Q: {}", position + 1, total, card.question);
        }
        (ReviewState::Revealed { position }, Some(card)) => {
            println!("\n[{}/{}] Q: {}", position + 1, total, card.question);
            println!("      A: {}", card.answer);
        }
        (ReviewState::Editing { error: Some(error), .. }, Some(_)) => {
            println!("\nSave failed: {}", error);
        }
        (state, Some(_)) => println!("\n({})", state.name()),
    }
}

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

async fn rate(review: &CardReview, rating: Rating) -> Result<(), TrailsError> {
    let progress = review.rate(rating).await?;
    match progress.next_review_at() {
        Some(due) => println!("Rated {}. Next review {}.", rating, due.format("%Y-%m-%d")),
        None => println!("Rated {}.", rating),
    }
    review.next().await;
    Ok(())
}

/// Prompt for new text; a blank line keeps the shown side, `.` cancels.
///
/// A failed save leaves the overlay open with the draft, so the prompt comes
/// back pre-filled with it and the inline error shown.
async fn edit(review: &CardReview, input: &mut Input) -> Result<(), TrailsError> {
    review.begin_edit().await?;
    println!("(blank keeps the text, '.' cancels)");

    loop {
        let Some((draft, error)) = open_draft(review.state().await) else {
            return Ok(());
        };
        if let Some(error) = error {
            println!("Save failed: {}", error);
        }

        let Some(question) = read_side(input, "Question", &draft.question).await else {
            review.cancel_edit().await;
            return Ok(());
        };
        let Some(answer) = read_side(input, "Answer", &draft.answer).await else {
            review.cancel_edit().await;
            return Ok(());
        };

        match review.edit(&question, &answer).await {
            Ok(()) => {
                println!("Card updated.");
                return Ok(());
            }
            Err(e) => {
                if !matches!(review.state().await, ReviewState::Editing { .. }) {
                    return Err(e);
                }
            }
        }
    }
}

/// Draft and inline error of an open editing overlay.
fn open_draft(state: ReviewState) -> Option<(CardDraft, Option<String>)> {
    match state {
        ReviewState::Editing { draft, error, .. } => Some((draft, error)),
        _ => None,
    }
}

async fn read_side(input: &mut Input, label: &str, current: &str) -> Option<String> {
    println!("{} [{}]", label, current);
    match prompt(input, "  new: ").await {
        Ok(Some(line)) if line.trim() == "." => None,
        Ok(Some(line)) if line.trim().is_empty() => Some(current.to_string()),
        Ok(Some(line)) => Some(line),
        _ => None,
    }
}

fn report(e: &TrailsError) {
    eprintln!("error: {}", e);
    if let Some(suggestion) = e.suggestion() {
        eprintln!("  {}", suggestion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_save_reopens_with_draft_and_error() {
        let state = ReviewState::Editing {
            position: 1,
            revealed: true,
            draft: CardDraft::new("New Q", "New A"),
            error: Some("Conflict: duplicate question".to_string()),
        };
        let (draft, error) = open_draft(state).unwrap();
        assert_eq!(draft, CardDraft::new("New Q", "New A"));
        assert_eq!(error.as_deref(), Some("Conflict: duplicate question"));
    }

    #[test]
    fn test_closed_overlay_ends_edit() {
        assert!(open_draft(ReviewState::Viewing { position: 0 }).is_none());
        assert!(open_draft(ReviewState::Empty).is_none());
    }
}
