//! Terminal output.

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use komorebi_core::insight::{GeneratedInsight, InsightCard, QuoteSource};
use komorebi_core::session::{
    ArchivedChatSession, Message, RejectReason, SessionSnapshot, SessionWindow,
};
use komorebi_core::UserContext;

pub fn message(message: &Message) {
    if message.is_user() {
        println!("{}", format!("> {}", message.content).green());
    } else {
        for line in message.content.lines() {
            println!("{}", line.bright_blue());
        }
    }
}

pub fn conversation(snapshot: &SessionSnapshot) {
    for m in &snapshot.messages {
        message(m);
    }
}

pub fn rejection(reason: RejectReason) {
    let text = match reason {
        RejectReason::Busy => "Still waiting for the last reply.",
        RejectReason::QuotaExhausted => {
            "You've used all your messages for this session. Type /end to wrap up, or /pro on for unlimited messages."
        }
        RejectReason::TimeLimitReached => {
            "This session's time is up. Type /end to save it, or /reset to begin again."
        }
        RejectReason::EmptyMessage => return,
    };
    println!("{}", text.yellow());
}

fn user_label(user: &UserContext) -> String {
    match user {
        UserContext::Anonymous => "anonymous".to_string(),
        UserContext::Guest => "guest".to_string(),
        UserContext::Authenticated { is_pro, name } => {
            let tier = if *is_pro { "pro" } else { "free" };
            match name {
                Some(name) => format!("{name} ({tier})"),
                None => format!("signed in ({tier})"),
            }
        }
    }
}

pub fn status(
    snapshot: &SessionSnapshot,
    window: &SessionWindow,
    completed_both: bool,
    next_start: DateTime<Local>,
) {
    println!("{}", "--- Session ---".bright_magenta());
    println!("User:      {}", user_label(&snapshot.user));
    println!("Session:   {}", snapshot.session_type);
    if snapshot.user.is_pro() {
        println!("Messages:  {} (unlimited)", snapshot.limits.messages_used);
    } else {
        println!(
            "Messages:  {} / {} ({} left)",
            snapshot.limits.messages_used,
            snapshot.limits.max_messages,
            snapshot.limits.remaining()
        );
    }
    let limit = snapshot.time_limit.num_minutes();
    match snapshot.elapsed {
        Some(elapsed) => println!("Time:      {} / {} min", elapsed.num_minutes(), limit),
        None => println!("Time:      not started ({} min limit)", limit),
    }
    println!(
        "Today:     morning {}, evening {}",
        done(snapshot.limits.morning_completed),
        done(snapshot.limits.evening_completed)
    );
    if completed_both {
        println!(
            "{}",
            format!("Both sessions done. Next one opens {}.", when(next_start)).bright_green()
        );
    } else if !window.auto_start {
        println!(
            "{}",
            "It's late. Say something if you'd like to reflect before bed.".bright_black()
        );
    }
}

fn done(completed: bool) -> &'static str {
    if completed { "done" } else { "open" }
}

fn when(at: DateTime<Local>) -> String {
    if at.date_naive() == Local::now().date_naive() {
        format!("at {}", at.format("%H:%M"))
    } else {
        format!("tomorrow at {}", at.format("%H:%M"))
    }
}

fn local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn insight(generated: &GeneratedInsight) {
    card(&generated.card);
    if generated.source == QuoteSource::Fallback {
        println!("{}", "(offline quote)".bright_black());
    }
    if !generated.stored {
        println!("{}", "Sign in or choose guest mode to keep your cards.".bright_black());
    }
}

pub fn card(card: &InsightCard) {
    println!();
    println!("  {}", format!("\u{201c}{}\u{201d}", card.quote).bright_yellow().italic());
    println!(
        "  {}",
        format!("{} · {} · {}", card.session_type, card.scene_type.as_str(), local(card.created_at))
            .bright_black()
    );
    println!();
}

pub fn archive_list(sessions: &[ArchivedChatSession]) {
    if sessions.is_empty() {
        println!("{}", "No archived sessions yet.".bright_black());
        return;
    }
    for (i, session) in sessions.iter().enumerate() {
        let marker = if session.insight_card_id.is_some() { " *" } else { "" };
        println!(
            "{:>3}. {} {} · {} messages · {} min{}",
            i + 1,
            local(session.created_at),
            session.session_type,
            session.message_count,
            session.duration,
            marker
        );
    }
}

pub fn archived(session: &ArchivedChatSession) {
    println!(
        "{}",
        format!("--- {} session, {} ---", session.session_type, local(session.created_at))
            .bright_magenta()
    );
    for m in &session.messages {
        message(m);
    }
}

pub fn gallery(cards: &[InsightCard]) {
    if cards.is_empty() {
        println!("{}", "Your gallery is empty.".bright_black());
        return;
    }
    for (i, card) in cards.iter().enumerate() {
        let pin = if card.is_pinned { "📌 " } else { "" };
        println!("{:>3}. {}{}", i + 1, pin, card.quote);
    }
}

pub fn help() {
    let lines = [
        ("/reset", "start the conversation over"),
        ("/end", "save the session and get an insight card"),
        ("/insight", "create an insight card from this conversation"),
        ("/archive [show|delete|insight <n>]", "past sessions"),
        ("/gallery [pin|delete <n>]", "saved insight cards"),
        ("/status", "quota, timer and today's sessions"),
        ("/scene [name]", "show or change the background scene"),
        ("/video on|off", "video background stills on cards"),
        ("/pro on|off", "toggle Pro"),
        ("/user guest|anonymous|signin [name]", "switch user"),
        ("quit", "leave"),
    ];
    for (command, text) in lines {
        println!("  {} {}", format!("{command:<38}").bright_cyan(), text.bright_black());
    }
}

pub fn error(text: impl std::fmt::Display) {
    eprintln!("{}", format!("Error: {text}").red());
}

pub fn info(text: impl std::fmt::Display) {
    println!("{}", text.to_string().bright_black());
}
