//! One night with the promotion, end to end.
//!
//! Run with:
//!
//! ```text
//! cargo run --example house_show
//! ```
//!
//! Atlas Crane talks himself into a grudge match, the card books itself
//! around the feud, and the world title ends up on the line in the
//! rematch. Set `RUST_LOG=debug` to watch the engines think.

use anyhow::Result;
use kayfabe_core::{CharacterId, KayfabeConfig, Promotion, TemplateId, TitleId, WinMethod};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = KayfabeConfig::default();
    let mut promotion = Promotion::ephemeral_with_seed(&config, 8);
    let atlas = CharacterId::from("atlas-crane");
    let grand_collision = TemplateId::from("grand-collision");

    println!("== the war of words ==");
    for line in [
        "I will bury The Mortician in the main event",
        "no grave is deep enough to hide that ghoul from me",
        "the whole locker room heard me and nobody answered",
        "bring the bells, bring the fog, bring a stretcher",
        "The Mortician has haunted this company long enough",
        "at Grand Collision the dead stay down",
    ] {
        println!("Atlas Crane: {line}");
        for cue in promotion.handle_message(line, &atlas) {
            let name = promotion.registry().display_name(&cue.character).to_string();
            println!("  -> {name} [{}]: {}", cue.kind, cue.directive);
        }
    }

    if let Some(promo) = promotion.cut_promo() {
        let name = promotion.registry().display_name(&promo.character).to_string();
        println!("\n== backstage promo ==\n{name}: {}", promo.directive);
    }

    println!("\n== night one ==");
    let opening = promotion.run_ppv(&grand_collision)?;
    print_report(&promotion, &opening);

    // Crown the winner of the main event so the rematch has stakes.
    let champion = opening.results[0].summary.winner.clone();
    if let Some(change) = promotion.ledger_mut().award_title(
        &TitleId::from("world"),
        &champion,
        WinMethod::Pinfall,
        chrono::Utc::now(),
    ) {
        println!(
            "\nthe board crowns {} as the first {}",
            promotion.registry().display_name(&change.new_champion),
            change.title_name
        );
    }

    println!("\n== the rematch ==");
    let rematch = promotion.run_ppv(&grand_collision)?;
    print_report(&promotion, &rematch);

    println!("\n== championship picture ==");
    for title in promotion.ledger().titles() {
        match promotion.ledger().champion(&title.id) {
            Some(holder) => println!(
                "{}: {}",
                title.name,
                promotion.registry().display_name(holder)
            ),
            None => println!("{}: vacant", title.name),
        }
    }
    Ok(())
}

fn print_report(promotion: &Promotion, report: &kayfabe_core::EventReport) {
    println!("=== {} ===", report.name);
    for result in &report.results {
        println!(
            "match {}: {} wins by {} after {} rounds",
            result.order,
            promotion.registry().display_name(&result.summary.winner),
            result.summary.win_method,
            result.summary.rounds
        );
        if let Some(change) = &result.title_change {
            println!("         the {} changes hands!", change.title_name);
        }
    }
}
