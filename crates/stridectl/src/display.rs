//! Terminal rendering for stridectl. ASCII only, no emojis.

use owo_colors::OwoColorize;
use serde_json::Value;

pub fn render_status(status: &Value) {
    println!("{}", "Stride daemon".bold());
    println!("  version: {}", status["version"].as_str().unwrap_or("?"));
    println!("  uptime:  {}s", status["uptime_seconds"]);
    println!("  store:   {}", status["store_backend"].as_str().unwrap_or("?"));
    println!("  accounts: {}", status["accounts"]);
}

pub fn render_completion(result: &Value) {
    println!(
        "Total: {} points, level {}",
        result["new_points"], result["new_level"]
    );
    if result["leveled_up"].as_bool().unwrap_or(false) {
        println!("{}", format!("Level up! Now level {}", result["new_level"]).green().bold());
    }
    if result["streak_changed"].as_bool().unwrap_or(false) {
        println!("Streak: {} days", result["new_streak"]);
    }
    if let Some(badges) = result["newly_earned"].as_array() {
        for badge in badges {
            println!(
                "{} Badge earned: {} - {}",
                badge["symbol"].as_str().unwrap_or("[*]").yellow(),
                badge["name"].as_str().unwrap_or(""),
                badge["description"].as_str().unwrap_or("")
            );
        }
    }
}

pub fn render_snapshot(snapshot: &Value) {
    println!(
        "{} ({})",
        snapshot["display_name"].as_str().unwrap_or("?").bold(),
        snapshot["account_id"].as_str().unwrap_or("?")
    );
    println!(
        "  level {}  {} points  streak {} days",
        snapshot["level"], snapshot["points"], snapshot["streak"]
    );
    let percent = snapshot["progress_percent"].as_u64().unwrap_or(0);
    println!(
        "  [{}] {}% ({} to next level)",
        progress_bar(percent, 20),
        percent,
        snapshot["points_to_next_level"]
    );
}

pub fn render_page(page: &Value, offset: usize) {
    let Some(entries) = page["entries"].as_array() else {
        return;
    };
    if entries.is_empty() {
        println!("No accounts ranked at offset {offset}.");
        return;
    }
    println!("{:>5}  {:<20} {:>8} {:>6} {:>7}", "rank", "name", "points", "level", "streak");
    for entry in entries {
        println!(
            "{:>5}  {:<20} {:>8} {:>6} {:>7}",
            format!("#{}", entry["rank"]),
            entry["display_name"].as_str().unwrap_or("?"),
            entry["points"],
            entry["level"],
            entry["streak"]
        );
    }
}

pub fn render_badges(result: &Value) {
    let Some(badges) = result["badges"].as_array() else {
        return;
    };
    for status in badges {
        let badge = &status["badge"];
        let symbol = badge["symbol"].as_str().unwrap_or("[*]");
        let name = badge["name"].as_str().unwrap_or("");
        let description = badge["description"].as_str().unwrap_or("");
        match status["earned_at"].as_str() {
            Some(earned_at) => println!(
                "{} {} - {} (earned {})",
                symbol.yellow(),
                name.bold(),
                description,
                earned_at
            ),
            None => println!("{} {} - {}", symbol.dimmed(), name.dimmed(), description.dimmed()),
        }
    }
}

fn progress_bar(percent: u64, width: usize) -> String {
    let filled = (percent as usize * width) / 100;
    let mut bar = String::with_capacity(width);
    for i in 0..width {
        bar.push(if i < filled { '#' } else { '-' });
    }
    bar
}
