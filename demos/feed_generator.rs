/// Synthetic FIX market data log generator
///
/// Writes one full-refresh snapshot followed by random incremental refreshes
/// as `|`-delimited tag=value lines, then replays the log through the feed
/// handler when a dictionary path is given.
///
/// Usage: feed_generator [output|stdout] [message_count] [dictionary.xml]

use fix_feed_handler::raw::{format_message, RawField};
use fix_feed_handler::{Dictionary, FeedConfig, FeedHandler};
use rand::seq::SliceRandom;
use rand::Rng;
use std::env;
use std::fs::File;
use std::io::{BufReader, Write};
use tracing_subscriber::EnvFilter;

const DELIMITER: char = '|';

struct Resting {
    ref_id: String,
    entry_type: &'static str,
}

fn header(msg_type: &str, seq: u32) -> Vec<RawField> {
    vec![
        RawField::new("8", "FIX.4.4"),
        RawField::new("35", msg_type),
        RawField::new("34", seq.to_string()),
        RawField::new("49", "VENUE"),
        RawField::new("56", "CLIENT"),
    ]
}

fn random_price(rng: &mut impl Rng, entry_type: &str) -> String {
    let ticks = rng.gen_range(0..20) as f64 * 0.05;
    let px = if entry_type == "0" { 99.95 - ticks } else { 100.05 + ticks };
    format!("{px:.2}")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let output_path = args.get(1).cloned().unwrap_or_else(|| "/tmp/md_feed.log".to_string());
    let message_count: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1000);
    let dictionary_path = args.get(3).cloned();

    let mut output: Box<dyn Write> = if output_path == "stdout" {
        Box::new(std::io::stdout())
    } else {
        Box::new(File::create(&output_path)?)
    };

    let mut rng = rand::thread_rng();
    let mut resting: Vec<Resting> = Vec::new();
    let mut next_ref = 1u64;
    let mut seq = 1u32;

    let mut snapshot = header("W", seq);
    snapshot.push(RawField::new("268", "20"));
    for i in 0..20 {
        let entry_type = if i % 2 == 0 { "0" } else { "1" };
        let ref_id = format!("R{next_ref}");
        next_ref += 1;
        snapshot.push(RawField::new("269", entry_type));
        snapshot.push(RawField::new("280", ref_id.as_str()));
        snapshot.push(RawField::new("270", random_price(&mut rng, entry_type)));
        snapshot.push(RawField::new("271", rng.gen_range(1u32..1000).to_string()));
        resting.push(Resting { ref_id, entry_type });
    }
    writeln!(output, "{}", format_message(&snapshot, DELIMITER))?;

    for _ in 1..message_count {
        seq += 1;
        let mut msg = header("X", seq);
        msg.push(RawField::new("268", "1"));

        let action = if resting.is_empty() { 0 } else { rng.gen_range(0u8..3) };
        match action {
            0 => {
                let entry_type = *["0", "1"].choose(&mut rng).unwrap_or(&"0");
                let ref_id = format!("R{next_ref}");
                next_ref += 1;
                msg.push(RawField::new("279", "0"));
                msg.push(RawField::new("269", entry_type));
                msg.push(RawField::new("280", ref_id.as_str()));
                msg.push(RawField::new("270", random_price(&mut rng, entry_type)));
                msg.push(RawField::new("271", rng.gen_range(1u32..1000).to_string()));
                resting.push(Resting { ref_id, entry_type });
            }
            1 => {
                let target = &resting[rng.gen_range(0..resting.len())];
                msg.push(RawField::new("279", "1"));
                msg.push(RawField::new("269", target.entry_type));
                msg.push(RawField::new("280", target.ref_id.as_str()));
                if rng.gen_bool(0.5) {
                    msg.push(RawField::new("270", random_price(&mut rng, target.entry_type)));
                }
                msg.push(RawField::new("271", rng.gen_range(1u32..1000).to_string()));
            }
            _ => {
                let target = resting.swap_remove(rng.gen_range(0..resting.len()));
                msg.push(RawField::new("279", "2"));
                msg.push(RawField::new("269", target.entry_type));
                msg.push(RawField::new("280", target.ref_id));
            }
        }

        writeln!(output, "{}", format_message(&msg, DELIMITER))?;
    }
    output.flush()?;
    drop(output);

    println!("Generated {} messages to {}", message_count, output_path);

    if let (Some(dict_path), false) = (dictionary_path, output_path == "stdout") {
        let dictionary = Dictionary::from_path(dict_path)?;
        let mut handler = FeedHandler::new(dictionary, FeedConfig::default().with_delimiter(DELIMITER));
        handler.process_log(BufReader::new(File::open(&output_path)?))?;

        let depth = handler.book().depth(5);
        println!("Top of book after replay:");
        for (px, sz) in depth.asks.iter().rev() {
            println!("\t{px:.2}: {sz}");
        }
        println!("\t--------------------");
        for (px, sz) in &depth.bids {
            println!("\t{px:.2}: {sz}");
        }
        handler.stats().log_summary();
    }

    Ok(())
}
