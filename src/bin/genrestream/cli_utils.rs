use anyhow::Result;
#[cfg(feature = "mic")]
use genrestream::audio;
use genrestream::replay::ReplaySummary;
use genrestream::stream::StreamStats;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

pub(crate) fn list_input_devices() -> Result<()> {
    // GENRESTREAM_TEST_DEVICES stands in for real hardware in tests.
    let devices = if let Ok(raw) = std::env::var("GENRESTREAM_TEST_DEVICES") {
        parse_device_list(&raw)
    } else {
        detect_devices()
    };

    if devices.is_empty() {
        println!("No audio input devices detected.");
    } else {
        println!("Available audio input devices:");
        for name in devices {
            println!("  - {name}");
        }
    }
    Ok(())
}

fn parse_device_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(feature = "mic")]
fn detect_devices() -> Vec<String> {
    audio::Recorder::list_devices().unwrap_or_else(|err| {
        eprintln!("Failed to list audio input devices: {err}");
        Vec::new()
    })
}

#[cfg(not(feature = "mic"))]
fn detect_devices() -> Vec<String> {
    eprintln!("Failed to list audio input devices: built without the 'mic' feature");
    Vec::new()
}

/// Set `stop` once the user presses Enter or stdin closes.
pub(crate) fn spawn_enter_watcher(stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        stop.store(true, Ordering::Relaxed);
    });
}

pub(crate) fn format_stream_stats(stats: &StreamStats) -> String {
    format!(
        "chunks sent {} (dropped {}), frames shown {}, late {}, errors {}, malformed {}",
        stats.chunks_submitted,
        stats.chunks_dropped,
        stats.frames_presented,
        stats.late_results,
        stats.classifier_errors,
        stats.malformed_payloads
    )
}

pub(crate) fn format_replay_summary(summary: &ReplaySummary) -> String {
    format!(
        "replayed {} frames across {} sessions (ignored {}, malformed {})",
        summary.frames, summary.sessions, summary.ignored, summary.malformed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_device_list_skips_blanks() {
        assert_eq!(
            parse_device_list(" USB Mic , ,Built-in "),
            vec!["USB Mic".to_string(), "Built-in".to_string()]
        );
        assert!(parse_device_list("  ").is_empty());
    }

    #[test]
    fn replay_summary_mentions_counts() {
        let summary = ReplaySummary {
            sessions: 1,
            frames: 3,
            ignored: 0,
            malformed: 1,
        };
        assert_eq!(
            format_replay_summary(&summary),
            "replayed 3 frames across 1 sessions (ignored 0, malformed 1)"
        );
    }

    #[test]
    fn stream_stats_line_lists_drops() {
        let stats = StreamStats {
            chunks_submitted: 10,
            chunks_dropped: 2,
            ..StreamStats::default()
        };
        assert!(format_stream_stats(&stats).starts_with("chunks sent 10 (dropped 2)"));
    }
}
