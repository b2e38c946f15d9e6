//! Plain-text and JSON rendering of presentation frames.

use crate::audio::EnergyReading;
use crate::classifier::ClipPrediction;
use crate::stabilizer::distribution::ranked;
use crate::stabilizer::{confidence_pct, ClassDistribution, GateStatus, PresentationFrame};
use crate::stream::FrameSink;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';
const NO_LABEL: &str = "—";
pub const DEFAULT_BAR_WIDTH: usize = 24;
const ENERGY_BAR_WIDTH: usize = 12;
const ENERGY_LINE_INTERVAL: Duration = Duration::from_millis(500);

/// `Top: jazz (90%)`, or `Top: —` while no label is shown.
#[must_use]
pub fn label_line(frame: &PresentationFrame) -> String {
    match (&frame.label, frame.confidence_pct) {
        (Some(label), Some(pct)) => format!("Top: {label} ({pct}%)"),
        (Some(label), None) => format!("Top: {label}"),
        _ => format!("Top: {NO_LABEL}"),
    }
}

/// Status line; a predicting frame carries the backend latency when known.
#[must_use]
pub fn hud_line(frame: &PresentationFrame) -> String {
    match (frame.status, frame.latency_ms) {
        (GateStatus::Predicting, Some(latency)) => format!("predicting • {latency:.0}ms"),
        (status, _) => status.to_string(),
    }
}

/// One line per class, highest probability first, labels padded to a column.
#[must_use]
pub fn bar_lines(bars: &ClassDistribution, width: usize) -> Vec<String> {
    let entries = ranked(bars);
    let label_width = entries
        .iter()
        .map(|(label, _)| UnicodeWidthStr::width(*label))
        .max()
        .unwrap_or(0);

    entries
        .into_iter()
        .map(|(label, value)| {
            let pct = confidence_pct(value);
            let filled = ((value.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
            let pad = label_width - UnicodeWidthStr::width(label);
            let mut line = String::with_capacity(label.len() + pad + width * 3 + 8);
            line.push_str(label);
            line.push_str(&" ".repeat(pad));
            line.push(' ');
            line.extend(std::iter::repeat(BAR_FULL).take(filled));
            line.extend(std::iter::repeat(BAR_EMPTY).take(width - filled));
            line.push_str(&format!(" {pct:>3}%"));
            line
        })
        .collect()
}

/// Compact band-energy readout used in place of a visualizer.
#[must_use]
pub fn energy_line(reading: EnergyReading) -> String {
    let mean = reading.mean().clamp(0.0, 1.0);
    let filled = (mean * ENERGY_BAR_WIDTH as f32).round() as usize;
    let bar: String = std::iter::repeat(BAR_FULL)
        .take(filled)
        .chain(std::iter::repeat(BAR_EMPTY).take(ENERGY_BAR_WIDTH - filled))
        .collect();
    format!(
        "energy {bar} low {:.3} mid {:.3} high {:.3}",
        reading.low, reading.mid, reading.high
    )
}

/// HUD, label, and bars for one frame, newline-terminated.
#[must_use]
pub fn render_frame(frame: &PresentationFrame, bar_width: usize) -> String {
    let mut out = String::new();
    out.push_str(&hud_line(frame));
    out.push('\n');
    out.push_str(&label_line(frame));
    out.push('\n');
    if let Some(bars) = &frame.bars {
        for line in bar_lines(bars, bar_width) {
            out.push_str("  ");
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Result of a one-shot clip classification.
#[must_use]
pub fn render_clip(prediction: &ClipPrediction, bar_width: usize) -> String {
    let mut out = format!("Top: {}\n", prediction.top);
    for line in bar_lines(&prediction.probs, bar_width) {
        out.push_str("  ");
        out.push_str(&line);
        out.push('\n');
    }
    if let Some(latency) = prediction.latency_ms {
        out.push_str(&format!("latency {latency:.0}ms\n"));
    }
    out
}

pub fn json_line<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("failed to serialize output")
}

/// Writes frames to a terminal or a pipe.
///
/// Text mode prints a block per frame and an energy line at most every
/// 500 ms; JSON mode prints one object per frame and no energy lines.
pub struct TerminalSink<W: Write> {
    out: W,
    json: bool,
    bar_width: usize,
    last_energy_line: Option<Instant>,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            bar_width: DEFAULT_BAR_WIDTH,
            last_energy_line: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for TerminalSink<W> {
    fn on_energy(&mut self, reading: EnergyReading) -> Result<()> {
        if self.json {
            return Ok(());
        }
        let now = Instant::now();
        if self
            .last_energy_line
            .is_some_and(|last| now.duration_since(last) < ENERGY_LINE_INTERVAL)
        {
            return Ok(());
        }
        self.last_energy_line = Some(now);
        writeln!(self.out, "{}", energy_line(reading)).context("failed to write output")?;
        self.out.flush().context("failed to flush output")
    }

    fn on_frame(&mut self, frame: &PresentationFrame) -> Result<()> {
        let text = if self.json {
            let mut line = json_line(frame)?;
            line.push('\n');
            line
        } else {
            render_frame(frame, self.bar_width)
        };
        self.out
            .write_all(text.as_bytes())
            .context("failed to write output")?;
        self.out.flush().context("failed to flush output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stabilizer::distribution::dist;
    use crate::stabilizer::Shortfall;

    fn frame(status: GateStatus) -> PresentationFrame {
        PresentationFrame {
            generation: 1,
            status,
            label: None,
            confidence_pct: None,
            bars: None,
            latency_ms: None,
        }
    }

    #[test]
    fn label_line_shows_placeholder_without_label() {
        assert_eq!(label_line(&frame(GateStatus::WarmingUp)), "Top: —");

        let mut shown = frame(GateStatus::Predicting);
        shown.label = Some("jazz".to_string());
        shown.confidence_pct = Some(90);
        assert_eq!(label_line(&shown), "Top: jazz (90%)");
    }

    #[test]
    fn hud_line_matches_status_messages() {
        assert_eq!(
            hud_line(&frame(GateStatus::WarmingUp)),
            "buffering… (warming up)"
        );
        assert_eq!(
            hud_line(&frame(GateStatus::Buffering {
                needed: Some(Shortfall::Frames(3))
            })),
            "buffering… (3 frames needed)"
        );
        assert_eq!(
            hud_line(&frame(GateStatus::Listening {
                energy: 0.0126,
                confidence_pct: 15
            })),
            "listening… (energy 0.013, conf 15%)"
        );

        let mut predicting = frame(GateStatus::Predicting);
        predicting.latency_ms = Some(41.6);
        assert_eq!(hud_line(&predicting), "predicting • 42ms");
    }

    #[test]
    fn bars_sorted_descending_with_aligned_labels() {
        let lines = bar_lines(&dist(&[("rock", 0.25), ("jazz", 0.7), ("hiphop", 0.05)]), 10);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("jazz  "));
        assert!(lines[1].starts_with("rock  "));
        assert!(lines[2].starts_with("hiphop "));
        assert!(lines[0].ends_with(" 70%"));
        assert!(lines[2].ends_with("  5%"));
        let widths: Vec<usize> = lines.iter().map(|l| UnicodeWidthStr::width(l.as_str())).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[test]
    fn bar_fill_tracks_probability() {
        let lines = bar_lines(&dist(&[("jazz", 0.5)]), 10);
        assert_eq!(lines[0].chars().filter(|c| *c == BAR_FULL).count(), 5);
        assert_eq!(lines[0].chars().filter(|c| *c == BAR_EMPTY).count(), 5);
    }

    #[test]
    fn energy_line_reports_each_band() {
        let line = energy_line(EnergyReading::new(0.5, 0.25, 0.0));
        assert!(line.contains("low 0.500 mid 0.250 high 0.000"));
        assert_eq!(line.chars().filter(|c| *c == BAR_FULL).count(), 3);
    }

    #[test]
    fn json_sink_writes_one_object_per_frame() {
        let mut sink = TerminalSink::new(Vec::new(), true);
        sink.on_energy(EnergyReading::new(1.0, 1.0, 1.0)).expect("energy");
        let mut shown = frame(GateStatus::Predicting);
        shown.label = Some("jazz".to_string());
        sink.on_frame(&shown).expect("frame");
        sink.on_frame(&frame(GateStatus::WarmingUp)).expect("frame");

        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(first["status"], "predicting");
        assert_eq!(first["label"], "jazz");
    }

    #[test]
    fn text_sink_throttles_energy_lines() {
        let mut sink = TerminalSink::new(Vec::new(), false);
        sink.on_energy(EnergyReading::default()).expect("energy");
        sink.on_energy(EnergyReading::default()).expect("energy");
        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn clip_output_lists_classes() {
        let prediction = ClipPrediction {
            top: "metal".to_string(),
            probs: dist(&[("metal", 0.8), ("rock", 0.2)]),
            latency_ms: Some(120.0),
        };
        let text = render_clip(&prediction, 10);
        assert!(text.starts_with("Top: metal\n  metal "));
        assert!(text.ends_with("latency 120ms\n"));
    }
}
