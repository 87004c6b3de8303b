//! Human-readable prediction reports.
//!
//! A [`Report`] is a list of display blocks; `Display` renders it as the
//! lightweight markdown the chat widget understands (`##` headings, `**`
//! labels, numbered lists).

use std::fmt;

use crate::prediction::{CostOverrunPrediction, DelayPrediction, PredictionResult};

/// Risk level bucket with its traffic-light glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Anything other than High or Medium is treated as Low
    pub fn from_risk_level(level: &str) -> Self {
        let level = level.trim();
        if level.eq_ignore_ascii_case("high") {
            Severity::High
        } else if level.eq_ignore_ascii_case("medium") {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Severity::High => "🔴",
            Severity::Medium => "🟡",
            Severity::Low => "🟢",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportBlock {
    Heading { level: u8, text: String },
    Status(String),
    Fields(Vec<(String, String)>),
    Bullets { title: String, items: Vec<String> },
    Numbered(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub blocks: Vec<ReportBlock>,
}

impl Report {
    fn heading(&mut self, level: u8, text: impl Into<String>) {
        self.blocks.push(ReportBlock::Heading {
            level,
            text: text.into(),
        });
    }

    /// Titled numbered list, left out entirely when `items` is empty
    fn numbered_section(&mut self, title: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        self.heading(3, title);
        self.blocks.push(ReportBlock::Numbered(items.to_vec()));
    }
}

impl fmt::Display for ReportBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportBlock::Heading { level, text } => {
                write!(f, "{} {text}", "#".repeat(usize::from(*level)))
            }
            ReportBlock::Status(text) => f.write_str(text),
            ReportBlock::Fields(fields) => {
                let lines: Vec<String> = fields
                    .iter()
                    .map(|(label, value)| format!("**{label}:** {value}"))
                    .collect();
                f.write_str(&lines.join("\n"))
            }
            ReportBlock::Bullets { title, items } => {
                write!(f, "**{title}:**")?;
                for item in items {
                    write!(f, "\n• {item}")?;
                }
                Ok(())
            }
            ReportBlock::Numbered(items) => {
                let lines: Vec<String> = items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| format!("{}. {item}", idx + 1))
                    .collect();
                f.write_str(&lines.join("\n"))
            }
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

/// Indian-rupee amount, whole rupees, lakh/crore digit grouping
pub fn format_inr(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let sign = if rounded < 0.0 { "-" } else { "" };

    if digits.len() <= 3 {
        return format!("{sign}₹{digits}");
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{sign}₹{},{tail}", groups.join(","))
}

fn probability_percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// Two decimals, `+` unless the rounded figure is below zero
fn signed_percent(value: f64) -> String {
    let magnitude = format!("{:.2}", value.abs());
    let negative = value < 0.0 && magnitude != "0.00";
    format!("{}{magnitude}%", if negative { "-" } else { "+" })
}

fn risk_label(level: &str) -> String {
    format!("{} {level}", Severity::from_risk_level(level).glyph())
}

fn delay_report(pred: &DelayPrediction) -> Report {
    let mut report = Report::default();
    report.heading(2, "📊 Delay Prediction Results");
    report.blocks.push(ReportBlock::Status(
        if pred.is_delayed {
            "⚠️ **PROJECT IS DELAYED**"
        } else {
            "✅ **PROJECT IS ON TIME**"
        }
        .to_string(),
    ));

    let days = pred.predicted_delay_days;
    report.blocks.push(ReportBlock::Fields(vec![
        (
            "Delay Probability".into(),
            probability_percent(pred.delay_probability),
        ),
        (
            "Predicted Delay".into(),
            format!("{days} {}", if days == 1 { "day" } else { "days" }),
        ),
        ("Risk Level".into(), risk_label(&pred.risk_level)),
        ("Confidence".into(), pred.confidence.clone()),
    ]));

    report.numbered_section("🎯 AI Recommendations:", &pred.recommendations);
    report
}

fn cost_overrun_report(pred: &CostOverrunPrediction) -> Report {
    let mut report = Report::default();
    report.heading(2, "💰 Cost Overrun Prediction Results");
    report.blocks.push(ReportBlock::Fields(vec![
        (
            "Expected Overrun".into(),
            signed_percent(pred.expected_overrun_percent),
        ),
        (
            "Predicted Final Cost".into(),
            format_inr(pred.predicted_final_cost),
        ),
        ("Risk Level".into(), risk_label(&pred.risk_level)),
    ]));

    if let Some(intervals) = &pred.intervals {
        let costs = pred.cost_intervals.clone().unwrap_or_default();
        let cost_or_point = |figure: Option<f64>| format_inr(figure.unwrap_or(pred.predicted_final_cost));
        report.blocks.push(ReportBlock::Bullets {
            title: "Confidence Intervals".into(),
            items: vec![
                format!(
                    "P10 (Optimistic): {:.2}% ({})",
                    intervals.p10,
                    cost_or_point(costs.p10)
                ),
                format!(
                    "P50 (Expected): {:.2}% ({})",
                    intervals.expected,
                    cost_or_point(costs.expected)
                ),
                format!(
                    "P90 (Pessimistic): {:.2}% ({})",
                    intervals.p90,
                    cost_or_point(costs.p90)
                ),
            ],
        });
    }

    report.numbered_section("⚠️ Alerts:", &pred.alerts);
    report.numbered_section("🎯 AI Recommendations:", &pred.recommendations);
    report
}

pub fn format_report(result: &PredictionResult) -> Report {
    match result {
        PredictionResult::Delay(pred) => delay_report(pred),
        PredictionResult::CostOverrun(pred) => cost_overrun_report(pred),
    }
}
