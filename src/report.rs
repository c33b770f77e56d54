use crate::screen::{round2, ScreenHit};
use anyhow::{Context, Result};
use std::fmt::Write as _;

pub const COLUMNS: [&str; 5] = ["Ticker", "Drop %", "Revenue Growth %", "Earnings Growth %", "Debt/Equity"];

fn row(hit: &ScreenHit) -> [String; 5] {
    [
        hit.ticker.clone(),
        format!("{}", round2(hit.drop_pct)),
        format!("{}", round2(hit.revenue_growth)),
        format!("{}", round2(hit.earnings_growth)),
        format!("{}", round2(hit.debt_equity)),
    ]
}

pub fn to_csv(hits: &[ScreenHit]) -> Result<String> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(COLUMNS)?;
    for hit in hits {
        w.write_record(row(hit))?;
    }
    let bytes = w.into_inner().context("failed to finish CSV")?;
    Ok(String::from_utf8(bytes)?)
}

/// Fixed-width table for the terminal.
pub fn to_text_table(hits: &[ScreenHit]) -> String {
    let rows: Vec<[String; 5]> = hits.iter().map(row).collect();
    let mut widths = COLUMNS.map(str::len);
    for r in &rows {
        for (w, cell) in widths.iter_mut().zip(r.iter()) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, cells: &[&str]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(i, (c, w))| if i == 0 { format!("{:<w$}", c, w = *w) } else { format!("{:>w$}", c, w = *w) })
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    };
    line(&mut out, &COLUMNS);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    line(&mut out, &rule.iter().map(String::as_str).collect::<Vec<_>>());
    for r in &rows {
        line(&mut out, &r.iter().map(String::as_str).collect::<Vec<_>>());
    }
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const CHART_W: f64 = 720.0;
const CHART_H: f64 = 280.0;
const PAD_L: f64 = 70.0;
const PAD_R: f64 = 20.0;
const PAD_T: f64 = 36.0;
const PAD_B: f64 = 50.0;

/// Line-and-marker chart of the closes in a hit's window, as inline SVG.
pub fn svg_line_chart(hit: &ScreenHit) -> String {
    let title = format!("{} - Last {} Days", hit.ticker, hit.window.len());
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" class="chart" role="img" aria-label="{t}">"#,
        w = CHART_W,
        h = CHART_H,
        t = escape_html(&title)
    );
    let _ = write!(
        svg,
        r#"<text x="{x}" y="22" text-anchor="middle" class="title">{t}</text>"#,
        x = CHART_W / 2.0,
        t = escape_html(&title)
    );

    let plot_w = CHART_W - PAD_L - PAD_R;
    let plot_h = CHART_H - PAD_T - PAD_B;
    let closes: Vec<f64> = hit.window.iter().map(|c| c.close).collect();
    let (lo, hi) = closes
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| (lo.min(c), hi.max(c)));
    let span = if hi > lo { hi - lo } else { 1.0 };
    let n = closes.len();

    let x_at = |i: usize| {
        if n <= 1 {
            PAD_L + plot_w / 2.0
        } else {
            PAD_L + plot_w * i as f64 / (n - 1) as f64
        }
    };
    let y_at = |c: f64| PAD_T + plot_h - (c - lo) / span * plot_h;

    let _ = write!(
        svg,
        r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" class="axis"/><line x1="{l}" y1="{t}" x2="{l}" y2="{b}" class="axis"/>"#,
        l = PAD_L,
        r = PAD_L + plot_w,
        t = PAD_T,
        b = PAD_T + plot_h
    );
    // y ticks at the extremes
    for v in [lo, hi] {
        let _ = write!(
            svg,
            r#"<text x="{x}" y="{y:.1}" text-anchor="end" class="tick">{v:.2}</text>"#,
            x = PAD_L - 6.0,
            y = y_at(v) + 4.0,
        );
    }

    if n > 0 {
        let points: Vec<String> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| format!("{:.1},{:.1}", x_at(i), y_at(c)))
            .collect();
        let _ = write!(svg, r#"<polyline points="{}" class="line"/>"#, points.join(" "));
        for ((i, &c), day) in closes.iter().enumerate().zip(hit.window.iter()) {
            let _ = write!(
                svg,
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="3.5" class="marker"><title>{d}: {c:.2}</title></circle>"#,
                x = x_at(i),
                y = y_at(c),
                d = day.date,
            );
            let _ = write!(
                svg,
                r#"<text x="{x:.1}" y="{y}" text-anchor="middle" class="tick">{d}</text>"#,
                x = x_at(i),
                y = PAD_T + plot_h + 16.0,
                d = day.date.format("%m-%d"),
            );
        }
    }

    let _ = write!(
        svg,
        r#"<text x="{x}" y="{y}" text-anchor="middle" class="label">Date</text>"#,
        x = PAD_L + plot_w / 2.0,
        y = CHART_H - 8.0
    );
    let _ = write!(
        svg,
        r#"<text x="16" y="{y}" text-anchor="middle" class="label" transform="rotate(-90 16 {y})">Close Price</text>"#,
        y = PAD_T + plot_h / 2.0
    );
    svg.push_str("</svg>");
    svg
}
