use crate::report::{escape_html, svg_line_chart, COLUMNS};
use crate::screen::{
    round2, ScreenHit, Thresholds, MAX_DEBT_RANGE, MIN_DROP_RANGE, MIN_EARNINGS_RANGE, MIN_REVENUE_RANGE,
    RED_DAYS_RANGE,
};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

pub struct PageContext<'a> {
    pub source_label: &'a str,
    pub thresholds: &'a Thresholds,
    pub hits: &'a [ScreenHit],
    pub loaded_at: Option<DateTime<Utc>>,
    pub universe: usize,
    pub load_error: Option<&'a str>,
}

/// Query string that reproduces the given slider positions.
pub fn query_string(t: &Thresholds) -> String {
    format!(
        "red_days={}&min_drop_pct={}&min_revenue_growth={}&min_earnings_growth={}&max_debt_equity={}",
        t.red_days, t.min_drop_pct, t.min_revenue_growth, t.min_earnings_growth, t.max_debt_equity
    )
}

fn slider(out: &mut String, label: &str, name: &str, min: f64, max: f64, value: f64) {
    let _ = write!(
        out,
        r#"<label>{label} <output id="{name}_out">{value}</output>
<input type="range" name="{name}" min="{min}" max="{max}" step="1" value="{value}"
 oninput="document.getElementById('{name}_out').value=this.value" onchange="this.form.submit()"></label>
"#,
    );
}

pub fn render(ctx: &PageContext<'_>) -> String {
    let t = ctx.thresholds;
    let title = format!("NASDAQ Screener ({})", ctx.source_label);
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<h1>{title}</h1>
<form method="get" action="/" class="sliders">
"#,
        title = escape_html(&title),
    );

    slider(
        &mut html,
        "📉 Number of continuous red days",
        "red_days",
        *RED_DAYS_RANGE.start() as f64,
        *RED_DAYS_RANGE.end() as f64,
        t.red_days as f64,
    );
    slider(&mut html, "📉 Minimum total % drop", "min_drop_pct", *MIN_DROP_RANGE.start(), *MIN_DROP_RANGE.end(), t.min_drop_pct);
    slider(
        &mut html,
        "📈 Min Revenue Growth (%)",
        "min_revenue_growth",
        *MIN_REVENUE_RANGE.start(),
        *MIN_REVENUE_RANGE.end(),
        t.min_revenue_growth,
    );
    slider(
        &mut html,
        "💰 Min Earnings Growth (%)",
        "min_earnings_growth",
        *MIN_EARNINGS_RANGE.start(),
        *MIN_EARNINGS_RANGE.end(),
        t.min_earnings_growth,
    );
    slider(&mut html, "📉 Max Debt/Equity", "max_debt_equity", *MAX_DEBT_RANGE.start(), *MAX_DEBT_RANGE.end(), t.max_debt_equity);
    html.push_str("<button type=\"submit\">Apply</button>\n</form>\n");

    let loaded = ctx
        .loaded_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    let _ = write!(
        html,
        r#"<form method="post" action="/refresh" class="meta">{n} tickers with fundamentals, loaded {loaded} <button type="submit">Reload data</button></form>
"#,
        n = ctx.universe,
    );
    if let Some(err) = ctx.load_error {
        let _ = write!(html, "<p class=\"error\">Last reload failed: {}</p>\n", escape_html(err));
    }

    if ctx.hits.is_empty() {
        html.push_str("<p class=\"warning\">⚠️ No matching stocks found.</p>\n");
    } else {
        let _ = write!(html, "<p class=\"success\">✅ {} stocks found.</p>\n", ctx.hits.len());
        html.push_str("<table>\n<thead><tr>");
        for col in COLUMNS {
            let _ = write!(html, "<th>{}</th>", escape_html(col));
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for hit in ctx.hits {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&hit.ticker),
                round2(hit.drop_pct),
                round2(hit.revenue_growth),
                round2(hit.earnings_growth),
                round2(hit.debt_equity),
            );
        }
        html.push_str("</tbody>\n</table>\n");
        let _ = write!(
            html,
            "<p><a href=\"/export.csv?{}\" download>Download CSV</a></p>\n",
            escape_html(&query_string(t))
        );

        for hit in ctx.hits {
            html.push_str("<figure>");
            html.push_str(&svg_line_chart(hit));
            html.push_str("</figure>\n");
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;max-width:1100px}\
.sliders label{display:block;margin:.4rem 0}.sliders input{width:100%}\
table{border-collapse:collapse;width:100%}th,td{border:1px solid #ddd;padding:.3rem .6rem;text-align:right}\
th:first-child,td:first-child{text-align:left}.success{color:#137333}.warning{color:#b06000}.error{color:#c5221f}\
.meta{color:#555;font-size:.9rem}figure{margin:1rem 0}.chart{width:100%;height:auto}\
.chart .line{fill:none;stroke:#1f77b4;stroke-width:2}.chart .marker{fill:#1f77b4}\
.chart .axis{stroke:#888}.chart .tick{font-size:11px;fill:#555}.chart .title{font-size:15px}.chart .label{font-size:12px}";
