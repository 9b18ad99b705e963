use crate::dashboard::Dashboard;
use crate::models::{Letter, PRODUCT_TYPES};

pub fn render_index(dashboard: &Dashboard) -> String {
    let filter = &dashboard.filter;
    fill_template(
        INDEX_HTML,
        &[
            ("START", escape_html(&filter.start)),
            ("END", escape_html(&filter.end)),
            ("PRODUCT_OPTIONS", product_options(filter.product_type())),
            ("LETTER_COUNT", dashboard.data.letters.len().to_string()),
            ("LETTER_ROWS", letter_rows(&dashboard.data.letters)),
            ("STATUS", status_line(dashboard)),
        ],
    )
}

/// Substitutes `{{NAME}}` placeholders in one pass over `template`. Inserted
/// values are never scanned again, so text that looks like a placeholder stays
/// literal. Unknown placeholders are kept as they are.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            rest = &rest[open..];
            break;
        };
        let name = &after[..close];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

fn product_options(selected: Option<&str>) -> String {
    let mut html = format!(
        r#"<option value=""{}>All</option>"#,
        if selected.is_none() { " selected" } else { "" }
    );
    for product_type in PRODUCT_TYPES {
        let marker = if selected == Some(product_type) { " selected" } else { "" };
        html.push_str(&format!(
            r#"<option value="{product_type}"{marker}>{product_type}</option>"#
        ));
    }
    // Keep a value that came in through the JSON API selectable.
    if let Some(other) = selected.filter(|value| !PRODUCT_TYPES.contains(value)) {
        let other = escape_html(other);
        html.push_str(&format!(r#"<option value="{other}" selected>{other}</option>"#));
    }
    html
}

fn letter_rows(letters: &[Letter]) -> String {
    if letters.is_empty() {
        return r#"<tr><td colspan="5" class="empty">No letters for this filter.</td></tr>"#
            .to_string();
    }

    letters
        .iter()
        .map(|letter| {
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href="{}" target="_blank" rel="noopener">open</a></td></tr>"#,
                escape_html(&letter.issue_date),
                escape_html(&letter.firm),
                escape_html(&letter.product_type),
                escape_html(&letter.issuing_office),
                escape_html(&letter.url),
            )
        })
        .collect()
}

fn status_line(dashboard: &Dashboard) -> String {
    let failures = &dashboard.last_outcome.failures;
    if failures.is_empty() {
        return String::new();
    }
    let endpoints: Vec<String> = failures
        .iter()
        .map(|failure| failure.endpoint.to_string())
        .collect();
    escape_html(&format!(
        "Could not refresh {}; showing previous data.",
        endpoints.join(", ")
    ))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
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

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>FDA Warning Letters</title>
  <style>
    :root {
      --bg: #f6f7f9;
      --ink: #22262b;
      --muted: #6b7079;
      --accent: #2f6fdb;
      --accent-2: #e0672f;
      --card: #ffffff;
      --line: #e5e5e5;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: Inter, system-ui, sans-serif;
    }

    .app {
      max-width: 1100px;
      margin: 0 auto;
      padding: 16px;
      display: grid;
      gap: 20px;
    }

    h1 {
      font-size: 28px;
      margin: 0;
    }

    h3 {
      margin: 0 0 8px;
    }

    .filters {
      display: grid;
      grid-template-columns: repeat(4, 1fr);
      gap: 12px;
      align-items: end;
    }

    .filters label {
      display: grid;
      gap: 4px;
      font-size: 0.9rem;
      color: var(--muted);
    }

    .filters input,
    .filters select {
      padding: 6px 8px;
      border: 1px solid var(--line);
      border-radius: 8px;
      font: inherit;
      color: var(--ink);
    }

    button,
    .button {
      appearance: none;
      border: none;
      border-radius: 8px;
      padding: 8px 14px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
      text-decoration: none;
    }

    .grid-2 {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 16px;
    }

    .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 12px;
    }

    .card-header {
      display: flex;
      justify-content: space-between;
      align-items: center;
    }

    svg.chart {
      width: 100%;
      height: 260px;
      display: block;
    }

    .chart-bar {
      fill: var(--accent);
    }

    .chart-grid {
      stroke: rgba(34, 38, 43, 0.1);
    }

    .chart-label {
      fill: var(--muted);
      font-size: 10px;
    }

    .chart-line {
      fill: none;
      stroke-width: 2;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th {
      text-align: left;
      border-bottom: 1px solid #ddd;
      padding: 8px;
    }

    td {
      border-bottom: 1px solid #f0f0f0;
      padding: 8px;
    }

    td.empty {
      color: var(--muted);
      text-align: center;
    }

    .status {
      min-height: 1.2em;
      color: #c63b2b;
    }

    @media (max-width: 700px) {
      .filters,
      .grid-2 {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>FDA Warning Letters</h1>

    <form class="filters" method="post" action="/apply">
      <label>Start <input type="date" name="start" value="{{START}}" /></label>
      <label>End <input type="date" name="end" value="{{END}}" /></label>
      <label>Product Type
        <select name="product_type">{{PRODUCT_OPTIONS}}</select>
      </label>
      <button type="submit">Apply</button>
    </form>

    <div class="status" id="status">{{STATUS}}</div>

    <section class="grid-2">
      <div class="card">
        <h3>Top CFR Codes</h3>
        <svg id="top-cfr" class="chart" viewBox="0 0 500 260" role="img" aria-label="Top CFR codes"></svg>
      </div>
      <div class="card">
        <h3>Issuing Offices (Count)</h3>
        <svg id="offices" class="chart" viewBox="0 0 500 260" role="img" aria-label="Issuing offices"></svg>
      </div>
    </section>

    <section class="card">
      <h3>Top CFR Trend</h3>
      <svg id="trend" class="chart" viewBox="0 0 1000 260" role="img" aria-label="Top CFR trend"></svg>
    </section>

    <section class="card">
      <div class="card-header">
        <h3>Letters ({{LETTER_COUNT}})</h3>
        <a class="button" href="/letters.csv" download="letters.csv">Download CSV</a>
      </div>
      <table>
        <thead>
          <tr><th>Date</th><th>Firm</th><th>Product</th><th>Office</th><th>URL</th></tr>
        </thead>
        <tbody>{{LETTER_ROWS}}</tbody>
      </table>
    </section>
  </main>

  <script>
    const PALETTE = ['#2f6fdb', '#e0672f', '#2d7a4b', '#8a4fd1', '#c63b2b', '#1f8ea3'];
    const statusEl = document.getElementById('status');

    const escapeText = (value) =>
      String(value).replace(/[&<>"']/g, (ch) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[ch]));

    const empty = (el) => {
      el.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
    };

    const renderBarChart = (el, rows, labelKey) => {
      if (!rows.length) {
        empty(el);
        return;
      }
      const width = 500;
      const height = 260;
      const padX = 36;
      const padBottom = 46;
      const top = 12;
      const max = Math.max(1, ...rows.map((row) => row.count));
      const slot = (width - padX * 2) / rows.length;
      const barWidth = Math.max(4, slot * 0.7);
      const y = (value) => height - padBottom - (value / max) * (height - padBottom - top);

      let svg = '';
      for (let i = 0; i <= 4; i += 1) {
        const value = (max * i) / 4;
        svg += `<line class="chart-grid" x1="${padX}" y1="${y(value)}" x2="${width - padX}" y2="${y(value)}" />`;
        svg += `<text class="chart-label" x="${padX - 6}" y="${y(value) + 3}" text-anchor="end">${Math.round(value)}</text>`;
      }
      rows.forEach((row, index) => {
        const x = padX + index * slot + (slot - barWidth) / 2;
        svg += `<rect class="chart-bar" x="${x}" y="${y(row.count)}" width="${barWidth}" height="${height - padBottom - y(row.count)}"><title>${escapeText(row[labelKey])}: ${row.count}</title></rect>`;
        svg += `<text class="chart-label" x="${x + barWidth / 2}" y="${height - padBottom + 14}" text-anchor="middle">${escapeText(row[labelKey]).slice(0, 14)}</text>`;
      });
      el.innerHTML = svg;
    };

    const renderTrendChart = (el, trend) => {
      if (!trend.series.length || !trend.codes.length) {
        empty(el);
        return;
      }
      const width = 1000;
      const height = 260;
      const padX = 44;
      const padBottom = 40;
      const top = 12;
      const max = Math.max(1, ...trend.series.flatMap((point) => trend.codes.map((code) => point[code] || 0)));
      const step = trend.series.length > 1 ? (width - padX * 2) / (trend.series.length - 1) : 0;
      const x = (index) => padX + index * step;
      const y = (value) => height - padBottom - (value / max) * (height - padBottom - top);

      let svg = '';
      for (let i = 0; i <= 4; i += 1) {
        const value = (max * i) / 4;
        svg += `<line class="chart-grid" x1="${padX}" y1="${y(value)}" x2="${width - padX}" y2="${y(value)}" />`;
        svg += `<text class="chart-label" x="${padX - 8}" y="${y(value) + 3}" text-anchor="end">${Math.round(value)}</text>`;
      }
      trend.codes.forEach((code, codeIndex) => {
        const color = PALETTE[codeIndex % PALETTE.length];
        const path = trend.series
          .map((point, index) => `${index === 0 ? 'M' : 'L'} ${x(index).toFixed(2)} ${y(point[code] || 0).toFixed(2)}`)
          .join(' ');
        svg += `<path class="chart-line" stroke="${color}" d="${path}"><title>${escapeText(code)}</title></path>`;
        svg += `<text class="chart-label" x="${padX + codeIndex * 160}" y="${height - 6}" fill="${color}">${escapeText(code)}</text>`;
      });
      const labelEvery = trend.series.length > 12 ? Math.ceil(trend.series.length / 12) : 1;
      trend.series.forEach((point, index) => {
        if (index % labelEvery === 0) {
          svg += `<text class="chart-label" x="${x(index)}" y="${height - padBottom + 14}" text-anchor="middle">${escapeText(point.period)}</text>`;
        }
      });
      el.innerHTML = svg;
    };

    const loadCharts = async () => {
      const res = await fetch('/api/dashboard');
      if (!res.ok) {
        throw new Error('Unable to load dashboard data');
      }
      const snapshot = await res.json();
      renderBarChart(document.getElementById('top-cfr'), snapshot.data.top_cfr, 'cfr_code');
      renderBarChart(document.getElementById('offices'), snapshot.data.issuing_offices, 'issuing_office');
      renderTrendChart(document.getElementById('trend'), snapshot.data.top_cfr_trend);
    };

    loadCharts().catch((err) => {
      statusEl.textContent = err.message;
    });
  </script>
</body>
</html>
"#;
