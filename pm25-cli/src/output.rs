use pm25_core::{HistoryTable, HistoryView, ModelBundle, Prediction};

/// Whole numbers print without decimals, everything else with two.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

pub fn print_model_summary(model: &ModelBundle) {
    let features = model.features_used();
    println!("Model ready. Features ({}): {}", features.len(), features.join(", "));
}

pub fn print_prediction(prediction: &Prediction) {
    let features = prediction
        .features
        .iter()
        .map(|(name, value)| format!("{name}={}", format_value(value)))
        .collect::<Vec<_>>()
        .join(" ");

    println!("#{}  {features}", prediction.sequence);
    println!("Predicted PM2.5: {:.2} µg/m³", prediction.predicted_pm2_5);
}

pub fn format_table(table: &HistoryTable) -> String {
    let header: Vec<String> =
        std::iter::once("#".to_string()).chain(table.columns.iter().cloned()).collect();

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            std::iter::once((i + 1).to_string())
                .chain(row.iter().map(|v| format_value(*v)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            rows.iter()
                .map(|r| r[col].len())
                .chain([header[col].len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:>width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = render(&header);
    for row in &rows {
        out.push('\n');
        out.push_str(&render(row));
    }
    out
}

pub fn print_history(view: &HistoryView) {
    if view.table.rows.is_empty() {
        println!("No predictions yet.");
        return;
    }

    println!("{}", format_table(&view.table));

    let trend = view
        .chart
        .points
        .iter()
        .map(|(_, y)| format!("{y:.1}"))
        .collect::<Vec<_>>()
        .join(" -> ");
    println!("Trend: {trend}");
}
