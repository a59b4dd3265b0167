//! Output formatting for the CLI.

use console::style;
use turbo_cart::projector::RenderModel;
use turbo_cart_sync::{CartEvent, SyncState};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        println!("  {}", format_row(cols, widths));
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print a cart, as a table or as JSON.
    pub fn cart(&self, model: &RenderModel) {
        if self.json {
            self.json(model);
            return;
        }

        if model.is_empty {
            self.info(&format!("Cart is empty (version {})", model.version));
            return;
        }

        const WIDTHS: [usize; 5] = [10, 28, 14, 5, 14];
        self.table_row(&["ID", "PRODUCT", "PRICE", "QTY", "TOTAL"], &WIDTHS);
        for line in &model.lines {
            let quantity = line.quantity.to_string();
            self.table_row(
                &[
                    line.product_id.as_str(),
                    &line.name,
                    &line.unit_price_formatted,
                    &quantity,
                    &line.line_total_formatted,
                ],
                &WIDTHS,
            );
        }
        println!();
        self.kv("Items", &model.item_count.to_string());
        self.kv("Subtotal", &style(&model.subtotal_display).bold().to_string());
        self.kv("Version", &model.version.to_string());
    }

    /// Print one engine event as it arrives.
    pub fn event(&self, event: &CartEvent) {
        if self.json {
            return;
        }
        match event {
            CartEvent::SnapshotChanged { model, confirmed } => {
                let label = if *confirmed {
                    style("confirmed").green()
                } else {
                    style("optimistic").yellow()
                };
                println!(
                    "  {} {} v{}: {} item(s), {}",
                    style("•").dim(),
                    label,
                    model.version,
                    model.item_count,
                    model.subtotal_display
                );
            }
            CartEvent::MutationFailed { operation, reason } => {
                println!(
                    "  {} {} failed: {}",
                    style("•").dim(),
                    operation,
                    style(reason).red()
                );
            }
            CartEvent::RefreshFailed { reason } => {
                println!("  {} refresh failed: {}", style("•").dim(), style(reason).red());
            }
        }
    }
}

fn format_row(cols: &[&str], widths: &[usize]) -> String {
    cols.iter()
        .zip(widths.iter())
        .map(|(col, width)| format!("{:width$}", col, width = width))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Status badge for engine states.
pub fn state_badge(state: SyncState) -> String {
    let label = state.to_string();
    match state {
        SyncState::Idle => style(label).green().to_string(),
        SyncState::Mutating | SyncState::Refreshing => style(label).yellow().to_string(),
        SyncState::Stopped => style(label).dim().to_string(),
    }
}
