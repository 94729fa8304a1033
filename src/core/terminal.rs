use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static BANK: Emoji<'_, '_> = Emoji("🏦 ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_banner() {
    println!();
    println!(
        "{} {}",
        BANK,
        style("bankops · operations console").bold().cyan()
    );
    println!("{}\n", style("Automation tasks, knowledge base, logs and billing.").dim());
}

/// Block of help or result output with a title and aligned rows.
///
/// Built fluently and flushed with [`GuideSection::print`]; rows are kept
/// as rendered strings so tests can inspect them without a terminal.
#[derive(Debug, Clone, Default)]
pub struct GuideSection {
    title: String,
    lines: Vec<String>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.lines.push(format!(
            "  {:<14} {}",
            style(name).green().bold(),
            description
        ));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.lines
            .push(format!("  {} {}", style(format!("{}:", label)).bold(), value));
        self
    }

    pub fn bullet(mut self, text: &str) -> Self {
        self.lines.push(format!("  {} {}", style("•").cyan(), text));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.lines.push(format!("  {}", text));
        self
    }

    pub fn hint(mut self, example: &str, note: &str) -> Self {
        if note.is_empty() {
            self.lines.push(format!("  {} {}", style("$").dim(), example));
        } else {
            self.lines.push(format!(
                "  {} {}  {}",
                style("$").dim(),
                example,
                style(note).dim()
            ));
        }
        self
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(String::new());
        self
    }

    pub fn print(&self) {
        println!();
        println!("{}", style(&self.title).bold().underlined());
        for line in &self.lines {
            println!("{}", line);
        }
    }
}
