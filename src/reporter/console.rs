//! Console reporter with colored output

use crate::analyzer::scoring::ScoreCalculator;
use crate::analyzer::AggregateStats;
use crate::{AnalysisResult, Category, CategoryResult, Issue, ScoreTier, Severity};
use colored::{ColoredString, Colorize};

/// Suggestions shown per category unless verbose
const SUGGESTION_PREVIEW: usize = 3;

/// Reporter for terminal output
pub struct ConsoleReporter {
    use_colors: bool,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors on the score bars
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Show every suggestion instead of the first few
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Print a single analysis result
    pub fn report(&self, result: &AnalysisResult) {
        println!("{}", self.render(result));
    }

    /// Print several results followed by the run summary
    pub fn report_many(&self, results: &[AnalysisResult], stats: &AggregateStats) {
        for result in results {
            self.report(result);
            println!("{}", "─".repeat(60));
        }
        println!("{}", self.render_summary(stats));
    }

    /// Print one line per page: `<url>: <score> (<tier>)`
    pub fn report_quiet(&self, result: &AnalysisResult) {
        println!("{}", self.render_quiet(result));
    }

    pub fn render_quiet(&self, result: &AnalysisResult) -> String {
        format!(
            "{}: {} ({})",
            result.page_info.url,
            result.score,
            self.colorize_tier(result.tier())
        )
    }

    /// Full report for one page
    pub fn render(&self, result: &AnalysisResult) -> String {
        let mut out = Vec::new();

        out.push(String::new());
        out.push(
            format!("📊 Page Quality Analysis: {}", result.page_info.url)
                .bold()
                .to_string(),
        );
        let title = if result.page_info.title.is_empty() {
            "(no title)".dimmed().to_string()
        } else {
            result.page_info.title.clone()
        };
        out.push(format!("   Title: {}", title));
        out.push(format!("   Analyzed: {}", result.page_info.timestamp.dimmed()));
        out.push(String::new());

        out.push(format!(
            "   Overall: {} {}",
            self.create_score_bar(result.score),
            self.colorize_tier(result.tier()).bold()
        ));
        out.push(format!(
            "   {}",
            ScoreCalculator::tier_description(result.tier()).dimmed()
        ));
        out.push(String::new());

        out.push(format!("   {}", "Category Scores:".bold()));
        for (category, cat) in result.categories.iter() {
            out.push(format!(
                "   {} {:>3} {} ({})",
                self.create_mini_bar(cat.score),
                cat.score,
                category,
                self.colorize_tier(cat.tier())
            ));
        }

        for (category, cat) in result.categories.iter() {
            self.render_category(&mut out, category, cat);
        }

        out.join("\n")
    }

    fn render_category(&self, out: &mut Vec<String>, category: Category, result: &CategoryResult) {
        if result.issues.is_empty() && result.suggestions.is_empty() {
            return;
        }

        out.push(String::new());
        out.push(format!("   {}", format!("{}:", category).bold()));

        for issue in &result.issues {
            out.push(self.render_issue(issue));
        }

        let shown = if self.verbose {
            result.suggestions.len()
        } else {
            SUGGESTION_PREVIEW.min(result.suggestions.len())
        };
        for suggestion in &result.suggestions[..shown] {
            out.push(format!("     {} {}", "→".cyan(), suggestion.italic()));
        }
        let hidden = result.suggestions.len() - shown;
        if hidden > 0 {
            out.push(format!(
                "     {}",
                format!("{} more suggestions (use --verbose to show)", hidden).dimmed()
            ));
        }
    }

    fn render_issue(&self, issue: &Issue) -> String {
        let icon = match issue.severity {
            Severity::High => "✗".red(),
            Severity::Medium => "⚠".yellow(),
            Severity::Low => "ℹ".blue(),
        };

        let mut line = format!(
            "   {} [{}] {}",
            icon,
            issue.kind.to_string().dimmed(),
            issue.message
        );
        if let Some(ref element) = issue.element {
            line.push_str(&format!(" {}", format!("({})", element).dimmed()));
        }
        line
    }

    /// Aggregate block for multi-page runs
    pub fn render_summary(&self, stats: &AggregateStats) -> String {
        let average_tier = ScoreTier::from_score(stats.average_score);
        [
            String::new(),
            "═".repeat(60),
            "Summary".bold().to_string(),
            "═".repeat(60),
            format!("   Pages analyzed: {}", stats.pages_analyzed.to_string().bold()),
            format!(
                "   Average score:  {} ({})",
                stats.average_score.to_string().bold(),
                self.colorize_tier(average_tier)
            ),
            format!("   Total issues:   {}", stats.total_issues),
            format!("   Accessibility:  {}", stats.accessibility_average),
            format!("   SEO:            {}", stats.seo_average),
            format!("   Performance:    {}", stats.performance_average),
            String::new(),
        ]
        .join("\n")
    }

    fn colorize_tier(&self, tier: ScoreTier) -> ColoredString {
        let s = tier.to_string();
        match tier {
            ScoreTier::Excellent => s.green().bold(),
            ScoreTier::Good => s.green(),
            ScoreTier::Fair => s.yellow(),
            ScoreTier::Poor => s.red().bold(),
        }
    }

    fn create_score_bar(&self, score: u8) -> String {
        let filled = (score as usize * 20) / 100;
        let empty = 20 - filled;

        let bar = format!("[{}{}] {:>3}%", "█".repeat(filled), "░".repeat(empty), score);

        if !self.use_colors {
            return bar;
        }
        match ScoreTier::from_score(score) {
            ScoreTier::Excellent | ScoreTier::Good => bar.green().to_string(),
            ScoreTier::Fair => bar.yellow().to_string(),
            ScoreTier::Poor => bar.red().to_string(),
        }
    }

    fn create_mini_bar(&self, score: u8) -> String {
        let filled = (score as usize * 10) / 100;
        let empty = 10 - filled;
        format!("[{}{}]", "▓".repeat(filled), "░".repeat(empty))
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
