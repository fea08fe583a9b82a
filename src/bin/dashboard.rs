use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use eyre::Result;
use tracing::{error, info, warn};

use guesthouse_dashboard::advisor::gemini_client::GeminiClient;
use guesthouse_dashboard::advisor::prompts;
use guesthouse_dashboard::analysis::reviews::{self, ReviewInsights};
use guesthouse_dashboard::analysis::tally::Tally;
use guesthouse_dashboard::analysis::trends::{self, OperatingSummary, MOVING_AVERAGE_WINDOW, SUMMARY_WINDOW};
use guesthouse_dashboard::config::Config;
use guesthouse_dashboard::error::DashboardError;
use guesthouse_dashboard::logging;
use guesthouse_dashboard::records::entry::{self, ManualEntry};
use guesthouse_dashboard::records::store::AppendOutcome;

const BAR_WIDTH: usize = 30;

/// Guesthouse dashboard: review insights, operating trends and bookkeeping
#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// 顧客評價分析: companion mix, pain points and strengths
    Reviews {
        /// Ask Gemini for three improvement suggestions
        #[arg(long)]
        ai: bool,
    },

    /// 營運趨勢: revenue with its 7-day moving average and a 30-day summary
    Trends {
        /// Ask Gemini for a seasonal operations diagnosis
        #[arg(long)]
        ai: bool,
    },

    /// 資料輸入: append one day of bookkeeping to the history store
    Record {
        /// Revenue for the day
        revenue: String,

        /// Occupancy as a fraction between 0 and 1
        occupancy: String,

        /// Conversion rate
        conversion: String,

        /// Date as YYYY-MM-DD (default: today)
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse first so --help and usage errors exit before any setup
    let cli = Cli::parse();
    dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME")) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let cfg = Config::load();
    info!(
        history_file = %cfg.history_file.display(),
        review_file = %cfg.review_file.display(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Reviews { ai } => review_page(&cfg, ai).await,
        Commands::Trends { ai } => trends_page(&cfg, ai).await,
        Commands::Record {
            revenue,
            occupancy,
            conversion,
            date,
        } => record_page(&cfg, &revenue, &occupancy, &conversion, date.as_deref().unwrap_or("")),
    }
}

async fn review_page(cfg: &Config, with_ai: bool) -> Result<()> {
    println!("== 顧客評價分析 ==");

    if !cfg.review_file.exists() {
        warn!(path = %cfg.review_file.display(), "Review file not found");
        println!("目前沒有資料。請確認評價檔案 {} 存在 (REVIEW_FILE)。", cfg.review_file.display());
        return Ok(());
    }

    let rows = reviews::load_reviews(&cfg.review_file)?;
    if rows.is_empty() {
        println!("評價檔案沒有任何資料列。");
        return Ok(());
    }
    let insights = ReviewInsights::from_rows(&rows);
    println!("已載入 {} 筆評價資料\n", insights.review_count);

    println!("客群分佈");
    print_bars(&insights.companion_mix);

    println!("\n主要痛點分析");
    if insights.top_cons.is_empty() {
        println!("目前沒有顯著的負評數據。");
    } else {
        print_bars(&insights.top_cons);
    }

    if !insights.top_pros.is_empty() {
        println!("\n主要優點");
        print_bars(&insights.top_pros);
    }

    if with_ai {
        println!("\n== AI 改善建議 ==");
        ask_advisor(cfg, &prompts::review_prompt(&insights)).await;
    }
    Ok(())
}

async fn trends_page(cfg: &Config, with_ai: bool) -> Result<()> {
    println!("== 營運趨勢預測 ==");

    if !cfg.history_file.exists() {
        warn!(path = %cfg.history_file.display(), "History file not found");
        println!("無數據。請先執行 data_generator 或使用 `dashboard record` 輸入資料。");
        return Ok(());
    }

    let rows = trends::load_history(&cfg.history_file)?;
    let Some(summary) = OperatingSummary::from_rows(&rows, SUMMARY_WINDOW) else {
        println!("歷史檔案沒有任何資料列。");
        return Ok(());
    };

    let revenue: Vec<f64> = rows.iter().map(|r| r.revenue).collect();
    let trend = trends::moving_average(&revenue, MOVING_AVERAGE_WINDOW);
    let peak = revenue.iter().cloned().fold(0.0_f64, f64::max);

    println!("{:<12} {:>8} {:>8} {:>10}", "日期", "營收", "住房率", "趨勢(MA7)");
    for (row, ma) in rows.iter().zip(&trend) {
        let ma = ma.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:>8.0} {:>8.2} {:>10} {}",
            row.date.to_string(),
            row.revenue,
            row.occupancy,
            ma,
            bar(row.revenue, peak)
        );
    }

    println!(
        "\n近{}天營收總和: {:.0}, 平均住房率: {:.2}",
        summary.days, summary.revenue_total, summary.mean_occupancy
    );

    if with_ai {
        println!("\n== AI 營運診斷 ==");
        let month = Local::now().month();
        ask_advisor(cfg, &prompts::operations_prompt(&summary, month)).await;
    }
    Ok(())
}

fn record_page(cfg: &Config, revenue: &str, occupancy: &str, conversion: &str, date: &str) -> Result<()> {
    let today = Local::now().date_naive();
    let entry = ManualEntry::parse(date, revenue, occupancy, conversion, today)?;
    let date = entry.date;

    match entry::record_entry(&cfg.history_file, entry)? {
        AppendOutcome::Created { .. } => println!("已建立 {} 並儲存 {} 的紀錄。", cfg.history_file.display(), date),
        AppendOutcome::Appended { .. } | AppendOutcome::Skipped => println!("已儲存 {} 的紀錄！請執行 `dashboard trends` 查看。", date),
    }
    Ok(())
}

/// LLM failures are reported inline and never abort the page
async fn ask_advisor(cfg: &Config, prompt: &str) {
    let client = match GeminiClient::new(cfg) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build Gemini client");
            println!("連線錯誤: {}", e);
            return;
        }
    };

    match client.generate(prompt).await {
        Ok(text) => println!("{}", text),
        Err(DashboardError::MissingApiKey) => println!("請先設定 GEMINI_API_KEY"),
        Err(e) => {
            error!(error = %e, "Gemini request failed");
            println!("連線錯誤: {}", e);
        }
    }
}

fn print_bars(tallies: &[Tally]) {
    let peak = tallies.iter().map(|t| t.count).max().unwrap_or(0) as f64;
    for t in tallies {
        println!("  {:<10} {:>4} {}", t.label, t.count, bar(t.count as f64, peak));
    }
}

fn bar(value: f64, peak: f64) -> String {
    if peak <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let width = ((value / peak) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(width.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ai_flag_is_optional() {
        let cli = Cli::try_parse_from(["dashboard", "reviews"]).unwrap();
        assert_eq!(cli.command, Commands::Reviews { ai: false });

        let cli = Cli::try_parse_from(["dashboard", "trends", "--ai"]).unwrap();
        assert_eq!(cli.command, Commands::Trends { ai: true });
    }

    #[test]
    fn record_takes_optional_date() {
        let cli = Cli::try_parse_from(["dashboard", "record", "8800", "0.92", "3.4"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Record {
                revenue: "8800".to_string(),
                occupancy: "0.92".to_string(),
                conversion: "3.4".to_string(),
                date: None,
            }
        );

        let cli = Cli::try_parse_from(["dashboard", "record", "8800", "0.92", "3.4", "2024-07-19"]).unwrap();
        assert!(matches!(cli.command, Commands::Record { date: Some(ref d), .. } if d == "2024-07-19"));
    }

    #[test]
    fn help_and_unknown_commands() {
        let err = Cli::try_parse_from(["dashboard", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);

        assert!(Cli::try_parse_from(["dashboard", "forecast"]).is_err());
        assert!(Cli::try_parse_from(["dashboard", "record", "8800"]).is_err());
    }
}
