use dotenvy::dotenv;
use eyre::Result;
use std::io::{self, BufRead, Write};
use tracing::info;

use guesthouse_dashboard::config;
use guesthouse_dashboard::logging;
use guesthouse_dashboard::records::generator::{self, DEFAULT_DAY_COUNT, DEFAULT_START_DATE};
use guesthouse_dashboard::records::store::{self, AppendOutcome};

fn prompt(stdin: &mut impl BufRead, question: &str) -> Result<String> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn main() -> Result<()> {
    // Missing .env is fine, every setting has a default
    dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME")) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let cfg = config::Config::load();
    info!(history_file = %cfg.history_file.display(), "Configuration loaded");

    println!("--- 測試資料產生器 ---");
    let mut stdin = io::stdin().lock();
    let start = prompt(&mut stdin, &format!("請輸入開始日期 (格式 YYYY-MM-DD，預設 {}): ", DEFAULT_START_DATE))?;
    let days = prompt(&mut stdin, &format!("要生成幾天的資料? (預設 {}): ", DEFAULT_DAY_COUNT))?;

    // Inputs are validated before anything is generated or written
    let records = generator::generate_from_input(&start, &days, &mut rand::rng())?;

    let path = cfg.history_file.as_path();
    match store::append(path, &records)? {
        AppendOutcome::Created { rows } => {
            println!("已建立新檔案 {} 並寫入 {} 筆資料", path.display(), rows)
        }
        AppendOutcome::Appended { rows } => {
            println!("已成功新增 {} 筆資料到 {}", rows, path.display())
        }
        AppendOutcome::Skipped => println!("沒有資料需要寫入 {}", path.display()),
    }

    println!("完成！現在可以執行 dashboard 查看資料了。");
    Ok(())
}
