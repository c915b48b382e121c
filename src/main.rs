use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use yuanshen_launcher::*;

/// 方块解迷ソルバー (yuanshen) の起動ツール
///
/// ブロック番号と状態は全て1始まりで指定する。
#[derive(Debug, Parser)]
#[command(version, name = "yuanshen-launcher")]
struct Cli {
    /// ブロック数 (1〜6)
    #[arg(short, long)]
    number: Option<usize>,

    /// 状態数
    #[arg(short, long)]
    max_state: Option<u32>,

    /// ブロックの連動指定 `<ブロック>:<連動ブロック,...>` (例: 1:2,3)
    #[arg(short, long = "link", value_name = "UNIT:TARGETS")]
    links: Vec<LinkSpec>,

    /// 開始状態 (例: 1,2,3)
    #[arg(short, long)]
    begin: Option<String>,

    /// 終了状態 (最大4個)
    #[arg(short, long = "end", value_name = "STATES")]
    ends: Vec<String>,

    /// JSON フォームファイルを読み込む（他の指定で上書き）
    #[arg(short, long, value_name = "FILE")]
    form: Option<PathBuf>,

    /// 最終的なフォームを JSON で保存する
    #[arg(long, value_name = "FILE")]
    save_form: Option<PathBuf>,

    /// ソルバー実行ファイル
    #[arg(long, env = "YUANSHEN_SOLVER", default_value = DEFAULT_SOLVER)]
    solver: PathBuf,

    /// 制限時間 (秒)。超えたらソルバーを停止する
    #[arg(long, env = "YUANSHEN_TIMEOUT", value_name = "SECS")]
    timeout: Option<u64>,

    /// 引数を表示するだけで実行しない
    #[arg(long)]
    dry_run: bool,

    /// 出力の後に解の要約を表示する
    #[arg(long)]
    summary: bool,

    /// output/ に実行ログを保存しない
    #[arg(long)]
    no_log: bool,

    /// ログを詳しくする (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// `--link` の値。内部では0始まり。
#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkSpec {
    unit: usize,
    targets: Vec<usize>,
}

impl FromStr for LinkSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (unit, targets) = s
            .split_once(':')
            .ok_or_else(|| format!("'{}' は <ブロック>:<連動ブロック,...> の形式ではありません", s))?;
        let index = |v: &str| -> Result<usize, String> {
            match v.trim().parse::<usize>() {
                Ok(i) if (1..=MAX_UNITS).contains(&i) => Ok(i - 1),
                _ => Err(format!("'{}' はブロック番号 (1〜{}) ではありません", v, MAX_UNITS)),
            }
        };
        let unit = index(unit)?;
        let targets = targets
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(index)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LinkSpec { unit, targets })
    }
}

impl Cli {
    /// フォームファイルとコマンドライン指定を合わせる
    fn build_form(&self) -> Result<PuzzleForm> {
        let mut form = match &self.form {
            Some(path) => PuzzleForm::load(path)
                .with_context(|| format!("{} を読み込めません", path.display()))?,
            None => PuzzleForm::default(),
        };
        if let Some(number) = self.number {
            form.number = number;
        }
        if let Some(max_state) = self.max_state {
            form.max_state = max_state;
        }
        for link in &self.links {
            let mut unit = UnitLinks::default();
            for &t in &link.targets {
                unit.set(t, true);
            }
            form.units[link.unit] = unit;
        }
        if let Some(begin) = &self.begin {
            form.begin = begin.clone();
        }
        if !self.ends.is_empty() {
            if self.ends.len() > MAX_END_STATES {
                bail!("終了状態は{}個までです ({}個指定)", MAX_END_STATES, self.ends.len());
            }
            form.ends = Default::default();
            for end in &self.ends {
                form.push_end(end.clone());
            }
        }
        form.validate()?;
        Ok(form)
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let form = match cli.build_form() {
        Ok(form) => form,
        Err(e) => {
            eprintln!("エラー: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if let Some(path) = &cli.save_form {
        if let Err(e) = form.save(path) {
            eprintln!("エラー: {}", e);
            return ExitCode::from(2);
        }
        eprintln!("フォーム保存: {}", path.display());
    }

    let program = cli.solver.display().to_string();

    if cli.dry_run {
        let args = form.to_args(|w| eprintln!("警告: {}", w));
        println!("{}", format_command_line(&program, &args));
        return ExitCode::SUCCESS;
    }

    let solver = SolverCommand::new(&cli.solver).with_timeout(cli.timeout.map(Duration::from_secs));
    let result = match run_form(&form, &solver, |w| eprintln!("警告: {}", w)) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("エラー: {}", e);
            return ExitCode::from(2);
        }
    };

    let Some(output) = result.output else {
        return ExitCode::FAILURE;
    };

    print!("{}", output.stdout);
    if cli.summary {
        println!();
        println!("--- 要約 ---");
        print!("{}", SolverReport::parse(&output.stdout));
    }

    if !cli.no_log {
        match save_run_log(&output_dir(), &program, &form, &result.args, &output) {
            Ok(path) => eprintln!("保存: {}", path.display()),
            Err(e) => log::warn!("実行ログを保存できません: {}", e),
        }
    }

    ExitCode::SUCCESS
}
