//! 外部プロセス起動のテスト。ソルバーの代わりに `echo` / `sleep` を使う。
#![cfg(unix)]

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};
use yuanshen_launcher::*;

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// -E を含まないフォーム（echo の -E オプションと衝突するため）
fn sample_form() -> PuzzleForm {
    PuzzleForm {
        number: 2,
        max_state: 3,
        begin: "1,2".into(),
        ..Default::default()
    }
}

// ===== SolverCommand =====

#[test]
fn test_reads_full_stdout() {
    let cmd = SolverCommand::new("echo");
    let out = cmd.run(&strings(&["-N", "2", "-M", "3", "-L", "0:"])).unwrap();
    assert_eq!(out.stdout, "-N 2 -M 3 -L 0:\n");
    assert!(out.status.success());
}

#[test]
fn test_launch_failure() {
    let cmd = SolverCommand::new("/nonexistent/yuanshen");
    match cmd.run(&[]) {
        Err(SolverError::Launch { program, .. }) => assert_eq!(program, "/nonexistent/yuanshen"),
        other => panic!("expected launch error, got {:?}", other),
    }
}

#[test]
fn test_timeout_kills_child() {
    let cmd = SolverCommand::new("sleep").with_timeout(Some(Duration::from_millis(200)));
    let timer = Instant::now();
    let err = cmd.run(&strings(&["10"])).unwrap_err();
    assert!(matches!(err, SolverError::Timeout { .. }), "got {:?}", err);
    assert!(timer.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_timeout_covers_inherited_stdout() {
    // sh はすぐ終わるが、バックグラウンドの sleep が標準出力を開いたまま残る
    let cmd = SolverCommand::new("sh").with_timeout(Some(Duration::from_millis(300)));
    let timer = Instant::now();
    let err = cmd.run(&strings(&["-c", "sleep 10 & echo started"])).unwrap_err();
    assert!(matches!(err, SolverError::Timeout { .. }), "got {:?}", err);
    assert!(timer.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_cancel() {
    let cmd = SolverCommand::new("sleep");
    let cancel = AtomicBool::new(true);
    let err = cmd.run_cancellable(&strings(&["10"]), &cancel).unwrap_err();
    assert!(matches!(err, SolverError::Cancelled { .. }), "got {:?}", err);
}

#[test]
fn test_nonzero_exit_still_returns_output() {
    // 失敗した実行も出力はそのまま返す
    let cmd = SolverCommand::new("false");
    let out = cmd.run(&[]).unwrap();
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}

// ===== run_form =====

#[test]
fn test_run_form_passes_built_args() {
    let mut warnings = Vec::new();
    let result = run_form(&sample_form(), &SolverCommand::new("echo"), |w| warnings.push(w.to_string())).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(result.args, ["-N", "2", "-M", "3", "-L", "0:", "-L", "1:", "-B", "0,1,"]);
    assert_eq!(result.output.unwrap().stdout, "-N 2 -M 3 -L 0: -L 1: -B 0,1,\n");
}

#[test]
fn test_run_form_missing_solver_warns_once() {
    let mut warnings = Vec::new();
    let result = run_form(&sample_form(), &SolverCommand::new("/nonexistent/yuanshen"), |w| {
        warnings.push(w)
    })
    .unwrap();
    assert!(result.output.is_none());
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], LaunchWarning::Solver(SolverError::Launch { .. })));
}

#[test]
fn test_run_form_field_warning_then_runs() {
    let mut form = sample_form();
    form.begin = "1,2,3".into();
    let mut warnings = Vec::new();
    let result = run_form(&form, &SolverCommand::new("echo"), |w| warnings.push(w)).unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], LaunchWarning::Field(_)));
    assert_eq!(result.output.unwrap().stdout, "-N 2 -M 3 -L 0: -L 1:\n");
}

#[test]
fn test_run_form_cancellable_reports_every_warning() {
    let mut form = sample_form();
    form.begin = "1".into();
    form.ends[0] = "9,9".into();
    let cancel = AtomicBool::new(true);
    let mut warnings = Vec::new();
    let result = run_form_cancellable(&form, &SolverCommand::new("sleep"), &cancel, |w| warnings.push(w)).unwrap();

    assert!(result.output.is_none());
    assert_eq!(result.args, ["-N", "2", "-M", "3", "-L", "0:", "-L", "1:"]);
    assert_eq!(warnings.len(), 3);
    assert!(matches!(warnings[0], LaunchWarning::Field(FieldWarning { field: StateField::Begin, .. })));
    assert!(matches!(warnings[1], LaunchWarning::Field(FieldWarning { field: StateField::End(0), .. })));
    assert!(matches!(warnings[2], LaunchWarning::Solver(SolverError::Cancelled { .. })));
}

#[test]
fn test_run_form_invalid_number_does_not_launch() {
    let form = PuzzleForm { number: 7, ..Default::default() };
    let mut warned = false;
    let err = run_form(&form, &SolverCommand::new("echo"), |_| warned = true).unwrap_err();
    assert_eq!(err, FormError::NumberOutOfRange(7));
    assert!(!warned);
}

// ===== 実行ログ =====

#[test]
fn test_write_run_log() {
    let mut form = sample_form();
    form.units[0] = UnitLinks::from_indices([0, 1]);
    let args = form.to_args(|_| {});
    let output = SolverOutput {
        stdout: "NOTHING FOUND!\n".into(),
        stderr: String::new(),
        status: ExitStatus::from_raw(0),
        elapsed: Duration::from_millis(12),
    };
    let mut buf = Vec::new();
    write_run_log(&mut buf, "yuanshen", &form, &args, &output).unwrap();
    let text = String::from_utf8(buf).unwrap();

    assert!(text.contains("number = 2\n"));
    assert!(text.contains("unit1 = 1,2\n"));
    assert!(text.contains("unit2 = \n"));
    assert!(text.contains("command = yuanshen -N 2 -M 3 -L \"0:0,1,\" -L \"1:\" -B \"0,1,\"\n"));
    assert!(text.ends_with("# stdout\nNOTHING FOUND!\n"));
}

#[test]
fn test_save_run_log() {
    let dir = std::env::temp_dir().join(format!("yuanshen-log-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let form = sample_form();
    let output = SolverOutput {
        stdout: "ok\n".into(),
        stderr: "note\n".into(),
        status: ExitStatus::from_raw(0),
        elapsed: Duration::ZERO,
    };
    let path = save_run_log(&dir, "yuanshen", &form, &[], &output).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    assert!(path.file_name().unwrap().to_str().unwrap().starts_with("run_n2_m3_"));
    assert!(text.contains("# stderr\nnote\n"));
}

#[test]
fn test_save_run_log_keeps_earlier_runs() {
    let dir = std::env::temp_dir().join(format!("yuanshen-log-twice-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let form = sample_form();
    let output = |text: &str| SolverOutput {
        stdout: text.into(),
        stderr: String::new(),
        status: ExitStatus::from_raw(0),
        elapsed: Duration::ZERO,
    };
    // 同じフォームを同じ秒のうちに2回保存する
    let first = save_run_log(&dir, "yuanshen", &form, &[], &output("FIRST\n")).unwrap();
    let second = save_run_log(&dir, "yuanshen", &form, &[], &output("SECOND\n")).unwrap();
    let first_text = std::fs::read_to_string(&first).unwrap();
    let second_text = std::fs::read_to_string(&second).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    assert_ne!(first, second);
    assert!(first_text.contains("FIRST"));
    assert!(second_text.contains("SECOND"));
}
