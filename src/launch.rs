use std::fmt;
use std::sync::atomic::AtomicBool;

use crate::args::FieldWarning;
use crate::form::{FormError, PuzzleForm};
use crate::solver::{SolverCommand, SolverError, SolverOutput};

/// 1回の実行中に利用者へ見せる警告
#[derive(Debug)]
pub enum LaunchWarning {
    /// 状態リスト欄が不正。該当フラグを省いて続行する。
    Field(FieldWarning),
    /// ソルバーを実行できなかった。出力はない。
    Solver(SolverError),
}

impl fmt::Display for LaunchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchWarning::Field(w) => write!(f, "{}", w),
            LaunchWarning::Solver(e) => write!(f, "{}", e),
        }
    }
}

/// 実行結果
#[derive(Debug)]
pub struct LaunchResult {
    pub args: Vec<String>,
    /// ソルバーを実行できなかった場合は None
    pub output: Option<SolverOutput>,
}

/// フォーム検証 → 引数組み立て → ソルバー実行。
/// 警告は全て `warn` に渡される（欄ごとに最大1回、実行失敗は1回）。
pub fn run_form(
    form: &PuzzleForm,
    solver: &SolverCommand,
    warn: impl FnMut(LaunchWarning),
) -> Result<LaunchResult, FormError> {
    run_form_cancellable(form, solver, &AtomicBool::new(false), warn)
}

/// 中断フラグ付き版
pub fn run_form_cancellable(
    form: &PuzzleForm,
    solver: &SolverCommand,
    cancel: &AtomicBool,
    mut warn: impl FnMut(LaunchWarning),
) -> Result<LaunchResult, FormError> {
    form.validate()?;
    let args = form.to_args(|w| warn(LaunchWarning::Field(w)));

    let output = match solver.run_cancellable(&args, cancel) {
        Ok(output) => Some(output),
        Err(e) => {
            warn(LaunchWarning::Solver(e));
            None
        }
    };

    Ok(LaunchResult { args, output })
}
