use std::fmt;

use crate::form::{read_state_list, PuzzleForm, StateListError, MAX_END_STATES};

/// 状態リスト欄の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    Begin,
    /// 0始まり（表示は1始まり）
    End(usize),
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateField::Begin => write!(f, "開始状態"),
            StateField::End(i) => write!(f, "終了状態{}", i + 1),
        }
    }
}

/// 欄ごとの検証警告。該当フラグは省略されている。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWarning {
    pub field: StateField,
    pub error: StateListError,
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// 1欄を検証して "0,1,2," 形式の値を返す。
/// 不正なら `warn` を1回だけ呼び None。
fn state_value(
    field: StateField,
    text: &str,
    number: usize,
    max_state: u32,
    warn: &mut impl FnMut(FieldWarning),
) -> Option<String> {
    let checked = read_state_list(text, number).and_then(|list| match list {
        Some(list) => list.check_max_state(text, max_state).map(|_| Some(list)),
        None => Ok(None),
    });
    match checked {
        Ok(list) => list.map(|l| l.to_string()),
        Err(error) => {
            warn(FieldWarning { field, error });
            None
        }
    }
}

/// "<i>:<j0>,<j1>,..." 形式の隣接トークン
pub fn link_token(unit: usize, adjacency: &[bool]) -> String {
    let mut token = format!("{}:", unit);
    for (j, &on) in adjacency.iter().enumerate() {
        if on {
            token.push_str(&j.to_string());
            token.push(',');
        }
    }
    token
}

/// ソルバーの引数列を組み立てる。
///
/// 順序は固定: `-N`, `-M`, `-L` をブロック数ぶん, 有効なら `-B`,
/// 有効な終了状態ごとに `-E`（最大4個、各欄は独立に検証）。
/// `adjacency` の行が足りないブロックは隣接なしとして扱う。
pub fn build_args<S: AsRef<str>>(
    number: usize,
    max_state: u32,
    adjacency: &[Vec<bool>],
    begin: &str,
    ends: &[S],
    mut warn: impl FnMut(FieldWarning),
) -> Vec<String> {
    let mut args = vec![
        "-N".to_string(),
        number.to_string(),
        "-M".to_string(),
        max_state.to_string(),
    ];

    for i in 0..number {
        let row: Vec<bool> = adjacency
            .get(i)
            .map(|r| r.iter().copied().take(number).collect())
            .unwrap_or_default();
        args.push("-L".to_string());
        args.push(link_token(i, &row));
    }

    if let Some(value) = state_value(StateField::Begin, begin, number, max_state, &mut warn) {
        args.push("-B".to_string());
        args.push(value);
    }

    if ends.len() > MAX_END_STATES {
        log::warn!(
            "終了状態は{}個までです。{}個目以降は無視します",
            MAX_END_STATES,
            MAX_END_STATES + 1
        );
    }
    for (i, end) in ends.iter().take(MAX_END_STATES).enumerate() {
        if let Some(value) = state_value(StateField::End(i), end.as_ref(), number, max_state, &mut warn) {
            args.push("-E".to_string());
            args.push(value);
        }
    }

    args
}

impl PuzzleForm {
    /// フォームの内容から引数列を組み立てる（検証は呼び出し側で行う）
    pub fn to_args(&self, warn: impl FnMut(FieldWarning)) -> Vec<String> {
        build_args(
            self.number,
            self.max_state,
            &self.adjacency(),
            &self.begin,
            &self.ends,
            warn,
        )
    }
}

/// 表示用のコマンドライン。カンマや空白を含む値は引用符で囲む。
pub fn format_command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.contains([',', ' ', ':']) {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}
