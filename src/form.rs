use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// ブロック数の上限（ユニットのグループ数は固定で6個）
pub const MAX_UNITS: usize = 6;
/// 終了状態の入力欄の数
pub const MAX_END_STATES: usize = 4;

/// フォーム全体の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("ブロック数 {0} は範囲外です (1〜6)")]
    NumberOutOfRange(usize),
    #[error("状態数 {0} は範囲外です (1以上)")]
    MaxStateOutOfRange(u32),
}

/// 状態リスト欄の検証エラー。メッセージは警告としてそのまま表示される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateListError {
    #[error("'{text}' 状態の個数がブロック数と一致しません ({found}個 / {expected}個)")]
    CountMismatch {
        text: String,
        expected: usize,
        found: usize,
    },
    #[error("'{text}' の '{token}' は1以上の整数ではありません")]
    InvalidValue { text: String, token: String },
    #[error("'{text}' の状態 {state} は状態数 {max_state} を超えています")]
    OutOfRange {
        text: String,
        state: u32,
        max_state: u32,
    },
}

/// 1個のブロックに対応するチェックボックス群。
/// `targets[j]` は「このブロックを叩くとブロック j も変化する」を表す（0始まり）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLinks {
    pub targets: [bool; MAX_UNITS],
}

impl UnitLinks {
    /// 0始まりの添字列から作る。範囲外の添字は無視する。
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut links = Self::default();
        for j in indices {
            links.set(j, true);
        }
        links
    }

    /// 範囲外なら何もせず false を返す
    pub fn set(&mut self, target: usize, checked: bool) -> bool {
        match self.targets.get_mut(target) {
            Some(slot) => {
                *slot = checked;
                true
            }
            None => false,
        }
    }

    pub fn is_checked(&self, target: usize) -> bool {
        self.targets.get(target).copied().unwrap_or(false)
    }
}

/// 長さ `number` の隣接ベクトルを読む。`number` 以上の位置のチェックは無視する。
pub fn read_adjacency(unit: &UnitLinks, number: usize) -> Vec<bool> {
    (0..number).map(|j| unit.is_checked(j)).collect()
}

/// 検証済みの状態列（0始まり）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateList(Vec<u32>);

impl StateList {
    pub fn states(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 全状態が `max_state` 未満であることを確認する
    pub fn check_max_state(&self, text: &str, max_state: u32) -> Result<(), StateListError> {
        match self.0.iter().find(|&&s| s >= max_state) {
            Some(&s) => Err(StateListError::OutOfRange {
                text: text.to_string(),
                state: s + 1,
                max_state,
            }),
            None => Ok(()),
        }
    }
}

/// ソルバーに渡す形式: 各値の後ろにカンマ（"0,1,2,"）
impl fmt::Display for StateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.0 {
            write!(f, "{},", s)?;
        }
        Ok(())
    }
}

/// カンマ区切りの1始まり整数列を0始まりに変換する（個数は問わない）
pub fn parse_states(text: &str) -> Result<StateList, StateListError> {
    text.split(',')
        .map(|token| {
            let token = token.trim();
            match token.parse::<u32>() {
                Ok(v) if v >= 1 => Ok(v - 1),
                _ => Err(StateListError::InvalidValue {
                    text: text.to_string(),
                    token: token.to_string(),
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(StateList)
}

/// "1,2,3" → "0,1,2,"
pub fn generate_units_state(text: &str) -> Result<String, StateListError> {
    Ok(parse_states(text)?.to_string())
}

/// 状態リスト欄を読む。
/// 空文字列は `Ok(None)`（フラグ省略、警告なし）。空白だけの欄は空欄扱いしない。
/// 個数は空要素も含めて数える。
pub fn read_state_list(text: &str, number: usize) -> Result<Option<StateList>, StateListError> {
    if text.is_empty() {
        return Ok(None);
    }
    let found = text.split(',').count();
    if found != number {
        return Err(StateListError::CountMismatch {
            text: text.to_string(),
            expected: number,
            found,
        });
    }
    parse_states(text).map(Some)
}

/// JSON フォームファイルの読み書きエラー
#[derive(Debug, Error)]
pub enum FormFileError {
    #[error("フォームファイルを読み書きできません: {0}")]
    Io(#[from] std::io::Error),
    #[error("フォームファイルの形式が不正です: {0}")]
    Json(#[from] serde_json::Error),
}

/// 入力フォームの全項目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleForm {
    pub number: usize,
    pub max_state: u32,
    pub units: [UnitLinks; MAX_UNITS],
    pub begin: String,
    pub ends: [String; MAX_END_STATES],
}

impl Default for PuzzleForm {
    fn default() -> Self {
        Self {
            number: 3,
            max_state: 3,
            units: [UnitLinks::default(); MAX_UNITS],
            begin: String::new(),
            ends: Default::default(),
        }
    }
}

impl PuzzleForm {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.number == 0 || self.number > MAX_UNITS {
            return Err(FormError::NumberOutOfRange(self.number));
        }
        if self.max_state == 0 {
            return Err(FormError::MaxStateOutOfRange(self.max_state));
        }
        Ok(())
    }

    /// `number` 行の隣接マップ
    pub fn adjacency(&self) -> Vec<Vec<bool>> {
        self.units
            .iter()
            .take(self.number)
            .map(|unit| read_adjacency(unit, self.number))
            .collect()
    }

    /// 1個目の空いている終了状態欄に入れる。全て埋まっていれば false。
    pub fn push_end(&mut self, text: impl Into<String>) -> bool {
        match self.ends.iter_mut().find(|e| e.is_empty()) {
            Some(slot) => {
                *slot = text.into();
                true
            }
            None => false,
        }
    }

    pub fn load(path: &Path) -> Result<Self, FormFileError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), FormFileError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}
