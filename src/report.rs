//! ソルバー出力の解析。
//!
//! ソルバーは次の形式で解を出力する（状態は0始まり、打击番号は1始まり）:
//!
//! ```text
//! 初始状态 = Units { units: [0, 1], max_state: 3 }
//! 打击第 2 个方块
//! 当前状态 = Units { units: [1, 2], max_state: 3 }
//! 打击第 1 个方块
//! 结束状态 = Units { units: [2, 2], max_state: 3 }
//! ```
//!
//! 解がなければ `NOTHING FOUND!` の1行。表示は常に生の出力で行い、
//! ここでの解析結果は要約にだけ使う。

use std::fmt;

const BEGIN_PREFIX: &str = "初始状态";
const CURRENT_PREFIX: &str = "当前状态";
const END_PREFIX: &str = "结束状态";
const HIT_PREFIX: &str = "打击第";
const HIT_SUFFIX: &str = "个方块";
const NOTHING_FOUND: &str = "NOTHING FOUND!";

/// 解の手順
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// 各局面の状態（0始まり）。先頭が初期状態、末尾が終了状態。
    pub states: Vec<Vec<u32>>,
    /// 叩くブロック（1始まり）。`states.len() - 1` 個。
    pub hits: Vec<usize>,
}

impl Solution {
    pub fn moves(&self) -> usize {
        self.hits.len()
    }
}

/// 1始まりで表示
fn fmt_states(states: &[u32]) -> String {
    states
        .iter()
        .map(|s| (s + 1).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "手数 = {}", self.moves())?;
        if let Some(first) = self.states.first() {
            writeln!(f, "初期状態 = [{}]", fmt_states(first))?;
        }
        for (hit, state) in self.hits.iter().zip(self.states.iter().skip(1)) {
            writeln!(f, "  ブロック{}を叩く → [{}]", hit, fmt_states(state))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverReport {
    Solved(Solution),
    NothingFound,
    /// 既知の形式ではない（エラー出力など）
    Unrecognized,
}

/// "... units: [0, 1, 2], ..." から状態列を取り出す
fn parse_units(line: &str) -> Option<Vec<u32>> {
    let start = line.find("units: [")? + "units: [".len();
    let len = line[start..].find(']')?;
    let body = line[start..start + len].trim();
    if body.is_empty() {
        return Some(Vec::new());
    }
    body.split(',').map(|v| v.trim().parse::<u32>().ok()).collect()
}

fn parse_hit(line: &str) -> Option<usize> {
    line.strip_prefix(HIT_PREFIX)?
        .strip_suffix(HIT_SUFFIX)?
        .trim()
        .parse()
        .ok()
}

impl SolverReport {
    pub fn parse(stdout: &str) -> Self {
        let mut states = Vec::new();
        let mut hits = Vec::new();

        for line in stdout.lines().map(str::trim) {
            if line == NOTHING_FOUND {
                return SolverReport::NothingFound;
            }
            if [BEGIN_PREFIX, CURRENT_PREFIX, END_PREFIX]
                .iter()
                .any(|p| line.starts_with(p))
            {
                match parse_units(line) {
                    Some(units) => states.push(units),
                    None => return SolverReport::Unrecognized,
                }
            } else if let Some(hit) = parse_hit(line) {
                hits.push(hit);
            }
        }

        if states.is_empty() {
            return SolverReport::Unrecognized;
        }
        // 初期状態がそのまま終了状態の場合も「打击第 1 个方块」が出力される
        hits.truncate(states.len() - 1);
        if hits.len() != states.len() - 1 {
            return SolverReport::Unrecognized;
        }
        SolverReport::Solved(Solution { states, hits })
    }
}

impl fmt::Display for SolverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverReport::Solved(solution) => write!(f, "{}", solution),
            SolverReport::NothingFound => writeln!(f, "解は見つかりませんでした"),
            SolverReport::Unrecognized => writeln!(f, "ソルバーの出力を解釈できませんでした"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(
            parse_units("当前状态 = Units { units: [0, 2, 1], max_state: 3 }"),
            Some(vec![0, 2, 1])
        );
        assert_eq!(parse_units("Units { units: [], max_state: 3 }"), Some(vec![]));
        assert_eq!(parse_units("units: [0, x]"), None);
        assert_eq!(parse_units("no units here"), None);
    }

    #[test]
    fn test_parse_hit() {
        assert_eq!(parse_hit("打击第 3 个方块"), Some(3));
        assert_eq!(parse_hit("打击第 x 个方块"), None);
        assert_eq!(parse_hit("something else"), None);
    }
}
