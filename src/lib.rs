//! 方块解迷ソルバー (yuanshen) のフロントエンド
//!
//! 入力フォーム（ブロック数・状態数・ブロックごとの連動チェック・
//! 開始/終了状態）を検証してソルバーのコマンドライン引数に変換し、
//! 外部プロセスとして起動してその標準出力を返す。
//!
//! 探索アルゴリズム自体は外部の `yuanshen` 実行ファイルにある。

pub mod args;
pub mod form;
pub mod launch;
pub mod record;
pub mod report;
pub mod solver;

pub use args::{build_args, format_command_line, link_token, FieldWarning, StateField};
pub use form::{generate_units_state, parse_states, read_adjacency, read_state_list, FormError, FormFileError, PuzzleForm, StateList, StateListError, UnitLinks, MAX_END_STATES, MAX_UNITS};
pub use launch::{run_form, run_form_cancellable, LaunchResult, LaunchWarning};
pub use record::{output_dir, save_run_log, timestamp, write_run_log};
pub use report::{Solution, SolverReport};
pub use solver::{SolverCommand, SolverError, SolverOutput, DEFAULT_SOLVER};
