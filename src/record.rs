use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::args::format_command_line;
use crate::form::PuzzleForm;
use crate::solver::SolverOutput;

/// 実行ログの保存先。無ければ作る。
pub fn output_dir() -> PathBuf {
    let dir = PathBuf::from("output");
    fs::create_dir_all(&dir).ok();
    dir
}

/// ファイル名用の時刻 (年月日_時分秒, UTC)
pub fn timestamp() -> String {
    format_timestamp(Utc::now())
}

fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

pub fn log_file_name(form: &PuzzleForm) -> String {
    format!("run_n{}_m{}_{}.txt", form.number, form.max_state, timestamp())
}

/// 同名のファイルがあれば `_1`, `_2`, ... を付けて新規作成する
fn create_unique(dir: &Path, name: &str) -> io::Result<(PathBuf, File)> {
    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
    for n in 0u32.. {
        let candidate = match (n, ext) {
            (0, _) => name.to_string(),
            (_, "") => format!("{}_{}", stem, n),
            _ => format!("{}_{}.{}", stem, n, ext),
        };
        let path = dir.join(candidate);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::other("ログファイル名を決められません"))
}

/// 1回の実行を `dir` に保存し、そのパスを返す。既存のログは上書きしない。
pub fn save_run_log(
    dir: &Path,
    program: &str,
    form: &PuzzleForm,
    args: &[String],
    output: &SolverOutput,
) -> io::Result<PathBuf> {
    let (path, file) = create_unique(dir, &log_file_name(form))?;
    let mut w = BufWriter::new(file);
    write_run_log(&mut w, program, form, args, output)?;
    w.flush()?;
    Ok(path)
}

pub fn write_run_log(
    w: &mut impl Write,
    program: &str,
    form: &PuzzleForm,
    args: &[String],
    output: &SolverOutput,
) -> io::Result<()> {
    writeln!(w, "# yuanshen-launcher run")?;
    writeln!(w, "number = {}", form.number)?;
    writeln!(w, "max_state = {}", form.max_state)?;
    for (i, unit) in form.units.iter().take(form.number).enumerate() {
        let targets: Vec<String> = (0..form.number)
            .filter(|&j| unit.is_checked(j))
            .map(|j| (j + 1).to_string())
            .collect();
        writeln!(w, "unit{} = {}", i + 1, targets.join(","))?;
    }
    writeln!(w, "begin = {}", form.begin)?;
    for (i, end) in form.ends.iter().enumerate() {
        writeln!(w, "end{} = {}", i + 1, end)?;
    }
    writeln!(w, "command = {}", format_command_line(program, args))?;
    writeln!(w, "status = {}", output.status)?;
    writeln!(w, "elapsed = {:?}", output.elapsed)?;
    writeln!(w)?;
    writeln!(w, "# stdout")?;
    write!(w, "{}", output.stdout)?;
    if !output.stderr.is_empty() {
        writeln!(w)?;
        writeln!(w, "# stderr")?;
        write!(w, "{}", output.stderr)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        let at = |secs| format_timestamp(DateTime::from_timestamp(secs, 0).unwrap());
        assert_eq!(at(0), "19700101_000000");
        // 閏日を含む年の後半と年末
        assert_eq!(at(1_760_572_800), "20251016_000000");
        assert_eq!(at(1_766_188_800 + 3600 + 60 + 1), "20251220_010101");
        assert_eq!(at(1_709_164_800), "20240229_000000");
    }

    #[test]
    fn test_create_unique_suffixes() {
        let dir = std::env::temp_dir().join(format!("yuanshen-unique-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let (a, _) = create_unique(&dir, "run.txt").unwrap();
        let (b, _) = create_unique(&dir, "run.txt").unwrap();
        let (c, _) = create_unique(&dir, "run.txt").unwrap();
        fs::remove_dir_all(&dir).ok();
        assert_eq!(a.file_name().unwrap(), "run.txt");
        assert_eq!(b.file_name().unwrap(), "run_1.txt");
        assert_eq!(c.file_name().unwrap(), "run_2.txt");
    }

    #[test]
    fn test_log_file_name() {
        let form = PuzzleForm { number: 4, max_state: 2, ..Default::default() };
        let name = log_file_name(&form);
        assert!(name.starts_with("run_n4_m2_"));
        assert!(name.ends_with(".txt"));
    }
}
