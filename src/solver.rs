use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// 既定のソルバー実行ファイル名
pub const DEFAULT_SOLVER: &str = if cfg!(windows) { "yuanshen.exe" } else { "yuanshen" };

/// 終了待ちのポーリング間隔
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("{program} を起動できません: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} が {limit:?} 以内に終了しなかったため停止しました")]
    Timeout { program: String, limit: Duration },
    #[error("{program} の実行を中断しました")]
    Cancelled { program: String },
    #[error("{program} との通信に失敗しました: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// ソルバー1回分の実行結果
#[derive(Debug, Clone)]
pub struct SolverOutput {
    /// 標準出力（そのまま表示する）
    pub stdout: String,
    pub stderr: String,
    /// 記録用。成功/失敗で表示は変えない。
    pub status: ExitStatus,
    pub elapsed: Duration,
}

/// 外部ソルバーの起動設定
#[derive(Debug, Clone)]
pub struct SolverCommand {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for SolverCommand {
    fn default() -> Self {
        Self::new(DEFAULT_SOLVER)
    }
}

impl SolverCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// ソルバーを起動し、終了まで待って標準出力を全て返す
    pub fn run(&self, args: &[String]) -> Result<SolverOutput, SolverError> {
        self.run_cancellable(args, &AtomicBool::new(false))
    }

    /// 中断フラグ付き版。`cancel` が立つか時間切れになると子プロセスを kill する。
    pub fn run_cancellable(
        &self,
        args: &[String],
        cancel: &AtomicBool,
    ) -> Result<SolverOutput, SolverError> {
        let program = self.program_name();
        if cancel.load(Ordering::Relaxed) {
            return Err(SolverError::Cancelled { program });
        }
        log::info!("起動: {} ({}引数)", program, args.len());
        log::debug!("{:?}", args);

        let timer = Instant::now();
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SolverError::Launch {
                program: program.clone(),
                source,
            })?;

        // パイプが詰まらないよう終了待ちと並行して読み切る
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    stop(&mut child);
                    return Err(SolverError::Io { program, source });
                }
            }
            if cancel.load(Ordering::Relaxed) {
                stop(&mut child);
                log::info!("中断: {}", program);
                return Err(SolverError::Cancelled { program });
            }
            if let Some(limit) = self.timeout {
                if timer.elapsed() >= limit {
                    stop(&mut child);
                    log::warn!("時間切れ: {} ({:?})", program, limit);
                    return Err(SolverError::Timeout { program, limit });
                }
            }
            thread::sleep(POLL_INTERVAL);
        };

        // 子プロセスの終了後もパイプを握る孫プロセスがいれば、残り時間の範囲でだけ待つ
        let deadline = self.timeout.map(|limit| (timer + limit, limit));
        let stdout = self.collect(stdout_reader, deadline, cancel)?;
        let stderr = self.collect(stderr_reader, deadline, cancel)?;
        let elapsed = timer.elapsed();
        log::info!("終了: {} ({}, {:?})", program, status, elapsed);

        Ok(SolverOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            status,
            elapsed,
        })
    }

    /// 読み取りスレッドの結果を待つ。`deadline` を過ぎるか `cancel` が立てばエラー。
    fn collect(
        &self,
        reader: Option<Receiver<io::Result<Vec<u8>>>>,
        deadline: Option<(Instant, Duration)>,
        cancel: &AtomicBool,
    ) -> Result<Vec<u8>, SolverError> {
        let Some(reader) = reader else {
            return Ok(Vec::new());
        };
        let program = self.program_name();
        loop {
            match reader.recv_timeout(POLL_INTERVAL) {
                Ok(result) => return result.map_err(|source| SolverError::Io { program, source }),
                Err(RecvTimeoutError::Disconnected) => {
                    let source = io::Error::other("reader thread panicked");
                    return Err(SolverError::Io { program, source });
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
            if cancel.load(Ordering::Relaxed) {
                return Err(SolverError::Cancelled { program });
            }
            if let Some((at, limit)) = deadline {
                if Instant::now() >= at {
                    log::warn!("時間切れ: {} の出力が閉じられません ({:?})", program, limit);
                    return Err(SolverError::Timeout { program, limit });
                }
            }
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = pipe.read_to_end(&mut buf).map(|_| buf);
        tx.send(result).ok();
    });
    rx
}

fn stop(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::debug!("kill に失敗: {}", e);
    }
    child.wait().ok();
}
