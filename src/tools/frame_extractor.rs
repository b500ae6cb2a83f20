use crate::error::{SheetError, SheetResult};
use crate::tools::time_format::format_timestamp;
use image::DynamicImage;
use log::debug;
use regex::Regex;
use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::LazyLock;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// 等待解碼器結束時的輪詢間隔
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// `Duration: 01:23:45.67,` 的第一個符合項目
static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s(?P<hours>\d+):(?P<minutes>\d+):(?P<seconds>\d+)(?:\.\d+)?,")
        .expect("無效的 Duration 正規表示式")
});

/// 影片畫面來源
///
/// 每次呼叫彼此獨立、不修改共享狀態，因此可以在多執行緒中同時呼叫。
pub trait FrameDecoder: Send + Sync {
    /// 擷取 `timestamp` 秒處的單一畫面
    fn extract_frame(&self, path: &Path, timestamp: u64) -> SheetResult<DynamicImage>;

    /// 取得影片長度（秒，小數部分捨去）
    fn probe_duration(&self, path: &Path) -> SheetResult<u64>;
}

/// 以外部 ffmpeg 程序作為畫面來源
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: String,
    timeout: Option<Duration>,
}

struct CapturedOutput {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    timed_out: bool,
}

impl Ffmpeg {
    /// `timeout` 為 `None` 時會一直等待解碼器結束
    #[must_use]
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn run(&self, command: &mut Command) -> SheetResult<CapturedOutput> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SheetError::DecoderUnavailable {
                program: self.program.clone(),
                source,
            })?;

        // 兩條管線都要持續讀取，否則 ffmpeg 會在緩衝區滿時卡住
        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());

        let timed_out = wait_with_deadline(&mut child, self.timeout)?;

        Ok(CapturedOutput {
            stdout: stdout_reader.join().unwrap_or_default(),
            stderr: stderr_reader.join().unwrap_or_default(),
            timed_out,
        })
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg", None)
    }
}

impl FrameDecoder for Ffmpeg {
    fn extract_frame(&self, path: &Path, timestamp: u64) -> SheetResult<DynamicImage> {
        let args = frame_args(path, timestamp);
        debug!("{} {}", self.program, display_args(&args));

        let output = self.run(Command::new(&self.program).args(&args))?;

        if output.timed_out {
            return Err(SheetError::DecoderTimeout {
                path: path.to_path_buf(),
                timestamp,
                timeout: self.timeout.unwrap_or_default(),
            });
        }

        if output.stdout.is_empty() {
            return Err(SheetError::InvalidFrame {
                path: path.to_path_buf(),
                timestamp,
                reason: "解碼器沒有輸出任何畫面".to_string(),
            });
        }

        image::load_from_memory(&output.stdout).map_err(|e| SheetError::InvalidFrame {
            path: path.to_path_buf(),
            timestamp,
            reason: e.to_string(),
        })
    }

    fn probe_duration(&self, path: &Path) -> SheetResult<u64> {
        debug!("{} -hide_banner -i {}", self.program, path.display());

        let output = self.run(Command::new(&self.program).arg("-hide_banner").arg("-i").arg(path))?;

        if output.timed_out {
            return Err(SheetError::ProbeTimeout {
                path: path.to_path_buf(),
                timeout: self.timeout.unwrap_or_default(),
            });
        }

        // 未指定輸出時 ffmpeg 會以錯誤結束，但串流資訊仍印在 stderr
        let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));

        parse_duration(&diagnostics).ok_or_else(|| SheetError::UnparsableDuration {
            path: path.to_path_buf(),
        })
    }
}

/// 單幀擷取的 ffmpeg 參數：seek、輸入、單一 PNG 畫面輸出到 stdout
fn frame_args(path: &Path, timestamp: u64) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-ss".into(), format_timestamp(timestamp).into(), "-i".into()];
    args.push(path.as_os_str().to_owned());
    args.extend(
        ["-f", "image2", "-frames:v", "1", "-c:v", "png", "-loglevel", "8", "-"]
            .into_iter()
            .map(OsString::from),
    );
    args
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 從 ffmpeg 診斷輸出解析影片長度（秒）
///
/// 取第一個 `Duration: HH:MM:SS.ff,`，秒數的小數部分直接捨去。
#[must_use]
pub fn parse_duration(diagnostics: &str) -> Option<u64> {
    let captures = DURATION_PATTERN.captures(diagnostics)?;
    let hours: u64 = captures["hours"].parse().ok()?;
    let minutes: u64 = captures["minutes"].parse().ok()?;
    let seconds: u64 = captures["seconds"].parse().ok()?;
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}

/// 等待程序結束；超過期限則終止程序並回傳 `true`
fn wait_with_deadline(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<bool> {
    let Some(timeout) = timeout else {
        child.wait()?;
        return Ok(false);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if child.try_wait()?.is_some() {
            return Ok(false);
        }
        if Instant::now() >= deadline {
            // 程序可能剛好在此時結束，kill 失敗可忽略
            let _ = child.kill();
            child.wait()?;
            return Ok(true);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
